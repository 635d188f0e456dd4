/// Phonetic transcriptions for the two supported phonological systems.
///
/// Both tables are stored on disk as compact numbered syllables
/// (`"ming2"` for Mandarin, `"ming4"` for Cantonese) and split into
/// initial / final / tone when loaded.
use serde::{Deserialize, Serialize};

/// Mandarin initials, longest first so that `zh` wins over `z`.
const MANDARIN_INITIALS: &[&str] = &[
    "zh", "ch", "sh", "b", "p", "m", "f", "d", "t", "n", "l", "g", "k", "h", "j", "q", "x", "r",
    "z", "c", "s", "y", "w",
];

/// Jyutping initials, longest first.
const CANTONESE_INITIALS: &[&str] = &[
    "gw", "kw", "ng", "b", "p", "m", "f", "d", "t", "n", "l", "g", "k", "h", "z", "c", "s", "j",
    "w",
];

const MANDARIN_SIBILANTS: &[&str] = &["z", "c", "s", "zh", "ch", "sh", "j", "q", "x"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MandarinEntry {
    pub initial: Option<String>,
    #[serde(rename = "final")]
    pub rime: Option<String>,
    /// 1-4, or 5 for the neutral tone.
    pub tone: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CantoneseEntry {
    pub initial: Option<String>,
    #[serde(rename = "final")]
    pub rime: Option<String>,
    /// 1-6.
    pub tone: Option<u8>,
}

impl MandarinEntry {
    /// Parse a numbered pinyin syllable such as `"zhang1"` or `"lv3"`.
    pub fn parse(syllable: &str) -> MandarinEntry {
        let (body, tone) = split_tone(syllable);
        let body = body.replace('v', "ü");
        let (initial, rime) = split_initial(&body, MANDARIN_INITIALS);
        MandarinEntry { initial, rime, tone }
    }

    pub fn is_sibilant(&self) -> bool {
        self.initial
            .as_deref()
            .is_some_and(|i| MANDARIN_SIBILANTS.contains(&i))
    }

    /// Toneless syllable, used for homophone matching.
    pub fn plain(&self) -> String {
        format!(
            "{}{}",
            self.initial.as_deref().unwrap_or(""),
            self.rime.as_deref().unwrap_or("")
        )
    }

    /// Pinyin with a diacritic tone mark, e.g. `míng`.
    pub fn marked(&self) -> String {
        let initial = self.initial.as_deref().unwrap_or("");
        let rime = self.rime.as_deref().unwrap_or("");
        format!("{}{}", initial, mark_tone(rime, self.tone))
    }
}

impl CantoneseEntry {
    pub fn parse(syllable: &str) -> CantoneseEntry {
        let (body, tone) = split_tone(syllable);
        let (initial, rime) = split_initial(&body, CANTONESE_INITIALS);
        CantoneseEntry { initial, rime, tone }
    }

    /// Tones 1-3 are the high register, 4-6 the low register.
    pub fn is_high(&self) -> Option<bool> {
        self.tone.map(|t| t <= 3)
    }

    pub fn plain(&self) -> String {
        format!(
            "{}{}",
            self.initial.as_deref().unwrap_or(""),
            self.rime.as_deref().unwrap_or("")
        )
    }

    /// Jyutping with its tone digit, e.g. `ming4`.
    pub fn numbered(&self) -> String {
        match self.tone {
            Some(t) => format!("{}{}", self.plain(), t),
            None => self.plain(),
        }
    }
}

fn split_tone(syllable: &str) -> (String, Option<u8>) {
    let trimmed = syllable.trim().to_lowercase();
    match trimmed.chars().last().and_then(|c| c.to_digit(10)) {
        Some(d) => {
            let body = trimmed[..trimmed.len() - 1].to_string();
            (body, Some(d as u8))
        }
        None => (trimmed, None),
    }
}

fn split_initial(body: &str, initials: &[&str]) -> (Option<String>, Option<String>) {
    // Syllabic nasals such as "ng" / "m" in Cantonese have no final.
    if initials.contains(&body) && (body == "ng" || body == "m") {
        return (None, Some(body.to_string()));
    }
    for initial in initials {
        if let Some(rest) = body.strip_prefix(initial) {
            if rest.is_empty() {
                continue;
            }
            return (Some(initial.to_string()), Some(rest.to_string()));
        }
    }
    if body.is_empty() {
        (None, None)
    } else {
        (None, Some(body.to_string()))
    }
}

/// Place a tone diacritic on the correct vowel of a pinyin final.
///
/// `a` and `e` always carry the mark, `ou` marks the `o`, otherwise the
/// last vowel takes it.
fn mark_tone(rime: &str, tone: Option<u8>) -> String {
    let tone = match tone {
        Some(t @ 1..=4) => t as usize,
        _ => return rime.to_string(),
    };
    let chars: Vec<char> = rime.chars().collect();
    let target = chars
        .iter()
        .position(|&c| c == 'a' || c == 'e')
        .or_else(|| rime.find("ou").map(|_| chars.iter().position(|&c| c == 'o').unwrap_or(0)))
        .or_else(|| chars.iter().rposition(|c| "iouü".contains(*c)));

    let Some(idx) = target else {
        return rime.to_string();
    };

    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| if i == idx { marked_vowel(c, tone) } else { c })
        .collect()
}

fn marked_vowel(vowel: char, tone: usize) -> char {
    let row: [char; 4] = match vowel {
        'a' => ['ā', 'á', 'ǎ', 'à'],
        'e' => ['ē', 'é', 'ě', 'è'],
        'i' => ['ī', 'í', 'ǐ', 'ì'],
        'o' => ['ō', 'ó', 'ǒ', 'ò'],
        'u' => ['ū', 'ú', 'ǔ', 'ù'],
        'ü' => ['ǖ', 'ǘ', 'ǚ', 'ǜ'],
        other => return other,
    };
    row[tone - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mandarin_retroflex_initial() {
        let e = MandarinEntry::parse("zhang1");
        assert_eq!(e.initial.as_deref(), Some("zh"));
        assert_eq!(e.rime.as_deref(), Some("ang"));
        assert_eq!(e.tone, Some(1));
        assert!(e.is_sibilant());
    }

    #[test]
    fn parse_mandarin_zero_initial() {
        let e = MandarinEntry::parse("an1");
        assert_eq!(e.initial, None);
        assert_eq!(e.rime.as_deref(), Some("an"));
    }

    #[test]
    fn parse_v_as_umlaut() {
        let e = MandarinEntry::parse("lv3");
        assert_eq!(e.rime.as_deref(), Some("ü"));
        assert_eq!(e.marked(), "lǚ");
    }

    #[test]
    fn tone_marks_follow_placement_rules() {
        assert_eq!(MandarinEntry::parse("ming2").marked(), "míng");
        assert_eq!(MandarinEntry::parse("hao4").marked(), "hào");
        assert_eq!(MandarinEntry::parse("zhou1").marked(), "zhōu");
        assert_eq!(MandarinEntry::parse("liu2").marked(), "liú");
        assert_eq!(MandarinEntry::parse("xue3").marked(), "xuě");
        assert_eq!(MandarinEntry::parse("gui4").marked(), "guì");
    }

    #[test]
    fn parse_cantonese() {
        let e = CantoneseEntry::parse("gwong1");
        assert_eq!(e.initial.as_deref(), Some("gw"));
        assert_eq!(e.rime.as_deref(), Some("ong"));
        assert_eq!(e.is_high(), Some(true));
        assert_eq!(e.numbered(), "gwong1");

        let ng = CantoneseEntry::parse("ng4");
        assert_eq!(ng.initial, None);
        assert_eq!(ng.numbered(), "ng4");
        assert_eq!(ng.is_high(), Some(false));
    }
}
