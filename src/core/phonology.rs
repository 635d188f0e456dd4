/// Euphony scoring for Mandarin and Cantonese readings of a full name.
///
/// Mandarin applies tone sandhi before judging adjacent tones; Cantonese
/// has no sandhi and rewards register alternation instead.
use crate::core::lexicon::Lexicon;
use crate::schema::lexicon::Phonology;
use crate::schema::phonetic::{CantoneseEntry, MandarinEntry};

const DISTINCT_TONES_BONUS: f64 = 0.3;
const DISTINCT_FINALS_BONUS: f64 = 0.2;
const SAME_TONE_PENALTY: f64 = 0.25;
const THIRD_TONE_PAIR_PENALTY: f64 = 0.2;
const SIBILANT_PAIR_PENALTY: f64 = 0.2;
const REGISTER_ALTERNATION_BONUS: f64 = 0.15;

/// Result of a euphony pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Euphony {
    pub score: f64,
    /// Whether any sandhi rule changed a surface tone.
    pub sandhi: bool,
}

/// Score the euphony of `surname + given` in the region's phonology.
pub fn euphony(lexicon: &Lexicon, phonology: Phonology, surname: &str, given: &str) -> Euphony {
    match phonology {
        Phonology::Mandarin => mandarin_euphony(lexicon, surname, given),
        Phonology::Cantonese => cantonese_euphony(lexicon, surname, given),
    }
}

/// Apply Mandarin tone sandhi to a tone sequence.
///
/// A third tone before another third tone surfaces as second. 一 reads as
/// second tone before a fourth tone and as fourth before tones 1-3. 不
/// reads as second before a fourth tone. Rules look at the underlying
/// tone of the following syllable.
pub fn apply_sandhi(chars: &[char], tones: &[Option<u8>]) -> Vec<Option<u8>> {
    let mut surface = tones.to_vec();
    for i in 0..tones.len().saturating_sub(1) {
        let next = tones[i + 1];
        match (chars.get(i), tones[i], next) {
            (_, Some(3), Some(3)) => surface[i] = Some(2),
            (Some('一'), _, Some(4)) => surface[i] = Some(2),
            (Some('一'), _, Some(1..=3)) => surface[i] = Some(4),
            (Some('不'), _, Some(4)) => surface[i] = Some(2),
            _ => {}
        }
    }
    surface
}

fn mandarin_euphony(lexicon: &Lexicon, surname: &str, given: &str) -> Euphony {
    let given_entries: Vec<Option<&MandarinEntry>> =
        given.chars().map(|c| lexicon.mandarin.get(&c)).collect();

    let mut score = 0.0;
    if let [Some(a), Some(b)] = given_entries.as_slice() {
        if a.tone.is_some() && b.tone.is_some() && a.tone != b.tone {
            score += DISTINCT_TONES_BONUS;
        }
        if a.rime.is_some() && b.rime.is_some() && a.rime != b.rime {
            score += DISTINCT_FINALS_BONUS;
        }
    }

    let chars: Vec<char> = surname.chars().chain(given.chars()).collect();
    let entries: Vec<Option<&MandarinEntry>> =
        chars.iter().map(|c| lexicon.mandarin.get(c)).collect();
    let tones: Vec<Option<u8>> = entries.iter().map(|e| e.and_then(|e| e.tone)).collect();
    let surface = apply_sandhi(&chars, &tones);

    for i in 0..chars.len().saturating_sub(1) {
        if let (Some(a), Some(b)) = (surface[i], surface[i + 1]) {
            if a == b {
                score -= SAME_TONE_PENALTY;
            }
        }
        if tones[i] == Some(3) && tones[i + 1] == Some(3) {
            score -= THIRD_TONE_PAIR_PENALTY;
        }
        if let (Some(a), Some(b)) = (entries[i], entries[i + 1]) {
            if a.is_sibilant() && b.is_sibilant() {
                score -= SIBILANT_PAIR_PENALTY;
            }
        }
    }

    Euphony {
        score,
        sandhi: surface != tones,
    }
}

fn cantonese_euphony(lexicon: &Lexicon, surname: &str, given: &str) -> Euphony {
    let entries: Vec<Option<&CantoneseEntry>> = surname
        .chars()
        .chain(given.chars())
        .map(|c| lexicon.cantonese.get(&c))
        .collect();

    let mut score = 0.0;
    for pair in entries.windows(2) {
        let (Some(a), Some(b)) = (pair[0], pair[1]) else {
            continue;
        };
        if a.tone.is_some() && a.tone == b.tone {
            score -= SAME_TONE_PENALTY;
        }
        if let (Some(ha), Some(hb)) = (a.is_high(), b.is_high()) {
            if ha != hb {
                score += REGISTER_ALTERNATION_BONUS;
            }
        }
    }

    Euphony {
        score,
        sandhi: false,
    }
}

/// Tones of each character of `text`, `None` where the table has no entry.
pub fn tone_sequence(lexicon: &Lexicon, phonology: Phonology, text: &str) -> Vec<Option<u8>> {
    text.chars()
        .map(|c| match phonology {
            Phonology::Mandarin => lexicon.mandarin.get(&c).and_then(|e| e.tone),
            Phonology::Cantonese => lexicon.cantonese.get(&c).and_then(|e| e.tone),
        })
        .collect()
}

/// Whether a character carries a level (平) tone: Mandarin tones 1-2,
/// Cantonese tones 1 and 4.
pub fn is_level_tone(lexicon: &Lexicon, phonology: Phonology, ch: char) -> bool {
    match phonology {
        Phonology::Mandarin => matches!(
            lexicon.mandarin.get(&ch).and_then(|e| e.tone),
            Some(1 | 2)
        ),
        Phonology::Cantonese => matches!(
            lexicon.cantonese.get(&ch).and_then(|e| e.tone),
            Some(1 | 4)
        ),
    }
}
