use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Naming region. Each region has its own surname, character and bigram
/// datasets; `Cn` is the default and is loaded eagerly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    #[default]
    Cn,
    Tw,
    Hk,
}

impl Region {
    pub fn all() -> &'static [Region] {
        &[Region::Cn, Region::Tw, Region::Hk]
    }

    /// Short region code used for directory names and log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cn => "CN",
            Self::Tw => "TW",
            Self::Hk => "HK",
        }
    }

    /// Phonological system used for euphony scoring and romanization.
    pub fn phonology(&self) -> Phonology {
        match self {
            Self::Cn | Self::Tw => Phonology::Mandarin,
            Self::Hk => Phonology::Cantonese,
        }
    }

    pub fn parse(s: &str) -> Option<Region> {
        match s.to_ascii_uppercase().as_str() {
            "CN" => Some(Self::Cn),
            "TW" => Some(Self::Tw),
            "HK" => Some(Self::Hk),
            _ => None,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phonology {
    Mandarin,
    Cantonese,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Unisex,
}

impl Gender {
    pub fn parse(s: &str) -> Option<Gender> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Some(Self::Male),
            "female" | "f" => Some(Self::Female),
            "unisex" | "u" | "neutral" => Some(Self::Unisex),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unisex => "unisex",
        }
    }
}

/// Coarse glyph composition of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Structure {
    LeftRight,
    TopBottom,
    Enclosed,
    Single,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedSurname {
    pub surname: String,
    pub weight: f64,
    /// Total stroke count across all characters of the surname.
    #[serde(default)]
    pub strokes: Option<u32>,
}

/// A candidate given-name character with its corpus weight and features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedChar {
    pub ch: char,
    pub weight: f64,
    #[serde(default)]
    pub strokes: Option<u32>,
    #[serde(default)]
    pub rare: bool,
    #[serde(default)]
    pub structure: Option<Structure>,
    #[serde(default)]
    pub polyphonic: bool,
    #[serde(default)]
    pub freq_rank: Option<u32>,
    #[serde(default)]
    pub tags: FxHashSet<String>,
}

impl WeightedChar {
    pub fn new(ch: char, weight: f64) -> Self {
        Self {
            ch,
            weight,
            strokes: None,
            rare: false,
            structure: None,
            polyphonic: false,
            freq_rank: None,
            tags: FxHashSet::default(),
        }
    }

    pub fn with_strokes(mut self, strokes: u32) -> Self {
        self.strokes = Some(strokes);
        self
    }

    pub fn with_structure(mut self, structure: Structure) -> Self {
        self.structure = Some(structure);
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags.extend(tags.iter().map(|t| t.to_string()));
        self
    }
}

/// Observed co-occurrence of two adjacent given-name characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bigram {
    pub first: char,
    pub second: char,
    pub weight: f64,
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Decade label such as `"1990s"`.
    #[serde(default)]
    pub era: Option<String>,
    #[serde(default)]
    pub region: Option<Region>,
}

impl Bigram {
    pub fn new(first: char, second: char, weight: f64) -> Self {
        Self {
            first,
            second,
            weight,
            gender: None,
            era: None,
            region: None,
        }
    }
}

/// Gendered given-name character pools as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharPools {
    #[serde(default)]
    pub male: Vec<WeightedChar>,
    #[serde(default)]
    pub female: Vec<WeightedChar>,
    #[serde(default)]
    pub unisex: Vec<WeightedChar>,
}

/// Every record a region source returns for one region.
#[derive(Debug, Clone, Default)]
pub struct RegionData {
    pub surnames: Vec<WeightedSurname>,
    pub chars: CharPools,
    pub bigrams: Vec<Bigram>,
}

impl RegionData {
    pub fn is_empty(&self) -> bool {
        self.surnames.is_empty()
            && self.chars.male.is_empty()
            && self.chars.female.is_empty()
            && self.chars.unisex.is_empty()
            && self.bigrams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_codes_round_trip() {
        for region in Region::all() {
            assert_eq!(Region::parse(region.code()), Some(*region));
        }
        assert_eq!(Region::parse("hk"), Some(Region::Hk));
        assert_eq!(Region::parse("jp"), None);
    }

    #[test]
    fn hk_uses_cantonese() {
        assert_eq!(Region::Hk.phonology(), Phonology::Cantonese);
        assert_eq!(Region::Tw.phonology(), Phonology::Mandarin);
    }

    #[test]
    fn weighted_char_from_ron_with_defaults() {
        let src = "#![enable(implicit_some)]\n(ch: '明', weight: 3.5, strokes: 8, structure: left_right)";
        let wc: WeightedChar = ron::from_str(src).unwrap();
        assert_eq!(wc.ch, '明');
        assert_eq!(wc.strokes, Some(8));
        assert_eq!(wc.structure, Some(Structure::LeftRight));
        assert!(!wc.rare);
        assert!(wc.tags.is_empty());
    }

    #[test]
    fn bigram_from_ron_with_tags() {
        let src = "#![enable(implicit_some)]\n(first: '家', second: '豪', weight: 4.0, gender: male, era: \"1980s\")";
        let bg: Bigram = ron::from_str(src).unwrap();
        assert_eq!(bg.gender, Some(Gender::Male));
        assert_eq!(bg.era.as_deref(), Some("1980s"));
        assert_eq!(bg.region, None);
    }
}
