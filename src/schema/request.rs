/// Caller-supplied name request and its strongly-typed option groups.
///
/// Every field has a serde default, so a request may be as small as `{}`;
/// nested groups such as [`FeatureWeights`] merge field by field against
/// their defaults.
use serde::{Deserialize, Serialize};

use super::element::{ChineseZodiac, Element, WesternZodiac};
use super::lexicon::{Gender, Region};

/// Top-level weight per score group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    /// Laplace-smoothed adjacency likelihood.
    pub bigram: f64,
    /// Corpus weight blended with stroke balance.
    pub char_weight: f64,
    /// Tone and initial euphony.
    pub phonetic: f64,
    /// Thematic, elemental and preference tags.
    pub semantics: f64,
    /// Attestation in the requested decade.
    pub era: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            bigram: 1.0,
            char_weight: 0.6,
            phonetic: 0.8,
            semantics: 1.0,
            era: 0.4,
        }
    }
}

/// Magnitudes of the subtractive penalties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyWeights {
    /// Both characters share the same glyph structure.
    pub structure: f64,
    /// Scaled by `uniqueness` and the pair's popularity.
    pub popularity: f64,
    /// Applied under [`HomophonePolicy::Penalize`].
    pub homophone: f64,
    /// Per prior occurrence of the same first character in a beam pool.
    pub beam_repeat: f64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            structure: 0.15,
            popularity: 0.3,
            homophone: 0.5,
            beam_repeat: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    Max,
    Sample,
    Beam,
}

impl SelectionMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Sample => "sample",
            Self::Beam => "beam",
        }
    }

    pub fn parse(s: &str) -> Option<SelectionMode> {
        match s.to_lowercase().as_str() {
            "max" | "greedy" => Some(Self::Max),
            "sample" => Some(Self::Sample),
            "beam" => Some(Self::Beam),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HomophonePolicy {
    #[default]
    Block,
    Penalize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationPosition {
    #[default]
    First,
    Second,
}

impl GenerationPosition {
    pub fn index(&self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

/// Learned likes and blocks carried by the caller between requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnedPreferences {
    pub liked_chars: Vec<char>,
    pub blocked_chars: Vec<char>,
    /// Two-character given names, e.g. `"明宇"`.
    pub liked_pairs: Vec<String>,
    pub blocked_pairs: Vec<String>,
    /// Exact full or given names that must never be produced.
    pub blocked_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameRequest {
    pub gender: Gender,
    pub region: Region,
    pub theme: Option<String>,
    pub style: Option<String>,
    pub surname: Option<String>,

    pub min_stroke_per_char: Option<u32>,
    pub max_stroke_per_char: Option<u32>,
    pub avoid_rare: bool,
    pub avoid_polyphonic: bool,
    pub allow_single_char: bool,

    /// Text seed; identical seeds give identical results.
    pub seed: Option<String>,
    /// Random-sampling trials per item.
    pub trials: usize,
    pub beam_size: usize,
    pub weights: FeatureWeights,
    pub penalties: PenaltyWeights,

    pub mode: SelectionMode,
    pub temperature: f64,
    pub top_k: usize,
    pub top_p: f64,

    pub era: Option<String>,
    pub chinese_zodiac: Option<ChineseZodiac>,
    pub western_zodiac: Option<WesternZodiac>,
    /// Hour of birth, 0-23.
    pub birth_hour: Option<u8>,
    pub element: Option<Element>,
    pub balance_elements: bool,
    pub prefer_literary: bool,
    pub aesthetics: bool,
    pub numerology: bool,

    pub generation_char: Option<char>,
    pub generation_position: GenerationPosition,
    pub sibling_names: Vec<String>,

    /// 0.0 = indifferent, 1.0 = strongly avoid popular pairs.
    pub uniqueness: f64,
    /// Share of adjacency likelihood drawn from other regions, 0.0-1.0.
    pub cross_region_mix: f64,
    pub homophone_policy: HomophonePolicy,
    pub extra_blacklist: Vec<String>,
    pub preferences: LearnedPreferences,

    /// Number of names to return.
    pub count: usize,
}

impl Default for NameRequest {
    fn default() -> Self {
        Self {
            gender: Gender::default(),
            region: Region::default(),
            theme: None,
            style: None,
            surname: None,
            min_stroke_per_char: None,
            max_stroke_per_char: None,
            avoid_rare: false,
            avoid_polyphonic: false,
            allow_single_char: false,
            seed: None,
            trials: 120,
            beam_size: 6,
            weights: FeatureWeights::default(),
            penalties: PenaltyWeights::default(),
            mode: SelectionMode::default(),
            temperature: 0.8,
            top_k: 8,
            top_p: 0.9,
            era: None,
            chinese_zodiac: None,
            western_zodiac: None,
            birth_hour: None,
            element: None,
            balance_elements: false,
            prefer_literary: false,
            aesthetics: false,
            numerology: false,
            generation_char: None,
            generation_position: GenerationPosition::default(),
            sibling_names: Vec::new(),
            uniqueness: 0.3,
            cross_region_mix: 0.0,
            homophone_policy: HomophonePolicy::default(),
            extra_blacklist: Vec::new(),
            preferences: LearnedPreferences::default(),
            count: 1,
        }
    }
}
