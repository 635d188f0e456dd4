use serde::{Deserialize, Serialize};

use super::lexicon::{Gender, Region};
use super::request::{FeatureWeights, PenaltyWeights};

/// Individual contributions to the semantic score group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticParts {
    pub theme: f64,
    pub style: f64,
    pub synergy: f64,
    pub conflict: f64,
    pub element: f64,
    pub chinese_zodiac: f64,
    pub western_zodiac: f64,
    pub birth_hour: f64,
    pub literary: f64,
    pub aesthetics: f64,
    pub generation: f64,
    pub siblings: f64,
    pub numerology: f64,
    pub preference: f64,
}

impl SemanticParts {
    pub fn total(&self) -> f64 {
        self.theme
            + self.style
            + self.synergy
            + self.conflict
            + self.element
            + self.chinese_zodiac
            + self.western_zodiac
            + self.birth_hour
            + self.literary
            + self.aesthetics
            + self.generation
            + self.siblings
            + self.numerology
            + self.preference
    }
}

/// Raw group scores, penalties, and their weighted contributions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub bigram: f64,
    pub char_weight: f64,
    pub stroke_balance: f64,
    pub phonetic: f64,
    pub semantics: f64,
    pub era: f64,
    pub semantic_parts: SemanticParts,

    pub structure_penalty: f64,
    pub popularity_penalty: f64,
    pub homophone_penalty: f64,
    pub diversity_penalty: f64,

    pub weighted: WeightedParts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedParts {
    pub bigram: f64,
    pub char_weight: f64,
    pub phonetic: f64,
    pub semantics: f64,
    pub era: f64,
    pub penalties: f64,
}

impl ScoreBreakdown {
    pub fn penalty_total(&self) -> f64 {
        self.structure_penalty
            + self.popularity_penalty
            + self.homophone_penalty
            + self.diversity_penalty
    }

    /// Recompute weighted parts and return the total score.
    pub fn apply_weights(&mut self, weights: &FeatureWeights) -> f64 {
        self.weighted = WeightedParts {
            bigram: weights.bigram * self.bigram,
            char_weight: weights.char_weight * self.char_weight,
            phonetic: weights.phonetic * self.phonetic,
            semantics: weights.semantics * self.semantics,
            era: weights.era * self.era,
            penalties: self.penalty_total(),
        };
        self.weighted.bigram
            + self.weighted.char_weight
            + self.weighted.phonetic
            + self.weighted.semantics
            + self.weighted.era
            - self.weighted.penalties
    }
}

/// Parameters the engine actually ran with, echoed for debugging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveParams {
    pub seed: String,
    pub mode: String,
    pub trials: usize,
    pub beam_size: usize,
    pub temperature: f64,
    pub top_k: usize,
    pub top_p: f64,
    pub weights: FeatureWeights,
    pub penalties: PenaltyWeights,
    pub pool_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMeta {
    pub region: Region,
    pub gender: Gender,
    pub score: f64,
    pub strokes: Vec<u32>,
    pub parts: ScoreBreakdown,
    pub reasons: Vec<String>,
    pub romanization: String,
    /// `max`, `sample`, `beam`, or `fallback`.
    pub strategy: String,
    pub params: EffectiveParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameResult {
    pub full_name: String,
    pub surname: String,
    pub given_name: String,
    pub total_strokes: Option<u32>,
    pub meta: NameMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_weights_subtracts_penalties() {
        let mut b = ScoreBreakdown {
            bigram: 1.0,
            char_weight: 0.5,
            phonetic: 0.25,
            semantics: 2.0,
            era: 1.0,
            structure_penalty: 0.15,
            popularity_penalty: 0.1,
            ..Default::default()
        };
        let weights = FeatureWeights {
            bigram: 1.0,
            char_weight: 1.0,
            phonetic: 1.0,
            semantics: 0.5,
            era: 0.0,
        };
        let total = b.apply_weights(&weights);
        assert!((total - (1.0 + 0.5 + 0.25 + 1.0 - 0.25)).abs() < 1e-9);
        assert!((b.weighted.penalties - 0.25).abs() < 1e-9);
    }
}
