/// Given-name bigram model — Laplace-smoothed adjacency, cross-region
/// blending, training from name lists, and RON persistence.
use rustc_hash::FxHashMap;
use std::path::Path;

use crate::core::lexicon::{LexiconError, RegionIndex};
use crate::schema::lexicon::{Bigram, Gender};

/// Additive smoothing constant.
pub const LAPLACE_ALPHA: f64 = 1.0;
/// Multiplier for an entry whose gender or era tag matches the request.
pub const TAG_MATCH_BOOST: f64 = 1.25;

/// Request attributes that boost matching bigram entries.
#[derive(Debug, Clone, Copy)]
pub struct AdjacencyQuery<'a> {
    pub gender: Gender,
    pub era: Option<&'a str>,
}

impl AdjacencyQuery<'_> {
    fn boost(&self, bigram: &Bigram) -> f64 {
        let mut factor = 1.0;
        if bigram.gender == Some(self.gender) {
            factor *= TAG_MATCH_BOOST;
        }
        if let (Some(want), Some(have)) = (self.era, bigram.era.as_deref()) {
            if want == have {
                factor *= TAG_MATCH_BOOST;
            }
        }
        factor
    }
}

/// Smoothed `P(second | first)` within one region:
/// `(c(first, second) + α) / (Σ c(first, ·) + α·V)`.
pub fn conditional_probability(
    index: &RegionIndex,
    first: char,
    second: char,
    query: &AdjacencyQuery<'_>,
) -> f64 {
    let mut total = 0.0;
    let mut hit = 0.0;
    for bigram in index.bigrams_by_first(first) {
        let w = bigram.weight * query.boost(bigram);
        total += w;
        if bigram.second == second {
            hit += w;
        }
    }
    let v = index.vocab_size as f64;
    (hit + LAPLACE_ALPHA) / (total + LAPLACE_ALPHA * v)
}

/// Blend the primary region's probability with the mean over other
/// regions: `(1 − mix)·P_region + mix·P_other`.
pub fn blended_probability(
    primary: &RegionIndex,
    others: &[&RegionIndex],
    mix: f64,
    first: char,
    second: char,
    query: &AdjacencyQuery<'_>,
) -> f64 {
    let p = conditional_probability(primary, first, second, query);
    let mix = mix.clamp(0.0, 1.0);
    if mix == 0.0 || others.is_empty() {
        return p;
    }
    let other = others
        .iter()
        .map(|idx| conditional_probability(idx, first, second, query))
        .sum::<f64>()
        / others.len() as f64;
    (1.0 - mix) * p + mix * other
}

/// Map a smoothed probability onto `ln(P·V) / ln(V)`: 0 for a first
/// character with no recorded continuations, 1 for a certain continuation.
pub fn adjacency_score(probability: f64, vocab_size: usize) -> f64 {
    let v = vocab_size.max(2) as f64;
    (probability * v).ln() / v.ln()
}

/// Trains bigram tables from lists of given names.
pub struct BigramTrainer;

impl BigramTrainer {
    /// Train from raw text: names separated by whitespace or commas.
    ///
    /// Lines of the form `[era=1990s, gender=female]` set tags for the
    /// names that follow, until the next marker. `[]` clears them.
    pub fn train(text: &str) -> Vec<Bigram> {
        let mut counts: FxHashMap<(char, char, Option<Gender>, Option<String>), u32> =
            FxHashMap::default();
        let mut gender: Option<Gender> = None;
        let mut era: Option<String> = None;

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                gender = None;
                era = None;
                for pair in trimmed[1..trimmed.len() - 1].split(',') {
                    match pair.split_once('=') {
                        Some(("era", v)) => era = Some(v.trim().to_string()),
                        Some(("gender", v)) => gender = Gender::parse(v.trim()),
                        _ => {}
                    }
                }
                continue;
            }

            for name in trimmed.split(|c: char| c.is_whitespace() || c == ',' || c == '，') {
                let chars: Vec<char> = name.chars().filter(|c| !c.is_ascii()).collect();
                for window in chars.windows(2) {
                    if window[0] == window[1] {
                        continue;
                    }
                    *counts
                        .entry((window[0], window[1], gender, era.clone()))
                        .or_insert(0) += 1;
                }
            }
        }

        let mut bigrams: Vec<Bigram> = counts
            .into_iter()
            .map(|((first, second, gender, era), count)| Bigram {
                first,
                second,
                weight: count as f64,
                gender,
                era,
                region: None,
            })
            .collect();
        bigrams.sort_by(|a, b| {
            b.weight
                .total_cmp(&a.weight)
                .then(a.first.cmp(&b.first))
                .then(a.second.cmp(&b.second))
                .then(a.era.cmp(&b.era))
        });
        bigrams
    }
}

/// Save bigrams to a RON file.
pub fn save_bigrams(bigrams: &[Bigram], path: &Path) -> Result<(), LexiconError> {
    let serialized = ron::ser::to_string_pretty(bigrams, ron::ser::PrettyConfig::default())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    std::fs::write(path, serialized)?;
    Ok(())
}

/// Load bigrams from a RON file.
pub fn load_bigrams(path: &Path) -> Result<Vec<Bigram>, LexiconError> {
    let contents = std::fs::read_to_string(path)?;
    crate::core::lexicon::parse_bigrams(&contents)
}
