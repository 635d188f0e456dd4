/// Variety pass — maximal-marginal-relevance re-ranking so that a batch
/// of names does not collapse onto one character or tone pattern.
use rustc_hash::FxHashSet;

use crate::core::lexicon::Lexicon;
use crate::core::phonology::tone_sequence;
use crate::core::scorer::Candidate;
use crate::core::semantics::jaccard;
use crate::schema::lexicon::Phonology;
use crate::schema::result::NameResult;

/// Relevance weight of the MMR objective.
pub const DEFAULT_LAMBDA: f64 = 0.8;

const CHARSET_SHARE: f64 = 0.5;
const FIRST_CHAR_SHARE: f64 = 0.3;
const TONE_SHARE: f64 = 0.2;

/// MMR re-ranker: repeatedly picks `argmax λ·rel − (1−λ)·max_sim`.
pub struct VarietyPass<'a> {
    lexicon: &'a Lexicon,
    phonology: Phonology,
    lambda: f64,
}

impl<'a> VarietyPass<'a> {
    pub fn new(lexicon: &'a Lexicon, phonology: Phonology) -> Self {
        Self {
            lexicon,
            phonology,
            lambda: DEFAULT_LAMBDA,
        }
    }

    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda.clamp(0.0, 1.0);
        self
    }

    /// `0.5·charset Jaccard + 0.3·same first char + 0.2·tone agreement`.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let sa: FxHashSet<char> = a.chars().collect();
        let sb: FxHashSet<char> = b.chars().collect();
        let same_first = a.chars().next().is_some() && a.chars().next() == b.chars().next();

        let ta = tone_sequence(self.lexicon, self.phonology, a);
        let tb = tone_sequence(self.lexicon, self.phonology, b);
        let span = ta.len().max(tb.len());
        let agreement = if span == 0 {
            0.0
        } else {
            ta.iter()
                .zip(tb.iter())
                .filter(|(x, y)| x.is_some() && x == y)
                .count() as f64
                / span as f64
        };

        CHARSET_SHARE * jaccard(&sa, &sb)
            + if same_first { FIRST_CHAR_SHARE } else { 0.0 }
            + TONE_SHARE * agreement
    }

    /// Order up to `k` items by MMR. Returns indices into `items`.
    pub fn rerank<T: Ranked>(&self, items: &[T], k: usize) -> Vec<usize> {
        self.pick(items, &[], k)
    }

    /// Pick up to `k` more items from `pool` given the names already
    /// `chosen`. Pool entries whose name is already chosen are skipped.
    pub fn top_up<T: Ranked>(&self, chosen: &[&str], pool: &[T], k: usize) -> Vec<usize> {
        self.pick(pool, chosen, k)
    }

    fn pick<T: Ranked>(&self, pool: &[T], chosen: &[&str], k: usize) -> Vec<usize> {
        let relevance = normalised(pool);
        let preset: FxHashSet<&str> = chosen.iter().copied().collect();
        let mut taken: Vec<&str> = chosen.to_vec();
        let mut used = vec![false; pool.len()];
        let mut out = Vec::new();

        while out.len() < k {
            let mut best: Option<(usize, f64)> = None;
            for (i, item) in pool.iter().enumerate() {
                if used[i] || preset.contains(item.label()) {
                    continue;
                }
                let max_sim = taken
                    .iter()
                    .map(|t| self.similarity(item.label(), t))
                    .fold(0.0, f64::max);
                let value = self.lambda * relevance[i] - (1.0 - self.lambda) * max_sim;
                match best {
                    Some((_, v)) if v >= value => {}
                    _ => best = Some((i, value)),
                }
            }
            let Some((i, _)) = best else {
                break;
            };
            used[i] = true;
            taken.push(pool[i].label());
            out.push(i);
        }
        out
    }
}

/// Something with a given name and a score that MMR can rank.
pub trait Ranked {
    /// The given name compared for similarity.
    fn label(&self) -> &str;
    fn relevance(&self) -> f64;
}

impl Ranked for Candidate {
    fn label(&self) -> &str {
        &self.given_name
    }

    fn relevance(&self) -> f64 {
        self.total
    }
}

impl Ranked for NameResult {
    fn label(&self) -> &str {
        &self.given_name
    }

    fn relevance(&self) -> f64 {
        self.meta.score
    }
}

/// Min-max normalised totals; a flat pool is uniformly relevant.
fn normalised<T: Ranked>(pool: &[T]) -> Vec<f64> {
    let min = pool.iter().map(T::relevance).fold(f64::INFINITY, f64::min);
    let max = pool.iter().map(T::relevance).fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    pool.iter()
        .map(|c| {
            if span > 0.0 {
                (c.relevance() - min) / span
            } else {
                1.0
            }
        })
        .collect()
}
