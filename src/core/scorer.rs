/// Feature scorer — combines adjacency, character weight, euphony,
/// semantics and era into one weighted total, applies penalties, and
/// rejects candidates that break a hard constraint.
use crate::core::bigram::{adjacency_score, blended_probability};
use crate::core::cache::{BoundedCache, DEFAULT_CACHE_CEILING};
use crate::core::context::ScoringContext;
use crate::core::phonology;
use crate::core::semantics::{score_semantics, SemanticCaches};
use crate::schema::request::HomophonePolicy;
use crate::schema::result::{ScoreBreakdown, SemanticParts};

/// Weight of the normalised character mean in the character-weight group.
const CHAR_MEAN_SHARE: f64 = 0.8;
const STROKE_BALANCE_SHARE: f64 = 0.2;
const HEAVY_CHAR_STROKES: u32 = 16;

/// A scored given name, not yet formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub given_name: String,
    /// Per-character stroke counts, 0 where unknown.
    pub strokes: Vec<u32>,
    pub breakdown: ScoreBreakdown,
    pub total: f64,
    pub reasons: Vec<String>,
}

impl Candidate {
    pub fn first_char(&self) -> Option<char> {
        self.given_name.chars().next()
    }
}

/// Why a candidate was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Blacklisted(String),
    ExtraBlacklisted(String),
    Homophone(String),
    BlockedName,
    BlockedChar(char),
    BlockedPair,
    RepeatedChar,
}

pub struct FeatureScorer {
    char_weight: BoundedCache<String, (f64, f64)>,
    semantics: SemanticCaches,
}

impl Default for FeatureScorer {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CEILING)
    }
}

impl FeatureScorer {
    pub fn new(cache_ceiling: usize) -> Self {
        Self {
            char_weight: BoundedCache::new(cache_ceiling),
            semantics: SemanticCaches::new(cache_ceiling),
        }
    }

    /// Drop every memoised score.
    pub fn reset_caches(&mut self) {
        self.char_weight.clear();
        self.semantics.clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.char_weight.len() + self.semantics.len()
    }

    /// First hard constraint `given` violates, if any.
    pub fn rejection(&self, ctx: &ScoringContext<'_>, given: &str) -> Option<Rejection> {
        let chars: Vec<char> = given.chars().collect();
        if chars.len() == 2 && chars[0] == chars[1] {
            return Some(Rejection::RepeatedChar);
        }

        let full = format!("{}{}", ctx.surname, given);
        if let Some(hit) = ctx.lexicon.general_blacklist_hit(&full) {
            return Some(Rejection::Blacklisted(hit.to_string()));
        }
        if let Some(hit) = ctx
            .request
            .extra_blacklist
            .iter()
            .find(|b| !b.is_empty() && full.contains(b.as_str()))
        {
            return Some(Rejection::ExtraBlacklisted(hit.clone()));
        }

        let prefs = &ctx.request.preferences;
        if prefs.blocked_names.iter().any(|n| *n == full || n == given) {
            return Some(Rejection::BlockedName);
        }
        if let Some(&ch) = chars.iter().find(|c| ctx.blocked_chars.contains(*c)) {
            return Some(Rejection::BlockedChar(ch));
        }
        if prefs
            .blocked_pairs
            .iter()
            .any(|p| !p.is_empty() && given.contains(p.as_str()))
        {
            return Some(Rejection::BlockedPair);
        }

        if ctx.request.homophone_policy == HomophonePolicy::Block {
            if let Some(hit) = ctx.lexicon.homophone_hit(&full, ctx.phonology) {
                return Some(Rejection::Homophone(hit));
            }
        }
        None
    }

    /// Score a given name, or `None` when it is rejected.
    pub fn score(&mut self, ctx: &ScoringContext<'_>, given: &str) -> Option<Candidate> {
        if self.rejection(ctx, given).is_some() {
            return None;
        }
        let chars: Vec<char> = given.chars().collect();
        let request = ctx.request;
        let mut reasons = Vec::new();

        let bigram = match chars.as_slice() {
            [a, b] => {
                let p = blended_probability(
                    ctx.index,
                    &ctx.others,
                    request.cross_region_mix,
                    *a,
                    *b,
                    &ctx.adjacency_query(),
                );
                adjacency_score(p, ctx.index.vocab_size)
            }
            _ => 0.0,
        };

        let key = format!("{}|{}", ctx.index.region.code(), given);
        let (char_weight, stroke_balance) = self
            .char_weight
            .get_or_insert_with(key, || char_weight_score(ctx, &chars));

        let euphony = phonology::euphony(ctx.lexicon, ctx.phonology, ctx.surname, given);
        let parts = score_semantics(ctx, given, &mut self.semantics);

        let era = match (request.era.as_deref(), chars.as_slice()) {
            (Some(era), [a, b])
                if ctx
                    .index
                    .pair_entries(*a, *b)
                    .any(|bg| bg.era.as_deref() == Some(era)) =>
            {
                reasons.push(format!("popular in the {}", era));
                1.0
            }
            _ => 0.0,
        };

        let structure_penalty = match chars.as_slice() {
            [a, b] => {
                let sa = ctx.char_info(*a).and_then(|c| c.structure);
                let sb = ctx.char_info(*b).and_then(|c| c.structure);
                if sa.is_some() && sa == sb {
                    request.penalties.structure
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };

        let popularity_penalty = request.uniqueness.clamp(0.0, 1.0)
            * popularity(ctx, &chars)
            * request.penalties.popularity;

        let mut homophone_penalty = 0.0;
        if request.homophone_policy == HomophonePolicy::Penalize {
            let full = format!("{}{}", ctx.surname, given);
            if let Some(hit) = ctx.lexicon.homophone_hit(&full, ctx.phonology) {
                homophone_penalty = request.penalties.homophone;
                reasons.push(format!("sounds like {}", hit));
            }
        }

        let mut breakdown = ScoreBreakdown {
            bigram,
            char_weight,
            stroke_balance,
            phonetic: euphony.score,
            semantics: parts.total(),
            era,
            semantic_parts: parts,
            structure_penalty,
            popularity_penalty,
            homophone_penalty,
            ..Default::default()
        };
        let total = breakdown.apply_weights(&request.weights);

        if bigram > 0.3 {
            reasons.insert(0, "well-attested pairing".to_string());
        }
        if euphony.score > 0.0 {
            reasons.push("pleasant tone contour".to_string());
        }
        if euphony.sandhi {
            reasons.push("reads with tone sandhi".to_string());
        }
        semantic_reasons(ctx, &parts, &mut reasons);

        Some(Candidate {
            given_name: given.to_string(),
            strokes: chars
                .iter()
                .map(|&c| ctx.strokes(c).unwrap_or(0))
                .collect(),
            breakdown,
            total,
            reasons,
        })
    }

    /// Re-total a candidate after its penalties changed.
    pub fn retotal(candidate: &mut Candidate, ctx: &ScoringContext<'_>) {
        candidate.total = candidate.breakdown.apply_weights(&ctx.request.weights);
    }
}

/// `0.8·mean(weight / max) + 0.2·stroke_balance`, plus the stroke balance
/// on its own.
fn char_weight_score(ctx: &ScoringContext<'_>, chars: &[char]) -> (f64, f64) {
    let mean = normalised_mean(ctx, chars);
    let balance = stroke_balance(chars.iter().map(|&c| ctx.strokes(c)));
    (CHAR_MEAN_SHARE * mean + STROKE_BALANCE_SHARE * balance, balance)
}

fn normalised_mean(ctx: &ScoringContext<'_>, chars: &[char]) -> f64 {
    let max = ctx.index.max_char_weight;
    if chars.is_empty() || max <= 0.0 {
        return 0.0;
    }
    chars
        .iter()
        .map(|&c| ctx.char_info(c).map_or(0.0, |wc| wc.weight / max))
        .sum::<f64>()
        / chars.len() as f64
}

/// Starts at 1: −0.3 when the stroke difference exceeds 5, −0.6 when it
/// exceeds 8, and −0.2 for every character heavier than 16 strokes.
pub fn stroke_balance(strokes: impl Iterator<Item = Option<u32>>) -> f64 {
    let strokes: Vec<Option<u32>> = strokes.collect();
    let mut balance = 1.0;
    if let [Some(a), Some(b)] = strokes.as_slice() {
        let diff = a.abs_diff(*b);
        if diff > 8 {
            balance -= 0.6;
        } else if diff > 5 {
            balance -= 0.3;
        }
    }
    let heavy = strokes
        .iter()
        .filter(|s| s.is_some_and(|s| s > HEAVY_CHAR_STROKES))
        .count();
    balance -= 0.2 * heavy as f64;
    balance
}

/// Pair weight over the region maximum, or half the normalised character
/// mean when the pair is unattested.
fn popularity(ctx: &ScoringContext<'_>, chars: &[char]) -> f64 {
    if let [a, b] = chars {
        let max = ctx.index.max_bigram_weight;
        let pair = ctx
            .index
            .pair_entries(*a, *b)
            .map(|bg| bg.weight)
            .fold(None, |acc: Option<f64>, w| Some(acc.map_or(w, |m| m.max(w))));
        if let Some(w) = pair {
            if max > 0.0 {
                return (w / max).min(1.0);
            }
        }
    }
    0.5 * normalised_mean(ctx, chars)
}

fn semantic_reasons(ctx: &ScoringContext<'_>, parts: &SemanticParts, reasons: &mut Vec<String>) {
    let request = ctx.request;
    if parts.theme > 0.0 {
        reasons.push(format!("matches theme {}", ctx.theme.join(", ")));
    }
    if parts.style > 0.0 {
        reasons.push(format!("{} style", ctx.style.join(", ")));
    }
    if parts.synergy >= 0.15 {
        reasons.push("characters share imagery".to_string());
    }
    if parts.conflict < 0.0 {
        reasons.push("soft and hard connotations clash".to_string());
    }
    if parts.element > 0.0 {
        match request.element {
            Some(e) => reasons.push(format!("carries the {} element", e.tag())),
            None => reasons.push("balanced elements".to_string()),
        }
    }
    if parts.chinese_zodiac > 0.0 || parts.western_zodiac > 0.0 {
        reasons.push("zodiac affinity".to_string());
    }
    if parts.birth_hour > 0.0 {
        reasons.push("suits the birth hour".to_string());
    }
    if parts.literary > 0.0 {
        reasons.push("literary character".to_string());
    }
    if parts.generation > 0.0 {
        if let Some(gen) = request.generation_char {
            reasons.push(format!("generation character {}", gen));
        }
    }
    if parts.siblings > 0.0 {
        reasons.push("echoes sibling names".to_string());
    }
    if parts.numerology > 0.0 {
        reasons.push("auspicious stroke grids".to_string());
    }
    if parts.preference > 0.0 {
        reasons.push("matches your favourites".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lexicon::{Lexicon, RegionIndex};
    use crate::schema::lexicon::{
        Bigram, CharPools, Region, RegionData, Structure, WeightedChar,
    };
    use crate::schema::request::NameRequest;

    fn lexicon() -> Lexicon {
        Lexicon::parse_ron(
            r#"{'德': ["virtue"], '明': ["bright"]}"#,
            r#"{'王': "wang2", '明': "ming2", '宇': "yu3", '德': "de2", '范': "fan4",
                '统': "tong3", '亡': "wang2"}"#,
            "{}",
            r#"(general: ["亡"], homophone: (substrings: [], syllables: ["fan tong"]))"#,
        )
        .unwrap()
    }

    fn index() -> RegionIndex {
        let mut era_pair = Bigram::new('明', '宇', 8.0);
        era_pair.era = Some("1990s".to_string());
        RegionIndex::build(
            Region::Cn,
            RegionData {
                surnames: Vec::new(),
                chars: CharPools {
                    male: vec![
                        WeightedChar::new('明', 10.0)
                            .with_strokes(8)
                            .with_structure(Structure::LeftRight),
                        WeightedChar::new('宇', 5.0)
                            .with_strokes(6)
                            .with_structure(Structure::TopBottom),
                        WeightedChar::new('德', 5.0)
                            .with_strokes(15)
                            .with_structure(Structure::LeftRight),
                        WeightedChar::new('统', 2.0).with_strokes(9),
                        WeightedChar::new('亡', 1.0).with_strokes(3),
                    ],
                    ..Default::default()
                },
                bigrams: vec![era_pair, Bigram::new('德', '明', 2.0)],
            },
        )
    }

    #[test]
    fn hard_rejections() {
        let lexicon = lexicon();
        let index = index();
        let mut request = NameRequest {
            extra_blacklist: vec!["德宇".to_string()],
            ..Default::default()
        };
        request.preferences.blocked_chars = vec!['统'];
        request.preferences.blocked_names = vec!["王明德".to_string()];
        request.preferences.blocked_pairs = vec!["宇明".to_string()];
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "王");
        let scorer = FeatureScorer::default();

        assert_eq!(scorer.rejection(&ctx, "明明"), Some(Rejection::RepeatedChar));
        assert_eq!(scorer.rejection(&ctx, "亡明"), Some(Rejection::Blacklisted("亡".into())));
        assert_eq!(
            scorer.rejection(&ctx, "德宇"),
            Some(Rejection::ExtraBlacklisted("德宇".into()))
        );
        assert_eq!(scorer.rejection(&ctx, "明德"), Some(Rejection::BlockedName));
        assert_eq!(scorer.rejection(&ctx, "统明"), Some(Rejection::BlockedChar('统')));
        assert_eq!(scorer.rejection(&ctx, "宇明"), Some(Rejection::BlockedPair));
        assert_eq!(scorer.rejection(&ctx, "明宇"), None);
    }

    #[test]
    fn homophone_block_and_penalize() {
        let lexicon = lexicon();
        let index = index();
        let request = NameRequest::default();
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "范");
        let mut scorer = FeatureScorer::default();
        assert!(matches!(scorer.rejection(&ctx, "统"), Some(Rejection::Homophone(_))));
        assert!(scorer.score(&ctx, "统").is_none());

        let request = NameRequest {
            homophone_policy: HomophonePolicy::Penalize,
            ..Default::default()
        };
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "范");
        let cand = scorer.score(&ctx, "统").unwrap();
        assert_eq!(cand.breakdown.homophone_penalty, 0.5);
        assert!(cand.reasons.iter().any(|r| r.contains("fan tong")));
    }

    #[test]
    fn breakdown_groups() {
        let lexicon = lexicon();
        let index = index();
        let request = NameRequest {
            era: Some("1990s".to_string()),
            uniqueness: 1.0,
            ..Default::default()
        };
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "王");
        let mut scorer = FeatureScorer::default();
        let cand = scorer.score(&ctx, "明宇").unwrap();
        let b = &cand.breakdown;

        assert!(b.bigram > 0.0 && b.bigram <= 1.0);
        // mean (1.0 + 0.5) / 2, stroke diff 2.
        assert!((b.char_weight - (0.8 * 0.75 + 0.2)).abs() < 1e-9);
        assert_eq!(b.stroke_balance, 1.0);
        assert_eq!(b.era, 1.0);
        assert_eq!(b.structure_penalty, 0.0);
        assert!((b.popularity_penalty - 0.3).abs() < 1e-9);
        assert_eq!(cand.strokes, vec![8, 6]);
        assert!(cand.reasons.iter().any(|r| r.contains("1990s")));

        let same = scorer.score(&ctx, "德明").unwrap();
        assert_eq!(same.breakdown.structure_penalty, 0.15);
        let mut rescored = same.breakdown;
        let expected = rescored.apply_weights(&request.weights);
        assert!((same.total - expected).abs() < 1e-12);
    }

    #[test]
    fn stroke_balance_tiers() {
        assert_eq!(stroke_balance([Some(8), Some(6)].into_iter()), 1.0);
        assert!((stroke_balance([Some(4), Some(10)].into_iter()) - 0.7).abs() < 1e-9);
        assert!((stroke_balance([Some(4), Some(17)].into_iter()) - 0.2).abs() < 1e-9);
        assert_eq!(stroke_balance([None, Some(20)].into_iter()), 0.8);
    }

    #[test]
    fn caches_are_reused_and_reset() {
        let lexicon = lexicon();
        let index = index();
        let request = NameRequest::default();
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "王");
        let mut scorer = FeatureScorer::new(8);
        let a = scorer.score(&ctx, "明宇").unwrap();
        assert!(scorer.cached_entries() > 0);
        let b = scorer.score(&ctx, "明宇").unwrap();
        assert_eq!(a, b);
        scorer.reset_caches();
        assert_eq!(scorer.cached_entries(), 0);
    }
}
