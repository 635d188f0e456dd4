/// Candidate generation — weighted random trials and deterministic beam
/// expansion over the region's character pool and bigram index.
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::core::context::ScoringContext;
use crate::core::scorer::{Candidate, FeatureScorer};
use crate::schema::lexicon::WeightedChar;

/// Probability that a random trial yields a single-character given name.
pub const SINGLE_CHAR_PROBABILITY: f64 = 0.1;
/// The beam keeps `BEAM_KEEP_FACTOR × beam_size` candidates.
pub const BEAM_KEEP_FACTOR: usize = 4;

/// The gendered pool after stroke, rarity, polyphony and preference
/// filters. Characters with unknown strokes fail an active stroke filter.
pub fn filtered_pool<'a>(ctx: &ScoringContext<'a>) -> Vec<&'a WeightedChar> {
    ctx.index
        .pool(ctx.request.gender)
        .iter()
        .filter(|wc| wc.weight > 0.0)
        .filter(|wc| passes_filters(ctx, wc.ch, Some(*wc)))
        .collect()
}

/// The per-character filters behind `filtered_pool`. A character without
/// a region record only passes when no stroke filter is active.
pub fn passes_filters(ctx: &ScoringContext<'_>, ch: char, record: Option<&WeightedChar>) -> bool {
    let request = ctx.request;
    let strokes = record.and_then(|wc| wc.strokes);
    let strokes_ok = match (request.min_stroke_per_char, request.max_stroke_per_char) {
        (None, None) => true,
        (min, max) => strokes.is_some_and(|s| {
            min.map_or(true, |m| s >= m) && max.map_or(true, |m| s <= m)
        }),
    };
    strokes_ok
        && !(request.avoid_rare && record.is_some_and(|wc| wc.rare))
        && !(request.avoid_polyphonic && record.is_some_and(|wc| wc.polyphonic))
        && !ctx.blocked_chars.contains(&ch)
}

/// The requested generation character with its slot, or `Err` when it
/// fails the pool filters and nothing may be generated.
fn generation_slot(ctx: &ScoringContext<'_>) -> Result<Option<(char, usize)>, char> {
    let request = ctx.request;
    match request.generation_char {
        None => Ok(None),
        Some(ch) if passes_filters(ctx, ch, ctx.char_info(ch)) => {
            Ok(Some((ch, request.generation_position.index())))
        }
        Some(ch) => Err(ch),
    }
}

/// `trials` weighted draws, de-duplicated and scored. Rejected draws are
/// dropped.
pub fn random_candidates(
    ctx: &ScoringContext<'_>,
    scorer: &mut FeatureScorer,
    rng: &mut StdRng,
) -> Vec<Candidate> {
    let request = ctx.request;
    let pool = filtered_pool(ctx);
    let generation = match generation_slot(ctx) {
        Ok(slot) => slot,
        Err(ch) => {
            debug!(generation = %ch, "generation char fails the filters");
            return Vec::new();
        }
    };
    if pool.is_empty() {
        debug!(region = %ctx.index.region, "empty candidate pool");
        return Vec::new();
    }
    let allowed: FxHashSet<char> = pool.iter().map(|wc| wc.ch).collect();
    let weights: Vec<f64> = pool.iter().map(|wc| wc.weight).collect();
    let Ok(dist) = WeightedIndex::new(&weights) else {
        return Vec::new();
    };

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut out = Vec::new();
    let mut rejected = 0usize;

    for _ in 0..request.trials {
        let single = request.allow_single_char
            && generation.is_none()
            && rng.gen_bool(SINGLE_CHAR_PROBABILITY);

        let first = match generation {
            Some((ch, 0)) => ch,
            _ => pool[dist.sample(rng)].ch,
        };

        let given = if single {
            first.to_string()
        } else {
            let second = match generation {
                Some((ch, 1)) => ch,
                _ => match continuation(ctx, first, &allowed, rng) {
                    Some(ch) => ch,
                    None => pool[dist.sample(rng)].ch,
                },
            };
            if second == first {
                continue;
            }
            format!("{}{}", first, second)
        };

        if !seen.insert(given.clone()) {
            continue;
        }
        match scorer.score(ctx, &given) {
            Some(candidate) => out.push(candidate),
            None => rejected += 1,
        }
    }

    debug!(
        pool = pool.len(),
        unique = seen.len(),
        rejected,
        kept = out.len(),
        "random trials"
    );
    out
}

/// Draw a second character in proportion to the bigram weights of
/// `first`, restricted to allowed characters.
fn continuation(
    ctx: &ScoringContext<'_>,
    first: char,
    allowed: &FxHashSet<char>,
    rng: &mut StdRng,
) -> Option<char> {
    let options: Vec<(char, f64)> = ctx
        .index
        .bigrams_by_first(first)
        .iter()
        .filter(|bg| bg.second != first && allowed.contains(&bg.second))
        .map(|bg| (bg.second, bg.weight))
        .collect();
    if options.is_empty() {
        return None;
    }
    let weights: Vec<f64> = options.iter().map(|(_, w)| *w).collect();
    let dist = WeightedIndex::new(&weights).ok()?;
    Some(options[dist.sample(rng)].0)
}

/// Deterministic beam expansion: the top `beam_size` first characters,
/// each extended by its top continuations (or the top generic characters
/// when it has none). Repeated first characters are penalised and the
/// best `4 × beam_size` candidates kept, best first.
pub fn beam_candidates(ctx: &ScoringContext<'_>, scorer: &mut FeatureScorer) -> Vec<Candidate> {
    let request = ctx.request;
    let width = request.beam_size.max(1);
    let mut pool = filtered_pool(ctx);
    pool.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    let allowed: FxHashSet<char> = pool.iter().map(|wc| wc.ch).collect();
    let generation = match generation_slot(ctx) {
        Ok(slot) => slot,
        Err(ch) => {
            debug!(generation = %ch, "generation char fails the filters");
            return Vec::new();
        }
    };

    let firsts: Vec<char> = match generation {
        Some((ch, 0)) => vec![ch],
        _ => pool.iter().take(width).map(|wc| wc.ch).collect(),
    };

    let mut expansions: Vec<String> = Vec::new();
    for &first in &firsts {
        if request.allow_single_char && generation.is_none() {
            expansions.push(first.to_string());
        }
        let seconds: Vec<char> = match generation {
            Some((ch, 1)) => vec![ch],
            _ => {
                let attested: Vec<char> = ctx
                    .index
                    .bigrams_by_first(first)
                    .iter()
                    .filter(|bg| bg.second != first && allowed.contains(&bg.second))
                    .map(|bg| bg.second)
                    .take(width)
                    .collect();
                if attested.is_empty() {
                    pool.iter()
                        .map(|wc| wc.ch)
                        .filter(|&ch| ch != first)
                        .take(width)
                        .collect()
                } else {
                    attested
                }
            }
        };
        for second in seconds {
            if second != first {
                expansions.push(format!("{}{}", first, second));
            }
        }
    }

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut scored: Vec<Candidate> = expansions
        .into_iter()
        .filter(|g| seen.insert(g.clone()))
        .filter_map(|g| scorer.score(ctx, &g))
        .collect();
    scored.sort_by(|a, b| b.total.total_cmp(&a.total));

    let mut repeats: FxHashMap<char, usize> = FxHashMap::default();
    for candidate in scored.iter_mut() {
        let Some(first) = candidate.first_char() else {
            continue;
        };
        let count = repeats.entry(first).or_insert(0);
        candidate.breakdown.diversity_penalty = request.penalties.beam_repeat * *count as f64;
        *count += 1;
        FeatureScorer::retotal(candidate, ctx);
    }
    scored.sort_by(|a, b| b.total.total_cmp(&a.total));
    scored.truncate(BEAM_KEEP_FACTOR * width);

    debug!(firsts = firsts.len(), kept = scored.len(), "beam expansion");
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lexicon::{Lexicon, RegionIndex};
    use crate::core::rng::rng_from_seed;
    use crate::schema::lexicon::{Bigram, CharPools, Region, RegionData};
    use crate::schema::request::{GenerationPosition, NameRequest, SelectionMode};

    fn lexicon() -> Lexicon {
        Lexicon::parse_ron("{}", "{}", "{}", "(general: [])").unwrap()
    }

    fn index() -> RegionIndex {
        let mut rare = WeightedChar::new('龘', 3.0).with_strokes(48);
        rare.rare = true;
        let mut poly = WeightedChar::new('乐', 4.0).with_strokes(5);
        poly.polyphonic = true;
        RegionIndex::build(
            Region::Cn,
            RegionData {
                surnames: Vec::new(),
                chars: CharPools {
                    male: vec![
                        WeightedChar::new('明', 9.0).with_strokes(8),
                        WeightedChar::new('宇', 7.0).with_strokes(6),
                        WeightedChar::new('浩', 6.0).with_strokes(10),
                        WeightedChar::new('德', 5.0).with_strokes(15),
                        WeightedChar::new('峰', 2.0),
                        rare,
                        poly,
                    ],
                    ..Default::default()
                },
                bigrams: vec![
                    Bigram::new('明', '宇', 5.0),
                    Bigram::new('明', '浩', 3.0),
                    Bigram::new('宇', '德', 2.0),
                ],
            },
        )
    }

    #[test]
    fn pool_filters() {
        let lexicon = lexicon();
        let index = index();
        let request = NameRequest {
            max_stroke_per_char: Some(12),
            avoid_rare: true,
            avoid_polyphonic: true,
            ..Default::default()
        };
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "王");
        let chars: Vec<char> = filtered_pool(&ctx).iter().map(|c| c.ch).collect();
        assert_eq!(chars, vec!['明', '宇', '浩']);
    }

    #[test]
    fn random_is_deterministic_and_unique() {
        let lexicon = lexicon();
        let index = index();
        let request = NameRequest::default();
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "王");
        let mut scorer = FeatureScorer::default();
        let a = random_candidates(&ctx, &mut scorer, &mut rng_from_seed("s"));
        let b = random_candidates(&ctx, &mut scorer, &mut rng_from_seed("s"));
        assert_eq!(a, b);
        let names: FxHashSet<&str> = a.iter().map(|c| c.given_name.as_str()).collect();
        assert_eq!(names.len(), a.len());
        assert!(a.iter().all(|c| c.given_name.chars().count() == 2));
    }

    #[test]
    fn generation_char_is_forced() {
        let lexicon = lexicon();
        let index = index();
        let request = NameRequest {
            generation_char: Some('德'),
            generation_position: GenerationPosition::Second,
            ..Default::default()
        };
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "王");
        let mut scorer = FeatureScorer::default();
        let random = random_candidates(&ctx, &mut scorer, &mut rng_from_seed("g"));
        assert!(!random.is_empty());
        assert!(random.iter().all(|c| c.given_name.ends_with('德')));
        let beam = beam_candidates(&ctx, &mut scorer);
        assert!(beam.iter().all(|c| c.given_name.ends_with('德')));
    }

    #[test]
    fn filtered_generation_char_yields_nothing() {
        let lexicon = lexicon();
        let index = index();
        let mut scorer = FeatureScorer::default();

        let too_heavy = NameRequest {
            generation_char: Some('德'),
            max_stroke_per_char: Some(12),
            ..Default::default()
        };
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &too_heavy, "王");
        assert!(random_candidates(&ctx, &mut scorer, &mut rng_from_seed("g")).is_empty());
        assert!(beam_candidates(&ctx, &mut scorer).is_empty());

        let mut blocked = NameRequest {
            generation_char: Some('明'),
            ..Default::default()
        };
        blocked.preferences.blocked_chars.push('明');
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &blocked, "王");
        assert!(random_candidates(&ctx, &mut scorer, &mut rng_from_seed("g")).is_empty());

        // no record, so no strokes to satisfy the filter
        let unknown = NameRequest {
            generation_char: Some('嘉'),
            min_stroke_per_char: Some(1),
            ..Default::default()
        };
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &unknown, "王");
        assert!(beam_candidates(&ctx, &mut scorer).is_empty());

        let allowed = NameRequest {
            generation_char: Some('宇'),
            max_stroke_per_char: Some(12),
            ..Default::default()
        };
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &allowed, "王");
        let beam = beam_candidates(&ctx, &mut scorer);
        assert!(!beam.is_empty());
        assert!(beam.iter().all(|c| c.given_name.starts_with('宇')));
    }

    #[test]
    fn single_chars_only_when_allowed() {
        let lexicon = lexicon();
        let index = index();
        let request = NameRequest {
            allow_single_char: true,
            trials: 400,
            ..Default::default()
        };
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "王");
        let mut scorer = FeatureScorer::default();
        let out = random_candidates(&ctx, &mut scorer, &mut rng_from_seed("single"));
        assert!(out.iter().any(|c| c.given_name.chars().count() == 1));
    }

    #[test]
    fn beam_penalises_repeated_first_chars() {
        let lexicon = lexicon();
        let index = index();
        let request = NameRequest {
            mode: SelectionMode::Beam,
            beam_size: 2,
            ..Default::default()
        };
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "王");
        let mut scorer = FeatureScorer::default();
        let beam = beam_candidates(&ctx, &mut scorer);
        assert!(beam.len() <= 8);
        assert!(beam.windows(2).all(|w| w[0].total >= w[1].total));
        let from_ming: Vec<&Candidate> =
            beam.iter().filter(|c| c.first_char() == Some('明')).collect();
        assert_eq!(from_ming.len(), 2);
        assert!(from_ming.iter().any(|c| c.breakdown.diversity_penalty > 0.0));
        // 宇 has a continuation, so generic fallback is not used for it.
        assert!(beam.iter().any(|c| c.given_name == "宇德"));
    }

    #[test]
    fn empty_pool_yields_nothing() {
        let lexicon = lexicon();
        let index = index();
        let request = NameRequest {
            min_stroke_per_char: Some(60),
            ..Default::default()
        };
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "王");
        let mut scorer = FeatureScorer::default();
        assert!(random_candidates(&ctx, &mut scorer, &mut rng_from_seed("x")).is_empty());
        assert!(beam_candidates(&ctx, &mut scorer).is_empty());
    }
}
