/// Winner selection over a scored candidate pool: greedy argmax,
/// temperature / top-k / top-p sampling, or the head of a beam.
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;

use crate::core::scorer::Candidate;
use crate::schema::request::{NameRequest, SelectionMode};

/// Floor for the softmax temperature.
const MIN_TEMPERATURE: f64 = 1e-3;

/// Index of the winning candidate, or `None` for an empty pool.
pub fn select(pool: &[Candidate], request: &NameRequest, rng: &mut StdRng) -> Option<usize> {
    match request.mode {
        SelectionMode::Max => select_max(pool),
        SelectionMode::Sample => select_sample(
            pool,
            request.temperature,
            request.top_k,
            request.top_p,
            rng,
        ),
        // The beam arrives ranked; argmax keeps this correct for any order.
        SelectionMode::Beam => select_max(pool),
    }
}

/// Highest total; the earliest candidate wins ties.
pub fn select_max(pool: &[Candidate]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, c) in pool.iter().enumerate() {
        match best {
            Some(b) if pool[b].total >= c.total => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Indices of `pool` ordered by total descending, ties in pool order.
pub fn ranked(pool: &[Candidate]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..pool.len()).collect();
    order.sort_by(|&a, &b| pool[b].total.total_cmp(&pool[a].total));
    order
}

/// Softmax probabilities of `scores` at `temperature`.
pub fn softmax(scores: &[f64], temperature: f64) -> Vec<f64> {
    let t = temperature.max(MIN_TEMPERATURE);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| ((s - max) / t).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return vec![1.0 / scores.len().max(1) as f64; scores.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Top-K by score, softmax with temperature, smallest prefix whose mass
/// reaches top-P, then a weighted draw.
pub fn select_sample(
    pool: &[Candidate],
    temperature: f64,
    top_k: usize,
    top_p: f64,
    rng: &mut StdRng,
) -> Option<usize> {
    if pool.is_empty() {
        return None;
    }
    let mut order = ranked(pool);
    order.truncate(top_k.max(1));

    let scores: Vec<f64> = order.iter().map(|&i| pool[i].total).collect();
    let probs = softmax(&scores, temperature);

    let mut cumulative = 0.0;
    let mut cut = probs.len();
    for (i, p) in probs.iter().enumerate() {
        cumulative += p;
        if cumulative >= top_p {
            cut = i + 1;
            break;
        }
    }

    let nucleus = &probs[..cut.max(1)];
    match WeightedIndex::new(nucleus) {
        Ok(dist) => Some(order[dist.sample(rng)]),
        Err(_) => order.first().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::rng_from_seed;
    use crate::schema::result::ScoreBreakdown;

    fn cand(name: &str, total: f64) -> Candidate {
        Candidate {
            given_name: name.to_string(),
            strokes: Vec::new(),
            breakdown: ScoreBreakdown::default(),
            total,
            reasons: Vec::new(),
        }
    }

    #[test]
    fn max_is_stable_on_ties() {
        let pool = vec![cand("甲", 1.0), cand("乙", 2.0), cand("丙", 2.0)];
        assert_eq!(select_max(&pool), Some(1));
        assert_eq!(select_max(&[]), None);
    }

    #[test]
    fn softmax_sums_to_one() {
        let p = softmax(&[3.0, 1.0, 0.0], 0.8);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(p[0] > p[1] && p[1] > p[2]);
    }

    #[test]
    fn sampling_stays_in_nucleus() {
        let pool = vec![cand("甲", 5.0), cand("乙", 0.0), cand("丙", 4.9), cand("丁", -3.0)];
        let mut rng = rng_from_seed("nucleus");
        for _ in 0..50 {
            let i = select_sample(&pool, 0.5, 2, 0.9, &mut rng).unwrap();
            assert!(i == 0 || i == 2);
        }
        // top_k = 1 is greedy.
        assert_eq!(select_sample(&pool, 0.8, 1, 0.9, &mut rng), Some(0));
    }

    #[test]
    fn low_top_p_is_greedy() {
        let pool = vec![cand("甲", 1.0), cand("乙", 3.0)];
        let mut rng = rng_from_seed("p");
        assert_eq!(select_sample(&pool, 1.0, 8, 0.01, &mut rng), Some(1));
    }

    #[test]
    fn dispatch_by_mode() {
        let pool = vec![cand("甲", 1.0), cand("乙", 3.0)];
        let mut rng = rng_from_seed("mode");
        let beam = NameRequest {
            mode: SelectionMode::Beam,
            ..Default::default()
        };
        assert_eq!(select(&pool, &beam, &mut rng), Some(1));
        assert_eq!(select(&[], &NameRequest::default(), &mut rng), None);
    }
}
