/// Deterministic RNG seeded from request text.
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Fold a text seed into a `u64`. `FxHasher` carries no per-process random
/// state, so the same text always yields the same value.
pub fn seed_to_u64(seed: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(seed.as_bytes());
    hasher.write_u8(0xff);
    hasher.finish()
}

pub fn rng_from_seed(seed: &str) -> StdRng {
    StdRng::seed_from_u64(seed_to_u64(seed))
}

/// Seed for item `index` of a batch: `"{seed}_{index}"`.
pub fn sub_seed(seed: &str, index: usize) -> String {
    format!("{}_{}", seed, index)
}

/// A fresh seed for requests that did not supply one.
pub fn fresh_seed() -> String {
    rand::random::<u64>().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn same_text_same_stream() {
        let mut a = rng_from_seed("42");
        let mut b = rng_from_seed("42");
        let xs: Vec<u32> = (0..8).map(|_| a.gen()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.gen()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn sub_seeds_differ() {
        assert_eq!(sub_seed("42", 3), "42_3");
        assert_ne!(seed_to_u64(&sub_seed("42", 0)), seed_to_u64(&sub_seed("42", 1)));
    }
}
