pub mod bigram;
pub mod cache;
pub mod context;
pub mod formatter;
pub mod generator;
pub mod lexicon;
pub mod loader;
pub mod phonology;
pub mod pipeline;
pub mod rng;
pub mod scorer;
pub mod selector;
pub mod semantics;
pub mod variety;
pub mod worker;
