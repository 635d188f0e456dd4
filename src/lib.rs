//! Chinese Name Engine — seeded generation, scoring and ranking of
//! Chinese personal names.
//!
//! Candidates are drawn from weighted regional character pools and a
//! bigram table, scored on adjacency, character weight, tone-aware
//! euphony and semantic fit, then selected greedily, by nucleus sampling
//! or by beam search. Batches are diversified with an MMR pass.
//!
//! ```no_run
//! use chinese_name_engine::core::pipeline::NameEngine;
//! use chinese_name_engine::schema::request::NameRequest;
//!
//! let mut engine = NameEngine::builder().build()?;
//! let name = engine.generate(&NameRequest {
//!     seed: Some("42".into()),
//!     ..Default::default()
//! });
//! println!("{} ({})", name.full_name, name.meta.romanization);
//! # Ok::<(), chinese_name_engine::core::pipeline::EngineError>(())
//! ```

pub mod core;
pub mod schema;
