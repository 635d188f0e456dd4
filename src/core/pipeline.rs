/// The main name pipeline: request → region data → candidates → scores →
/// selection → (batch MMR) → formatted results.
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, debug_span};

use crate::core::cache::DEFAULT_CACHE_CEILING;
use crate::core::context::ScoringContext;
use crate::core::formatter::{fallback_candidate, format_result, FALLBACK_STRATEGY};
use crate::core::generator::{beam_candidates, random_candidates};
use crate::core::lexicon::{Lexicon, LexiconError, LexiconStore, RegionIndex};
use crate::core::loader::{DirSource, EmbeddedSource, RegionSource};
use crate::core::rng::{fresh_seed, rng_from_seed, sub_seed};
use crate::core::scorer::FeatureScorer;
use crate::core::selector::{ranked, select};
use crate::core::variety::{VarietyPass, DEFAULT_LAMBDA};
use crate::schema::lexicon::Region;
use crate::schema::request::{NameRequest, SelectionMode};
use crate::schema::result::{EffectiveParams, NameResult};

/// Surname used when the region has no surname data and the request
/// names none.
pub const DEFAULT_SURNAME: &str = "王";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("lexicon error: {0}")]
    Lexicon(#[from] LexiconError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Engine-level settings, loadable from RON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Entry ceiling of each scorer cache before it is cleared.
    pub cache_ceiling: usize,
    /// Region loaded eagerly at build time.
    pub default_region: Region,
    /// Lexicon root with a `shared/` directory and one directory per
    /// region. The bundled lexicon is used when absent.
    pub lexicon_dir: Option<PathBuf>,
    /// Relevance weight of the batch MMR pass.
    pub mmr_lambda: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ceiling: DEFAULT_CACHE_CEILING,
            default_region: Region::Cn,
            lexicon_dir: None,
            mmr_lambda: DEFAULT_LAMBDA,
        }
    }
}

impl EngineConfig {
    pub fn load_from_ron(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&contents)?)
    }
}

/// One request's winner plus the rest of its ranked pool.
struct Outcome {
    winner: NameResult,
    alternates: Vec<NameResult>,
}

/// The top-level name engine. Built via `NameEngine::builder()`.
pub struct NameEngine {
    store: LexiconStore,
    scorer: FeatureScorer,
    config: EngineConfig,
}

/// Builder for constructing a `NameEngine`.
pub struct NameEngineBuilder {
    config: EngineConfig,
    /// Directly provided shared tables (for testing without files).
    lexicon: Option<Lexicon>,
    /// Directly provided region source (for testing without files).
    source: Option<Arc<dyn RegionSource>>,
}

impl NameEngine {
    pub fn builder() -> NameEngineBuilder {
        NameEngineBuilder {
            config: EngineConfig::default(),
            lexicon: None,
            source: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &LexiconStore {
        &self.store
    }

    /// Load regions ahead of their first request.
    pub fn warm_up(&self, regions: &[Region]) {
        for &region in regions {
            self.store.ensure_region(region);
        }
    }

    /// Swap the lexicon and region source. Caches and loaded regions are
    /// discarded and the default region is loaded again.
    pub fn configure(&mut self, lexicon: Lexicon, source: Arc<dyn RegionSource>) {
        self.store.configure(lexicon, source);
        self.scorer.reset_caches();
        self.store.ensure_region(self.config.default_region);
    }

    pub fn reset_caches(&mut self) {
        self.scorer.reset_caches();
    }

    /// Generate one name. Never fails: missing data and over-constrained
    /// requests fall back to the neutral default.
    pub fn generate(&mut self, request: &NameRequest) -> NameResult {
        let seed = request.seed.clone().unwrap_or_else(fresh_seed);
        self.run(request, &seed).winner
    }

    /// Generate `request.count` names. Item `i` runs with seed
    /// `"{seed}_{i}"`; winners are de-duplicated, ordered by MMR and topped
    /// up from the union of every item's pool.
    pub fn generate_batch(&mut self, request: &NameRequest) -> Vec<NameResult> {
        let count = request.count.max(1);
        if count == 1 {
            return vec![self.generate(request)];
        }
        let _span = debug_span!("generate_batch", count, region = %request.region).entered();
        let seed = request.seed.clone().unwrap_or_else(fresh_seed);

        let mut winners: Vec<NameResult> = Vec::with_capacity(count);
        let mut union: Vec<NameResult> = Vec::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        for i in 0..count {
            let outcome = self.run(request, &sub_seed(&seed, i));
            if seen.insert(outcome.winner.full_name.clone()) {
                winners.push(outcome.winner);
            }
            union.extend(outcome.alternates);
        }

        let phonology = request.region.phonology();
        let lexicon = self.store.lexicon();
        let pass = VarietyPass::new(lexicon, phonology).with_lambda(self.config.mmr_lambda);

        let order = pass.rerank(&winners, winners.len());
        let mut out: Vec<NameResult> = order.into_iter().map(|i| winners[i].clone()).collect();

        if out.len() < count {
            let mut pool_seen = seen;
            union.retain(|r| pool_seen.insert(r.full_name.clone()));
            let chosen: Vec<&str> = out.iter().map(|r| r.given_name.as_str()).collect();
            let extra = pass.top_up(&chosen, &union, count - out.len());
            let extra: Vec<NameResult> = extra.into_iter().map(|i| union[i].clone()).collect();
            debug!(topped_up = extra.len(), "batch top-up");
            out.extend(extra);
        }
        out
    }

    fn run(&mut self, request: &NameRequest, seed: &str) -> Outcome {
        let _span = debug_span!(
            "generate",
            region = %request.region,
            mode = request.mode.label(),
            seed
        )
        .entered();
        let mut rng = rng_from_seed(seed);

        let index = self.store.ensure_region(request.region);
        // Every other region takes part in the blend, loaded on demand, so
        // the score does not depend on which regions earlier requests loaded.
        let others: Vec<Arc<RegionIndex>> = if request.cross_region_mix > 0.0 {
            Region::all()
                .iter()
                .filter(|&&r| r != request.region)
                .map(|&r| self.store.ensure_region(r))
                .collect()
        } else {
            Vec::new()
        };
        let surname = pick_surname(&index, request, &mut rng);

        let lexicon = self.store.lexicon();
        let ctx = ScoringContext::new(
            lexicon,
            &index,
            others.iter().map(Arc::as_ref).collect(),
            request,
            &surname,
        );

        let pool = match request.mode {
            SelectionMode::Beam => beam_candidates(&ctx, &mut self.scorer),
            SelectionMode::Max | SelectionMode::Sample => {
                random_candidates(&ctx, &mut self.scorer, &mut rng)
            }
        };
        debug!(pool = pool.len(), surname = %surname, "candidates scored");

        let params = EffectiveParams {
            seed: seed.to_string(),
            mode: request.mode.label().to_string(),
            trials: request.trials,
            beam_size: request.beam_size,
            temperature: request.temperature,
            top_k: request.top_k,
            top_p: request.top_p,
            weights: request.weights,
            penalties: request.penalties,
            pool_size: pool.len(),
        };

        let Some(choice) = select(&pool, request, &mut rng) else {
            let fallback = fallback_candidate(&ctx, &self.scorer);
            return Outcome {
                winner: format_result(&ctx, &fallback, FALLBACK_STRATEGY, params),
                alternates: Vec::new(),
            };
        };

        let strategy = request.mode.label();
        let winner = format_result(&ctx, &pool[choice], strategy, params.clone());
        let alternates = ranked(&pool)
            .into_iter()
            .filter(|&i| i != choice)
            .map(|i| format_result(&ctx, &pool[i], strategy, params.clone()))
            .collect();
        Outcome { winner, alternates }
    }
}

/// The request's surname, or a weighted draw from the region's surnames.
fn pick_surname(index: &RegionIndex, request: &NameRequest, rng: &mut StdRng) -> String {
    if let Some(surname) = request.surname.as_deref().filter(|s| !s.trim().is_empty()) {
        return surname.trim().to_string();
    }
    let weights: Vec<f64> = index.surnames.iter().map(|s| s.weight.max(0.0)).collect();
    match WeightedIndex::new(&weights) {
        Ok(dist) => index.surnames[dist.sample(rng)].surname.clone(),
        Err(_) => DEFAULT_SURNAME.to_string(),
    }
}

impl NameEngineBuilder {
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn lexicon_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.lexicon_dir = Some(path.into());
        self
    }

    pub fn cache_ceiling(mut self, ceiling: usize) -> Self {
        self.config.cache_ceiling = ceiling;
        self
    }

    pub fn default_region(mut self, region: Region) -> Self {
        self.config.default_region = region;
        self
    }

    /// Provide the shared tables directly (for testing without files).
    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    /// Provide the region source directly (for testing without files).
    pub fn with_source(mut self, source: Arc<dyn RegionSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn build(self) -> Result<NameEngine, EngineError> {
        let lexicon = match (self.lexicon, &self.config.lexicon_dir) {
            (Some(lexicon), _) => lexicon,
            (None, Some(dir)) => Lexicon::load_from_dir(&dir.join("shared"))?,
            (None, None) => Lexicon::embedded()?,
        };
        let source: Arc<dyn RegionSource> = match (self.source, &self.config.lexicon_dir) {
            (Some(source), _) => source,
            (None, Some(dir)) => Arc::new(DirSource::new(dir.clone())),
            (None, None) => Arc::new(EmbeddedSource),
        };

        let store = LexiconStore::new(lexicon, source);
        store.ensure_region(self.config.default_region);

        Ok(NameEngine {
            store,
            scorer: FeatureScorer::new(self.config.cache_ceiling),
            config: self.config,
        })
    }
}
