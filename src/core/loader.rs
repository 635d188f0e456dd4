/// Region data sources and the once-per-region loader.
use rustc_hash::FxHashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use tracing::{debug, debug_span, warn};

use crate::core::lexicon::{LexiconError, RegionIndex};
use crate::schema::lexicon::{Region, RegionData};

/// Anything that can fetch a region's records by name.
pub trait RegionSource: Send + Sync {
    fn fetch(&self, region: Region) -> Result<RegionData, LexiconError>;
}

/// Datasets compiled into the binary.
pub mod embedded {
    pub const TAGS: &str = include_str!("../../lexicon_data/shared/tags.ron");
    pub const MANDARIN: &str = include_str!("../../lexicon_data/shared/mandarin.ron");
    pub const CANTONESE: &str = include_str!("../../lexicon_data/shared/cantonese.ron");
    pub const BLACKLIST: &str = include_str!("../../lexicon_data/shared/blacklist.ron");

    pub const CN_SURNAMES: &str = include_str!("../../lexicon_data/cn/surnames.ron");
    pub const CN_CHARS: &str = include_str!("../../lexicon_data/cn/chars.ron");
    pub const CN_BIGRAMS: &str = include_str!("../../lexicon_data/cn/bigrams.ron");

    pub const TW_SURNAMES: &str = include_str!("../../lexicon_data/tw/surnames.ron");
    pub const TW_CHARS: &str = include_str!("../../lexicon_data/tw/chars.ron");
    pub const TW_BIGRAMS: &str = include_str!("../../lexicon_data/tw/bigrams.ron");

    pub const HK_SURNAMES: &str = include_str!("../../lexicon_data/hk/surnames.ron");
    pub const HK_CHARS: &str = include_str!("../../lexicon_data/hk/chars.ron");
    pub const HK_BIGRAMS: &str = include_str!("../../lexicon_data/hk/bigrams.ron");
}

/// Region records bundled with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedSource;

impl RegionSource for EmbeddedSource {
    fn fetch(&self, region: Region) -> Result<RegionData, LexiconError> {
        let (surnames, chars, bigrams) = match region {
            Region::Cn => (embedded::CN_SURNAMES, embedded::CN_CHARS, embedded::CN_BIGRAMS),
            Region::Tw => (embedded::TW_SURNAMES, embedded::TW_CHARS, embedded::TW_BIGRAMS),
            Region::Hk => (embedded::HK_SURNAMES, embedded::HK_CHARS, embedded::HK_BIGRAMS),
        };
        RegionData::parse_ron(surnames, chars, bigrams)
    }
}

/// Reads `<root>/<region>/{surnames,chars,bigrams}.ron`, region directory
/// names in lowercase.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn region_dir(&self, region: Region) -> PathBuf {
        self.root.join(region.code().to_lowercase())
    }
}

impl RegionSource for DirSource {
    fn fetch(&self, region: Region) -> Result<RegionData, LexiconError> {
        let dir = self.region_dir(region);
        let read = |name: &str| std::fs::read_to_string(dir.join(name));
        RegionData::parse_ron(
            &read("surnames.ron")?,
            &read("chars.ron")?,
            &read("bigrams.ron")?,
        )
    }
}

/// In-memory records, for tests and injected corpora.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    regions: FxHashMap<Region, RegionData>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: Region, data: RegionData) -> Self {
        self.regions.insert(region, data);
        self
    }
}

impl RegionSource for MemorySource {
    fn fetch(&self, region: Region) -> Result<RegionData, LexiconError> {
        self.regions
            .get(&region)
            .cloned()
            .ok_or(LexiconError::RegionUnavailable(region))
    }
}

enum LoadState {
    Loading,
    Loaded(Arc<RegionIndex>),
}

/// Loads each region at most once. A region moves from unloaded (absent)
/// to `Loading` to `Loaded`; callers that arrive while a load is in flight
/// wait for it instead of fetching again.
pub struct RegionLoader {
    source: Arc<dyn RegionSource>,
    states: Mutex<FxHashMap<Region, LoadState>>,
    ready: Condvar,
}

impl RegionLoader {
    pub fn new(source: Arc<dyn RegionSource>) -> Self {
        Self {
            source,
            states: Mutex::new(FxHashMap::default()),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<Region, LoadState>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn ensure(&self, region: Region) -> Arc<RegionIndex> {
        let mut states = self.lock();
        loop {
            let in_flight = match states.get(&region) {
                Some(LoadState::Loaded(index)) => return Arc::clone(index),
                Some(LoadState::Loading) => true,
                None => false,
            };
            if !in_flight {
                break;
            }
            states = self.ready.wait(states).unwrap_or_else(|e| e.into_inner());
        }
        states.insert(region, LoadState::Loading);
        drop(states);

        let _span = debug_span!("load_region", region = region.code()).entered();
        let fetched = panic::catch_unwind(AssertUnwindSafe(|| self.source.fetch(region)))
            .unwrap_or(Err(LexiconError::LoaderPanicked(region)));
        let data = match fetched {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    region = region.code(),
                    error = %e,
                    "region data unavailable, using empty pools"
                );
                RegionData::default()
            }
        };
        let index = Arc::new(RegionIndex::build(region, data));
        debug!(
            surnames = index.surnames.len(),
            vocab = index.vocab_size,
            "region indexed"
        );

        let mut states = self.lock();
        states.insert(region, LoadState::Loaded(Arc::clone(&index)));
        self.ready.notify_all();
        index
    }

    pub fn loaded(&self, region: Region) -> Option<Arc<RegionIndex>> {
        match self.lock().get(&region) {
            Some(LoadState::Loaded(index)) => Some(Arc::clone(index)),
            _ => None,
        }
    }

    pub fn is_loaded(&self, region: Region) -> bool {
        self.loaded(region).is_some()
    }

    /// All regions that finished loading.
    pub fn loaded_regions(&self) -> Vec<Arc<RegionIndex>> {
        let states = self.lock();
        let mut out: Vec<Arc<RegionIndex>> = states
            .values()
            .filter_map(|s| match s {
                LoadState::Loaded(index) => Some(Arc::clone(index)),
                LoadState::Loading => None,
            })
            .collect();
        out.sort_by_key(|idx| idx.region);
        out
    }
}

/// Convenience: does a lexicon directory contain a region subdirectory?
pub fn has_region_dir(root: &Path, region: Region) -> bool {
    root.join(region.code().to_lowercase()).is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::lexicon::{Bigram, CharPools, WeightedChar};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    struct CountingSource {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl RegionSource for CountingSource {
        fn fetch(&self, _region: Region) -> Result<RegionData, LexiconError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            Ok(RegionData {
                surnames: Vec::new(),
                chars: CharPools {
                    male: vec![WeightedChar::new('明', 1.0)],
                    ..Default::default()
                },
                bigrams: vec![Bigram::new('明', '宇', 2.0)],
            })
        }
    }

    struct PanickingSource;

    impl RegionSource for PanickingSource {
        fn fetch(&self, _region: Region) -> Result<RegionData, LexiconError> {
            panic!("backing store exploded");
        }
    }

    #[test]
    fn ensure_is_idempotent() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(0),
        });
        let loader = RegionLoader::new(source.clone());
        assert!(!loader.is_loaded(Region::Hk));
        let a = loader.ensure(Region::Hk);
        let b = loader.ensure(Region::Hk);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.bigrams_by_first('明').len(), 1);
    }

    #[test]
    fn concurrent_callers_share_one_fetch() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(50),
        });
        let loader = Arc::new(RegionLoader::new(source.clone()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let loader = Arc::clone(&loader);
                thread::spawn(move || loader.ensure(Region::Tw).vocab_size)
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 2);
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_region_falls_back_to_empty() {
        let loader = RegionLoader::new(Arc::new(MemorySource::new()));
        let index = loader.ensure(Region::Hk);
        assert!(index.is_empty());
        assert!(loader.is_loaded(Region::Hk));
    }

    #[test]
    fn panicking_source_falls_back_to_empty() {
        let loader = RegionLoader::new(Arc::new(PanickingSource));
        assert!(loader.ensure(Region::Cn).is_empty());
    }

    #[test]
    fn embedded_source_has_every_region() {
        for region in Region::all() {
            let data = EmbeddedSource.fetch(*region).unwrap();
            assert!(!data.surnames.is_empty(), "no surnames for {}", region);
            assert!(!data.bigrams.is_empty(), "no bigrams for {}", region);
        }
    }
}
