/// Lexicon store — shared tag/phonetic/blacklist tables plus per-region
/// indexes built on demand from weighted records.
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::core::loader::{RegionLoader, RegionSource};
use crate::schema::lexicon::{
    Bigram, CharPools, Gender, Phonology, Region, RegionData, WeightedChar, WeightedSurname,
};
use crate::schema::phonetic::{CantoneseEntry, MandarinEntry};

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("no data source for region {0}")]
    RegionUnavailable(Region),
    #[error("region loader panicked while fetching {0}")]
    LoaderPanicked(Region),
}

/// Weight multiplier applied to unisex characters folded into a gendered pool.
pub const UNISEX_FOLD_WEIGHT: f64 = 0.6;
/// Weight multiplier for gendered characters folded into the unisex pool.
pub const GENDERED_FOLD_WEIGHT: f64 = 0.3;

/// Homophone blacklist: raw substrings plus toneless syllable sequences
/// such as `"si wang"` matched against the name's pronunciation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomophoneBlacklist {
    #[serde(default)]
    pub substrings: Vec<String>,
    #[serde(default)]
    pub syllables: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RonBlacklists {
    #[serde(default)]
    general: Vec<String>,
    #[serde(default)]
    homophone: HomophoneBlacklist,
}

/// Region-independent reference tables. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    pub tags: FxHashMap<char, FxHashSet<String>>,
    pub mandarin: FxHashMap<char, MandarinEntry>,
    pub cantonese: FxHashMap<char, CantoneseEntry>,
    pub blacklist: Vec<String>,
    pub homophones: HomophoneBlacklist,
}

impl Lexicon {
    /// Parse the four shared tables from RON sources.
    pub fn parse_ron(
        tags: &str,
        mandarin: &str,
        cantonese: &str,
        blacklists: &str,
    ) -> Result<Lexicon, LexiconError> {
        let raw_tags: FxHashMap<char, Vec<String>> = ron::from_str(tags)?;
        let raw_mandarin: FxHashMap<char, String> = ron::from_str(mandarin)?;
        let raw_cantonese: FxHashMap<char, String> = ron::from_str(cantonese)?;
        let lists: RonBlacklists = ron::from_str(blacklists)?;

        Ok(Lexicon {
            tags: raw_tags
                .into_iter()
                .map(|(ch, tags)| (ch, tags.into_iter().collect()))
                .collect(),
            mandarin: raw_mandarin
                .into_iter()
                .map(|(ch, syl)| (ch, MandarinEntry::parse(&syl)))
                .collect(),
            cantonese: raw_cantonese
                .into_iter()
                .map(|(ch, syl)| (ch, CantoneseEntry::parse(&syl)))
                .collect(),
            blacklist: lists.general,
            homophones: lists.homophone,
        })
    }

    /// Load `tags.ron`, `mandarin.ron`, `cantonese.ron` and `blacklist.ron`
    /// from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Lexicon, LexiconError> {
        let read = |name: &str| std::fs::read_to_string(dir.join(name));
        Self::parse_ron(
            &read("tags.ron")?,
            &read("mandarin.ron")?,
            &read("cantonese.ron")?,
            &read("blacklist.ron")?,
        )
    }

    /// The lexicon bundled with the crate.
    pub fn embedded() -> Result<Lexicon, LexiconError> {
        use crate::core::loader::embedded;
        Self::parse_ron(
            embedded::TAGS,
            embedded::MANDARIN,
            embedded::CANTONESE,
            embedded::BLACKLIST,
        )
    }

    /// Tags from the shared dictionary merged with the record's own tags.
    pub fn tags_for<'a>(
        &'a self,
        ch: char,
        record: Option<&'a WeightedChar>,
    ) -> FxHashSet<&'a str> {
        let mut out: FxHashSet<&str> = FxHashSet::default();
        if let Some(tags) = self.tags.get(&ch) {
            out.extend(tags.iter().map(String::as_str));
        }
        if let Some(rec) = record {
            out.extend(rec.tags.iter().map(String::as_str));
        }
        out
    }

    /// Toneless syllables of `text` in the given phonology; characters
    /// without an entry are passed through unchanged.
    pub fn plain_syllables(&self, text: &str, phonology: Phonology) -> Vec<String> {
        text.chars()
            .map(|ch| {
                let plain = match phonology {
                    Phonology::Mandarin => self.mandarin.get(&ch).map(|e| e.plain()),
                    Phonology::Cantonese => self.cantonese.get(&ch).map(|e| e.plain()),
                };
                plain.unwrap_or_else(|| ch.to_string())
            })
            .collect()
    }

    pub fn general_blacklist_hit(&self, full_name: &str) -> Option<&str> {
        self.blacklist
            .iter()
            .find(|b| !b.is_empty() && full_name.contains(b.as_str()))
            .map(String::as_str)
    }

    pub fn homophone_hit(&self, full_name: &str, phonology: Phonology) -> Option<String> {
        if let Some(sub) = self
            .homophones
            .substrings
            .iter()
            .find(|s| !s.is_empty() && full_name.contains(s.as_str()))
        {
            return Some(sub.clone());
        }
        if self.homophones.syllables.is_empty() {
            return None;
        }
        let spoken = format!(" {} ", self.plain_syllables(full_name, phonology).join(" "));
        self.homophones
            .syllables
            .iter()
            .find(|seq| !seq.trim().is_empty() && spoken.contains(&format!(" {} ", seq.trim())))
            .cloned()
    }
}

/// Surnames file.
pub fn parse_surnames(src: &str) -> Result<Vec<WeightedSurname>, LexiconError> {
    Ok(ron::from_str(src)?)
}

/// Character pools file with `male`, `female` and `unisex` lists.
pub fn parse_chars(src: &str) -> Result<CharPools, LexiconError> {
    Ok(ron::from_str(src)?)
}

pub fn parse_bigrams(src: &str) -> Result<Vec<Bigram>, LexiconError> {
    Ok(ron::from_str(src)?)
}

impl RegionData {
    pub fn parse_ron(
        surnames: &str,
        chars: &str,
        bigrams: &str,
    ) -> Result<RegionData, LexiconError> {
        Ok(RegionData {
            surnames: parse_surnames(surnames)?,
            chars: parse_chars(chars)?,
            bigrams: parse_bigrams(bigrams)?,
        })
    }
}

/// A loaded region: folded character pools, character lookup and the
/// first-character bigram index.
#[derive(Debug, Clone)]
pub struct RegionIndex {
    pub region: Region,
    pub surnames: Vec<WeightedSurname>,
    male: Vec<WeightedChar>,
    female: Vec<WeightedChar>,
    unisex: Vec<WeightedChar>,
    chars: FxHashMap<char, WeightedChar>,
    by_first: FxHashMap<char, Vec<Bigram>>,
    pub max_char_weight: f64,
    pub max_bigram_weight: f64,
    pub vocab_size: usize,
}

impl RegionIndex {
    pub fn empty(region: Region) -> Self {
        Self::build(region, RegionData::default())
    }

    pub fn build(region: Region, data: RegionData) -> Self {
        let clamp = |mut wc: WeightedChar| {
            wc.weight = wc.weight.max(0.0);
            wc
        };
        let male: Vec<WeightedChar> = data.chars.male.into_iter().map(clamp).collect();
        let female: Vec<WeightedChar> = data.chars.female.into_iter().map(clamp).collect();
        let unisex: Vec<WeightedChar> = data.chars.unisex.into_iter().map(clamp).collect();

        let male_pool = fold(&male, &[(&unisex, UNISEX_FOLD_WEIGHT)]);
        let female_pool = fold(&female, &[(&unisex, UNISEX_FOLD_WEIGHT)]);
        let unisex_pool = fold(
            &unisex,
            &[(&male, GENDERED_FOLD_WEIGHT), (&female, GENDERED_FOLD_WEIGHT)],
        );

        let mut chars: FxHashMap<char, WeightedChar> = FxHashMap::default();
        for wc in male.iter().chain(female.iter()).chain(unisex.iter()) {
            match chars.get(&wc.ch) {
                Some(existing) if existing.weight >= wc.weight => {}
                _ => {
                    chars.insert(wc.ch, wc.clone());
                }
            }
        }

        let mut by_first: FxHashMap<char, Vec<Bigram>> = FxHashMap::default();
        let mut vocab: FxHashSet<char> = chars.keys().copied().collect();
        for mut bg in data.bigrams {
            bg.weight = bg.weight.max(0.0);
            if bg.region.is_none() {
                bg.region = Some(region);
            }
            vocab.insert(bg.first);
            vocab.insert(bg.second);
            by_first.entry(bg.first).or_default().push(bg);
        }
        for list in by_first.values_mut() {
            list.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        }

        let max_char_weight = chars.values().map(|c| c.weight).fold(0.0, f64::max);
        let max_bigram_weight = by_first
            .values()
            .flat_map(|l| l.iter().map(|b| b.weight))
            .fold(0.0, f64::max);

        RegionIndex {
            region,
            surnames: data.surnames,
            male: male_pool,
            female: female_pool,
            unisex: unisex_pool,
            chars,
            by_first,
            max_char_weight,
            max_bigram_weight,
            vocab_size: vocab.len().max(2),
        }
    }

    /// Candidate pool for a gender, unisex entries already folded in.
    pub fn pool(&self, gender: Gender) -> &[WeightedChar] {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
            Gender::Unisex => &self.unisex,
        }
    }

    /// Bigrams starting with `ch`, heaviest first. Empty when none exist.
    pub fn bigrams_by_first(&self, ch: char) -> &[Bigram] {
        self.by_first.get(&ch).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pair_entries(&self, first: char, second: char) -> impl Iterator<Item = &Bigram> {
        self.bigrams_by_first(first)
            .iter()
            .filter(move |b| b.second == second)
    }

    pub fn char_info(&self, ch: char) -> Option<&WeightedChar> {
        self.chars.get(&ch)
    }

    pub fn surname_strokes(&self, surname: &str) -> Option<u32> {
        self.surnames
            .iter()
            .find(|s| s.surname == surname)
            .and_then(|s| s.strokes)
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty() && self.surnames.is_empty() && self.by_first.is_empty()
    }
}

fn fold(base: &[WeightedChar], extras: &[(&Vec<WeightedChar>, f64)]) -> Vec<WeightedChar> {
    let mut seen: FxHashSet<char> = base.iter().map(|c| c.ch).collect();
    let mut pool: Vec<WeightedChar> = base.to_vec();
    for (extra, factor) in extras {
        for wc in extra.iter() {
            if seen.insert(wc.ch) {
                let mut folded = wc.clone();
                folded.weight *= factor;
                pool.push(folded);
            }
        }
    }
    pool
}

/// Shared lexicon tables plus the lazily-populated region indexes.
pub struct LexiconStore {
    lexicon: Arc<Lexicon>,
    loader: Arc<RegionLoader>,
}

impl LexiconStore {
    pub fn new(lexicon: Lexicon, source: Arc<dyn RegionSource>) -> Self {
        Self {
            lexicon: Arc::new(lexicon),
            loader: Arc::new(RegionLoader::new(source)),
        }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Shared handle to the region loader, e.g. for warming regions from
    /// another thread.
    pub fn loader(&self) -> Arc<RegionLoader> {
        Arc::clone(&self.loader)
    }

    /// Load a region if needed and return its index. Idempotent; concurrent
    /// callers share one in-flight load.
    pub fn ensure_region(&self, region: Region) -> Arc<RegionIndex> {
        self.loader.ensure(region)
    }

    /// An already-loaded region, without triggering a fetch.
    pub fn region(&self, region: Region) -> Option<Arc<RegionIndex>> {
        self.loader.loaded(region)
    }

    /// Bigrams starting with `ch` in a loaded region; empty when the region
    /// is not loaded or has no entries for `ch`.
    pub fn bigrams_by_first(&self, region: Region, ch: char) -> Vec<Bigram> {
        self.region(region)
            .map(|idx| idx.bigrams_by_first(ch).to_vec())
            .unwrap_or_default()
    }

    /// Swap every dataset. Previously loaded regions are discarded.
    pub fn configure(&mut self, lexicon: Lexicon, source: Arc<dyn RegionSource>) {
        self.lexicon = Arc::new(lexicon);
        self.loader = Arc::new(RegionLoader::new(source));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::lexicon::Structure;

    fn sample_data() -> RegionData {
        RegionData {
            surnames: vec![WeightedSurname {
                surname: "王".to_string(),
                weight: 10.0,
                strokes: Some(4),
            }],
            chars: CharPools {
                male: vec![
                    WeightedChar::new('明', 8.0).with_strokes(8),
                    WeightedChar::new('宇', 6.0).with_strokes(6),
                ],
                female: vec![WeightedChar::new('婷', 7.0).with_strokes(12)],
                unisex: vec![
                    WeightedChar::new('安', 5.0)
                        .with_strokes(6)
                        .with_structure(Structure::TopBottom),
                    WeightedChar::new('明', 2.0),
                ],
            },
            bigrams: vec![
                Bigram::new('明', '安', 1.0),
                Bigram::new('明', '宇', 5.0),
                Bigram::new('宇', '明', -3.0),
            ],
        }
    }

    #[test]
    fn bigram_index_sorted_descending() {
        let idx = RegionIndex::build(Region::Cn, sample_data());
        let list = idx.bigrams_by_first('明');
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].second, '宇');
        assert_eq!(list[0].region, Some(Region::Cn));
        assert!(idx.bigrams_by_first('婷').is_empty());
    }

    #[test]
    fn negative_weights_clamped() {
        let idx = RegionIndex::build(Region::Cn, sample_data());
        assert_eq!(idx.bigrams_by_first('宇')[0].weight, 0.0);
    }

    #[test]
    fn unisex_folded_at_reduced_weight() {
        let idx = RegionIndex::build(Region::Cn, sample_data());
        let male = idx.pool(Gender::Male);
        let an = male.iter().find(|c| c.ch == '安').unwrap();
        assert!((an.weight - 5.0 * UNISEX_FOLD_WEIGHT).abs() < 1e-9);
        // 明 is already in the male pool; the unisex copy is not added twice.
        assert_eq!(male.iter().filter(|c| c.ch == '明').count(), 1);
        assert!(!male.iter().any(|c| c.ch == '婷'));

        let unisex = idx.pool(Gender::Unisex);
        let ting = unisex.iter().find(|c| c.ch == '婷').unwrap();
        assert!((ting.weight - 7.0 * GENDERED_FOLD_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn char_lookup_and_stats() {
        let idx = RegionIndex::build(Region::Cn, sample_data());
        assert_eq!(idx.char_info('明').unwrap().weight, 8.0);
        assert_eq!(idx.max_char_weight, 8.0);
        assert_eq!(idx.max_bigram_weight, 5.0);
        assert_eq!(idx.vocab_size, 4);
        assert_eq!(idx.surname_strokes("王"), Some(4));
    }

    #[test]
    fn homophone_syllable_match() {
        let lexicon = Lexicon::parse_ron(
            "{}",
            "{'史': \"shi3\", '珍': \"zhen1\", '香': \"xiang1\"}",
            "{}",
            "(general: [\"死\"], homophone: (substrings: [], syllables: [\"shi zhen\"]))",
        )
        .unwrap();
        assert!(lexicon.homophone_hit("史珍香", Phonology::Mandarin).is_some());
        assert!(lexicon.homophone_hit("史香", Phonology::Mandarin).is_none());
        assert_eq!(lexicon.general_blacklist_hit("王死"), Some("死"));
    }

    #[test]
    fn embedded_lexicon_parses() {
        let lexicon = Lexicon::embedded().unwrap();
        assert!(lexicon.mandarin.contains_key(&'明'));
        assert!(lexicon.cantonese.contains_key(&'明'));
        assert!(!lexicon.blacklist.is_empty());
    }
}
