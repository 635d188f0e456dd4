/// Scoring context — everything the scorer needs to know about one
/// request, resolved once before candidates are generated.
use rustc_hash::FxHashSet;

use crate::core::bigram::AdjacencyQuery;
use crate::core::lexicon::{Lexicon, RegionIndex};
use crate::schema::lexicon::{Phonology, WeightedChar};
use crate::schema::request::NameRequest;

pub struct ScoringContext<'a> {
    pub lexicon: &'a Lexicon,
    pub index: &'a RegionIndex,
    /// Every other region, consulted when `cross_region_mix > 0`.
    pub others: Vec<&'a RegionIndex>,
    pub request: &'a NameRequest,
    pub surname: &'a str,
    pub phonology: Phonology,
    pub theme: Vec<String>,
    pub style: Vec<String>,
    /// Tag sets of each sibling's given name.
    pub siblings: Vec<FxHashSet<&'a str>>,
    pub blocked_chars: FxHashSet<char>,
    pub liked_chars: FxHashSet<char>,
}

impl<'a> ScoringContext<'a> {
    pub fn new(
        lexicon: &'a Lexicon,
        index: &'a RegionIndex,
        others: Vec<&'a RegionIndex>,
        request: &'a NameRequest,
        surname: &'a str,
    ) -> Self {
        let siblings = request
            .sibling_names
            .iter()
            .map(|name| {
                let given = name.strip_prefix(surname).unwrap_or(name);
                let mut tags = FxHashSet::default();
                for ch in given.chars() {
                    tags.extend(lexicon.tags_for(ch, index.char_info(ch)));
                }
                tags
            })
            .filter(|tags| !tags.is_empty())
            .collect();

        Self {
            lexicon,
            index,
            others,
            request,
            surname,
            phonology: index.region.phonology(),
            theme: tokens(request.theme.as_deref()),
            style: tokens(request.style.as_deref()),
            siblings,
            blocked_chars: request.preferences.blocked_chars.iter().copied().collect(),
            liked_chars: request.preferences.liked_chars.iter().copied().collect(),
        }
    }

    pub fn char_info(&self, ch: char) -> Option<&'a WeightedChar> {
        self.index.char_info(ch)
    }

    /// Shared dictionary tags merged with the region record's own tags.
    pub fn tags(&self, ch: char) -> FxHashSet<&'a str> {
        self.lexicon.tags_for(ch, self.index.char_info(ch))
    }

    pub fn strokes(&self, ch: char) -> Option<u32> {
        self.char_info(ch).and_then(|c| c.strokes)
    }

    pub fn adjacency_query(&self) -> AdjacencyQuery<'a> {
        AdjacencyQuery {
            gender: self.request.gender,
            era: self.request.era.as_deref(),
        }
    }
}

/// Split a free-text theme or style into lowercase tag tokens.
fn tokens(text: Option<&str>) -> Vec<String> {
    text.map(|t| {
        t.split(|c: char| c.is_whitespace() || matches!(c, ',' | '，' | '、' | '/'))
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::lexicon::{CharPools, Region, RegionData};

    #[test]
    fn theme_tokens_split_on_separators() {
        assert_eq!(tokens(Some("Virtue, nature、sky")), vec!["virtue", "nature", "sky"]);
        assert!(tokens(None).is_empty());
    }

    #[test]
    fn sibling_tags_strip_surname() {
        let lexicon = Lexicon::parse_ron(
            "{'明': [\"bright\"], '林': [\"forest\"], '王': [\"royal\"]}",
            "{}",
            "{}",
            "(general: [])",
        )
        .unwrap();
        let index = RegionIndex::build(
            Region::Cn,
            RegionData {
                chars: CharPools {
                    male: vec![WeightedChar::new('明', 1.0).with_tags(&["wisdom"])],
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        let request = NameRequest {
            sibling_names: vec!["王明林".to_string(), "".to_string()],
            ..Default::default()
        };
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "王");
        assert_eq!(ctx.siblings.len(), 1);
        let tags = &ctx.siblings[0];
        assert!(tags.contains("bright") && tags.contains("wisdom") && tags.contains("forest"));
        assert!(!tags.contains("royal"));
    }
}
