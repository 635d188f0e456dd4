/// Semantic sub-scores: themes, style, tag synergy, five elements, zodiac
/// affinities, aesthetics, family conventions, numerology and learned
/// preferences.
use rustc_hash::FxHashSet;

use crate::core::cache::BoundedCache;
use crate::core::context::ScoringContext;
use crate::core::phonology;
use crate::schema::element::{branch_element, hour_branch, Element};
use crate::schema::result::SemanticParts;

const THEME_HIT: f64 = 0.5;
const STYLE_HIT: f64 = 0.3;
const SYNERGY_SCALE: f64 = 0.6;
const CONFLICT_PENALTY: f64 = 0.4;
const ELEMENT_TARGET_HIT: f64 = 0.6;
const ELEMENT_DISTINCT: f64 = 0.4;
const ELEMENT_GENERATING: f64 = 0.3;
const ELEMENT_OVERCOMING: f64 = 0.3;
const ZODIAC_SAME: f64 = 0.5;
const ZODIAC_NOURISHING: f64 = 0.25;
const WESTERN_HIT: f64 = 0.3;
const BIRTH_HOUR_HIT: f64 = 0.3;
const LITERARY_HIT: f64 = 0.25;
const AESTHETIC_LEVEL_TONE: f64 = 0.2;
const AESTHETIC_STRUCTURE: f64 = 0.2;
const GENERATION_HIT: f64 = 1.0;
const SIBLING_SCALE: f64 = 0.3;
const NUMEROLOGY_HIT: f64 = 0.1;
const LIKED_CHAR: f64 = 0.4;
const LIKED_PAIR: f64 = 0.8;

/// Stroke totals considered auspicious in the 81-number table.
const AUSPICIOUS: &[u32] = &[
    1, 3, 5, 6, 7, 8, 11, 13, 15, 16, 17, 18, 21, 23, 24, 25, 29, 31, 32, 33, 35, 37, 39, 41, 45,
    47, 48, 52, 57, 61, 63, 65, 67, 68, 81,
];

/// Memoised style and synergy scores, owned by the feature scorer. Keys
/// carry the region code since record tags differ per region.
#[derive(Debug, Clone)]
pub struct SemanticCaches {
    style: BoundedCache<String, f64>,
    synergy: BoundedCache<String, (f64, f64)>,
}

impl SemanticCaches {
    pub fn new(ceiling: usize) -> Self {
        Self {
            style: BoundedCache::new(ceiling),
            synergy: BoundedCache::new(ceiling),
        }
    }

    pub fn clear(&mut self) {
        self.style.clear();
        self.synergy.clear();
    }

    pub fn len(&self) -> usize {
        self.style.len() + self.synergy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every semantic part for one given name.
pub fn score_semantics(
    ctx: &ScoringContext<'_>,
    given: &str,
    caches: &mut SemanticCaches,
) -> SemanticParts {
    let chars: Vec<char> = given.chars().collect();
    let tags: Vec<FxHashSet<&str>> = chars.iter().map(|&c| ctx.tags(c)).collect();
    let elements: Vec<Option<Element>> = tags.iter().map(element_of).collect();

    let mut parts = SemanticParts {
        theme: theme_score(&ctx.theme, &tags),
        ..Default::default()
    };

    if !ctx.style.is_empty() {
        let key = format!(
            "{}\u{1f}{}\u{1f}{}",
            ctx.index.region.code(),
            ctx.style.join(","),
            given
        );
        parts.style = caches
            .style
            .get_or_insert_with(key, || hits(&ctx.style, &tags) as f64 * STYLE_HIT);
    }

    if tags.len() == 2 {
        let key = format!("{}\u{1f}{}", ctx.index.region.code(), given);
        let (synergy, conflict) = caches
            .synergy
            .get_or_insert_with(key, || synergy_score(&tags[0], &tags[1]));
        parts.synergy = synergy;
        parts.conflict = conflict;
    }

    parts.element = element_score(ctx, &elements);

    if let Some(zodiac) = ctx.request.chinese_zodiac {
        let home = zodiac.element();
        let nourishing = home.nourished_by();
        parts.chinese_zodiac = elements
            .iter()
            .map(|e| match e {
                Some(e) if *e == home => ZODIAC_SAME,
                Some(e) if *e == nourishing => ZODIAC_NOURISHING,
                _ => 0.0,
            })
            .sum();
    }

    if let Some(sign) = ctx.request.western_zodiac {
        let affinity = sign.affinity_tags();
        parts.western_zodiac = tags
            .iter()
            .filter(|t| affinity.iter().any(|a| t.contains(a)))
            .count() as f64
            * WESTERN_HIT;
    }

    if let Some(hour) = ctx.request.birth_hour {
        let wanted = branch_element(hour_branch(hour)).nourished_by();
        parts.birth_hour =
            elements.iter().filter(|e| **e == Some(wanted)).count() as f64 * BIRTH_HOUR_HIT;
    }

    if ctx.request.prefer_literary {
        parts.literary = tags
            .iter()
            .filter(|t| t.contains("literary") || t.contains("virtue"))
            .count() as f64
            * LITERARY_HIT;
    }

    if ctx.request.aesthetics {
        parts.aesthetics = aesthetics_score(ctx, &chars);
    }

    if let Some(gen) = ctx.request.generation_char {
        if chars.get(ctx.request.generation_position.index()) == Some(&gen) {
            parts.generation = GENERATION_HIT;
        }
    }

    if !ctx.siblings.is_empty() {
        let mine: FxHashSet<&str> = tags.iter().flatten().copied().collect();
        let mean = ctx
            .siblings
            .iter()
            .map(|s| jaccard(&mine, s))
            .sum::<f64>()
            / ctx.siblings.len() as f64;
        parts.siblings = SIBLING_SCALE * mean;
    }

    if ctx.request.numerology {
        parts.numerology = numerology_score(ctx, &chars);
    }

    parts.preference = preference_score(ctx, given, &chars);
    parts
}

/// First five-element tag a character carries.
pub fn element_of(tags: &FxHashSet<&str>) -> Option<Element> {
    Element::all().iter().copied().find(|e| tags.contains(e.tag()))
}

pub fn jaccard<T: Eq + std::hash::Hash>(a: &FxHashSet<T>, b: &FxHashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Number of characters carrying at least one of `wanted`.
fn hits(wanted: &[String], tags: &[FxHashSet<&str>]) -> usize {
    tags.iter()
        .filter(|t| wanted.iter().any(|w| t.contains(w.as_str())))
        .count()
}

fn theme_score(theme: &[String], tags: &[FxHashSet<&str>]) -> f64 {
    if theme.is_empty() {
        return 0.0;
    }
    hits(theme, tags) as f64 * THEME_HIT
}

fn synergy_score(a: &FxHashSet<&str>, b: &FxHashSet<&str>) -> (f64, f64) {
    let synergy = SYNERGY_SCALE * jaccard(a, b);
    let clash = (a.contains("soft") && b.contains("hard"))
        || (a.contains("hard") && b.contains("soft"));
    (synergy, if clash { -CONFLICT_PENALTY } else { 0.0 })
}

fn element_score(ctx: &ScoringContext<'_>, elements: &[Option<Element>]) -> f64 {
    if let Some(target) = ctx.request.element {
        return elements.iter().filter(|e| **e == Some(target)).count() as f64
            * ELEMENT_TARGET_HIT;
    }
    if !ctx.request.balance_elements {
        return 0.0;
    }
    let [Some(a), Some(b)] = elements else {
        return 0.0;
    };
    let mut score = 0.0;
    if a != b {
        score += ELEMENT_DISTINCT;
    }
    if a.generates() == *b || b.generates() == *a {
        score += ELEMENT_GENERATING;
    }
    if a.overcomes() == *b || b.overcomes() == *a {
        score -= ELEMENT_OVERCOMING;
    }
    score
}

fn aesthetics_score(ctx: &ScoringContext<'_>, chars: &[char]) -> f64 {
    let mut score = 0.0;
    if let Some(&last) = chars.last() {
        if phonology::is_level_tone(ctx.lexicon, ctx.phonology, last) {
            score += AESTHETIC_LEVEL_TONE;
        }
    }
    if let [a, b] = chars {
        let sa = ctx.char_info(*a).and_then(|c| c.structure);
        let sb = ctx.char_info(*b).and_then(|c| c.structure);
        if let (Some(sa), Some(sb)) = (sa, sb) {
            if sa != sb {
                score += AESTHETIC_STRUCTURE;
            }
        }
    }
    score
}

/// Reduce a stroke total onto the 1-81 table.
fn auspicious(total: u32) -> bool {
    let mut n = total;
    while n > 81 {
        n -= 80;
    }
    AUSPICIOUS.contains(&n)
}

/// Three talents / five grids. Surname strokes come from the region's
/// surname table; an unknown surname counts as zero strokes.
fn numerology_score(ctx: &ScoringContext<'_>, chars: &[char]) -> f64 {
    let surname = ctx.index.surname_strokes(ctx.surname).unwrap_or(0);
    let strokes: Vec<u32> = chars.iter().map(|&c| ctx.strokes(c).unwrap_or(0)).collect();
    let first = strokes.first().copied().unwrap_or(0);
    let given_total: u32 = strokes.iter().sum();

    let person = surname + first;
    let earth = if strokes.len() == 1 { first + 1 } else { given_total };
    let total = surname + given_total;

    [person, earth, total]
        .iter()
        .filter(|&&grid| grid > 0 && auspicious(grid))
        .count() as f64
        * NUMEROLOGY_HIT
}

fn preference_score(ctx: &ScoringContext<'_>, given: &str, chars: &[char]) -> f64 {
    let prefs = &ctx.request.preferences;
    let liked = chars.iter().filter(|c| ctx.liked_chars.contains(*c)).count();
    let mut score = liked as f64 * LIKED_CHAR;
    if prefs.liked_pairs.iter().any(|p| p == given) {
        score += LIKED_PAIR;
    }
    score
}
