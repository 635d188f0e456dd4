/// Output assembly: full name, romanisation, stroke totals, reasons and
/// the score breakdown.
use crate::core::context::ScoringContext;
use crate::core::lexicon::Lexicon;
use crate::core::scorer::{Candidate, FeatureScorer};
use crate::schema::lexicon::Phonology;
use crate::schema::result::{EffectiveParams, NameMeta, NameResult, ScoreBreakdown};

/// Single-character given names tried in order when no candidate
/// survives, with strokes for lexicons that lack a record.
pub const NEUTRAL_CHARS: &[(char, u32)] =
    &[('安', 6), ('宁', 5), ('和', 8), ('平', 5), ('康', 11), ('乐', 5)];
pub const FALLBACK_STRATEGY: &str = "fallback";

/// Romanise `text` syllable by syllable: tone-marked pinyin for Mandarin,
/// jyutping with tone digits for Cantonese. Characters missing from the
/// table are emitted as-is.
pub fn romanize(lexicon: &Lexicon, phonology: Phonology, text: &str) -> String {
    text.chars()
        .map(|ch| {
            let syllable = match phonology {
                Phonology::Mandarin => lexicon.mandarin.get(&ch).map(|e| e.marked()),
                Phonology::Cantonese => lexicon.cantonese.get(&ch).map(|e| e.numbered()),
            };
            syllable.unwrap_or_else(|| ch.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The first neutral character no hard constraint rejects. When every one
/// is rejected the first is returned anyway and the reasons say so.
pub fn fallback_candidate(ctx: &ScoringContext<'_>, scorer: &FeatureScorer) -> Candidate {
    let mut reasons = vec!["no candidate met every constraint".to_string()];
    let (ch, strokes) = match NEUTRAL_CHARS
        .iter()
        .find(|(ch, _)| scorer.rejection(ctx, &ch.to_string()).is_none())
    {
        Some(&found) => found,
        None => {
            reasons.push("every neutral fallback is blocked".to_string());
            NEUTRAL_CHARS[0]
        }
    };
    Candidate {
        given_name: ch.to_string(),
        strokes: vec![ctx.strokes(ch).unwrap_or(strokes)],
        breakdown: ScoreBreakdown::default(),
        total: 0.0,
        reasons,
    }
}

pub fn format_result(
    ctx: &ScoringContext<'_>,
    candidate: &Candidate,
    strategy: &str,
    params: EffectiveParams,
) -> NameResult {
    let full_name = format!("{}{}", ctx.surname, candidate.given_name);
    let total_strokes = ctx
        .index
        .surname_strokes(ctx.surname)
        .filter(|_| candidate.strokes.iter().all(|&s| s > 0))
        .map(|s| s + candidate.strokes.iter().sum::<u32>());

    NameResult {
        full_name: full_name.clone(),
        surname: ctx.surname.to_string(),
        given_name: candidate.given_name.clone(),
        total_strokes,
        meta: NameMeta {
            region: ctx.index.region,
            gender: ctx.request.gender,
            score: candidate.total,
            strokes: candidate.strokes.clone(),
            parts: candidate.breakdown,
            reasons: candidate.reasons.clone(),
            romanization: romanize(ctx.lexicon, ctx.phonology, &full_name),
            strategy: strategy.to_string(),
            params,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lexicon::RegionIndex;
    use crate::schema::lexicon::{CharPools, Region, RegionData, WeightedChar, WeightedSurname};
    use crate::schema::request::{FeatureWeights, NameRequest, PenaltyWeights};

    fn lexicon() -> Lexicon {
        Lexicon::parse_ron(
            "{}",
            r#"{'王': "wang2", '明': "ming2", '宇': "yu3"}"#,
            r#"{'王': "wong4", '明': "ming4", '宇': "jyu5"}"#,
            "(general: [])",
        )
        .unwrap()
    }

    fn params() -> EffectiveParams {
        EffectiveParams {
            seed: "1".to_string(),
            mode: "max".to_string(),
            trials: 120,
            beam_size: 6,
            temperature: 0.8,
            top_k: 8,
            top_p: 0.9,
            weights: FeatureWeights::default(),
            penalties: PenaltyWeights::default(),
            pool_size: 1,
        }
    }

    #[test]
    fn romanization_per_phonology() {
        let lexicon = lexicon();
        assert_eq!(romanize(&lexicon, Phonology::Mandarin, "王明宇"), "wáng míng yǔ");
        assert_eq!(romanize(&lexicon, Phonology::Cantonese, "王明宇"), "wong4 ming4 jyu5");
        assert_eq!(romanize(&lexicon, Phonology::Mandarin, "王龘"), "wáng 龘");
    }

    #[test]
    fn result_fields() {
        let lexicon = lexicon();
        let index = RegionIndex::build(
            Region::Hk,
            RegionData {
                surnames: vec![WeightedSurname {
                    surname: "王".to_string(),
                    weight: 1.0,
                    strokes: Some(4),
                }],
                chars: CharPools {
                    male: vec![
                        WeightedChar::new('明', 1.0).with_strokes(8),
                        WeightedChar::new('宇', 1.0).with_strokes(6),
                    ],
                    ..Default::default()
                },
                bigrams: Vec::new(),
            },
        );
        let request = NameRequest::default();
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "王");
        let candidate = Candidate {
            given_name: "明宇".to_string(),
            strokes: vec![8, 6],
            breakdown: ScoreBreakdown::default(),
            total: 1.5,
            reasons: vec!["ok".to_string()],
        };
        let result = format_result(&ctx, &candidate, "max", params());
        assert_eq!(result.full_name, "王明宇");
        assert_eq!(result.total_strokes, Some(18));
        assert_eq!(result.meta.romanization, "wong4 ming4 jyu5");
        assert_eq!(result.meta.strategy, "max");
        assert_eq!(result.meta.score, 1.5);

        let fallback = fallback_candidate(&ctx, &FeatureScorer::new(8));
        let result = format_result(&ctx, &fallback, FALLBACK_STRATEGY, params());
        assert_eq!(result.given_name, "安");
        assert_eq!(result.meta.strategy, "fallback");
    }

    #[test]
    fn fallback_skips_rejected_neutral_chars() {
        let lexicon = lexicon();
        let index = RegionIndex::build(Region::Cn, RegionData::default());
        let scorer = FeatureScorer::new(8);
        let mut request = NameRequest {
            extra_blacklist: vec!["宁".to_string()],
            ..Default::default()
        };
        request.preferences.blocked_chars.push('安');
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "李");

        let fallback = fallback_candidate(&ctx, &scorer);
        assert_eq!(fallback.given_name, "和");
        assert_eq!(fallback.strokes, vec![8]);
        assert!(scorer.rejection(&ctx, &fallback.given_name).is_none());

        let mut request = request.clone();
        request
            .preferences
            .blocked_chars
            .extend(NEUTRAL_CHARS.iter().map(|(ch, _)| *ch));
        let ctx = ScoringContext::new(&lexicon, &index, Vec::new(), &request, "李");
        let fallback = fallback_candidate(&ctx, &scorer);
        assert_eq!(fallback.given_name, "安");
        assert_eq!(fallback.reasons.len(), 2);
    }
}
