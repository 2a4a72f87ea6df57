//! Multi-language dispatch: primary + sub-language retry, engine selection,
//! and x-height re-fit.
//!
//! Reference upstream implementation: `src/ccmain/control.cpp`'s
//! `Tesseract::classify_word_and_language` /
//! `Tesseract::retry_with_language` (the "new is chosen over current"
//! comparison) and the same file's x-height misfit-count convergence loop
//! (around the `kMinRefitXHeightFraction` threshold).

use crate::classifier::{ClassifyWordOutput, LegacyClassifier, SequenceRecognizer};
use crate::config::{DispatchMode, RecognitionConfig};
use crate::dictionary::DictionaryOracle;
use crate::ids::LanguageId;
use crate::pass_context::PassContext;
use crate::word::{BestChoice, PermuterTag, WordResult};

/// Aggregate stats over a span of (possibly several) words, used by the
/// `prefer_new_candidate` comparison.
#[derive(Debug, Clone, Copy)]
struct SpanStats {
    rating: f32,
    certainty: f32,
    valid: bool,
    bad: bool,
}

fn span_stats(words: &[WordResult]) -> SpanStats {
    if words.is_empty() || words.iter().any(|w| w.best_choice.is_empty()) {
        return SpanStats {
            rating: f32::INFINITY,
            certainty: f32::NEG_INFINITY,
            valid: false,
            bad: true,
        };
    }
    let rating: f32 = words.iter().map(|w| w.best_choice.total_rating()).sum();
    let certainty = words
        .iter()
        .map(|w| w.best_choice.min_certainty())
        .fold(f32::INFINITY, f32::min);
    let valid = words.iter().all(|w| w.best_choice.is_dictionary_class());
    SpanStats {
        rating,
        certainty,
        valid,
        bad: false,
    }
}

/// Selection rule between the current best span and a new candidate span.
/// Returns true when `new` should replace `current`.
fn prefer_new_candidate(new: &[WordResult], current: &[WordResult], cfg: &RecognitionConfig) -> bool {
    let n = span_stats(new);
    let b = span_stats(current);
    if n.bad {
        return false;
    }
    if b.bad {
        return true;
    }
    if n.certainty > b.certainty && n.rating < b.rating {
        return true;
    }
    if !b.valid && n.valid && n.rating < b.rating * cfg.rating_ratio && n.certainty > b.certainty - cfg.certainty_margin {
        return true;
    }
    false
}

/// Mirrors upstream `retry_with_language`: run one engine, merge its output
/// into `best_words`. Returns `new_words_kept - old_words_dropped`, i.e. the
/// net change in word count (positive when the new candidate split into
/// more words than it replaced).
pub fn retry_with_language(
    candidate: Vec<WordResult>,
    best_words: &mut Vec<WordResult>,
    cfg: &RecognitionConfig,
) -> i64 {
    if best_words.is_empty() || prefer_new_candidate(&candidate, best_words, cfg) {
        let old_len = best_words.len() as i64;
        let new_len = candidate.len() as i64;
        *best_words = candidate;
        new_len - old_len
    } else {
        0
    }
}

/// A word is "acceptable" for the purposes of the retry-order rule below.
fn words_acceptable(words: &[WordResult]) -> bool {
    !words.is_empty() && words.iter().all(|w| w.flags.tess_accepted && !w.flags.tess_failed)
}

/// Dispatches one engine according to `cfg.dispatch_mode`. Returns the
/// classified word(s) for this
/// engine only; retry-order composition happens in
/// `classify_word_and_language`.
fn dispatch_engine(
    word: &WordResult,
    legacy: &dyn LegacyClassifier,
    sequence: &dyn SequenceRecognizer,
    cfg: &RecognitionConfig,
    space_unichar: crate::ids::UnicharId,
) -> Vec<WordResult> {
    match cfg.dispatch_mode {
        DispatchMode::LegacyOnly => vec![apply_legacy(word, legacy)],
        DispatchMode::SequenceOnly => {
            let seq_words = sequence.recognize_line(word, 0.5, 0.0, false);
            if seq_words.is_empty() {
                let mut fake = word.clone();
                fake.make_fake(space_unichar);
                vec![fake]
            } else {
                seq_words.into_iter().map(|s| apply_sequence(word, s)).collect()
            }
        }
        DispatchMode::Combined => {
            if word.flags.odd_size {
                vec![apply_legacy(word, legacy)]
            } else {
                let seq_words = sequence.recognize_line(word, 0.5, 0.0, false);
                if seq_words.is_empty() {
                    vec![apply_legacy(word, legacy)]
                } else {
                    seq_words.into_iter().map(|s| apply_sequence(word, s)).collect()
                }
            }
        }
    }
}

fn apply_legacy(word: &WordResult, legacy: &dyn LegacyClassifier) -> WordResult {
    let ClassifyWordOutput {
        best_choice,
        alternates,
        ratings,
        tess_accepted,
        tess_would_adapt,
    } = legacy.classify_word(word);
    let mut out = word.clone();
    out.reject_map = crate::reject::RejectMap::new(best_choice.len());
    out.best_choice = best_choice;
    out.alternates = alternates;
    out.ratings = ratings;
    out.flags.tess_accepted = tess_accepted;
    out.flags.tess_would_adapt = tess_would_adapt;
    out.flags.tess_failed = out.best_choice.is_empty();
    out
}

fn apply_sequence(word: &WordResult, seq: crate::classifier::SequenceWord) -> WordResult {
    let mut out = word.clone();
    let mut best_choice = seq.best_choice;
    for c in best_choice.certainties.iter_mut() {
        *c *= crate::classifier::SEQUENCE_CERTAINTY_SCALE;
    }
    out.reject_map = crate::reject::RejectMap::new(best_choice.len());
    out.flags.tess_accepted = !best_choice.is_empty();
    out.flags.tess_failed = best_choice.is_empty();
    out.best_choice = best_choice;
    out.alternates = seq.alternates;
    out
}

/// Mirrors upstream `classify_word_and_language`: try the primary (MRU)
/// engine first, then (if not all resulting words are acceptable) the main
/// language, then each sub-language, keeping the best span found.
pub fn classify_word_and_language(
    word: &WordResult,
    languages: &[LanguageId],
    legacy: &dyn LegacyClassifier,
    sequence: &dyn SequenceRecognizer,
    dict: &mut dyn DictionaryOracle,
    ctx: &mut PassContext,
    cfg: &RecognitionConfig,
    space_unichar: crate::ids::UnicharId,
) -> Vec<WordResult> {
    let mut try_order = vec![ctx.mru_language];
    for &lang in languages {
        if lang != ctx.mru_language {
            try_order.push(lang);
        }
    }

    let mut best_words: Vec<WordResult> = Vec::new();
    for lang in try_order {
        let mut candidate = dispatch_engine(word, legacy, sequence, cfg, space_unichar);
        for w in candidate.iter_mut() {
            w.language = lang;
        }
        retry_with_language(candidate.clone(), &mut best_words, cfg);
        candidate.clear();
        if words_acceptable(&best_words) {
            ctx.mru_language = lang;
            break;
        }
    }

    for w in best_words.iter_mut() {
        if w.flags.tess_would_adapt
            && !w.best_choice.dangerous_ambig
            && w.best_choice.is_dictionary_class()
        {
            dict.add_document_word(&w.best_choice.unichars);
        }
    }

    best_words
}

/// X-height re-fit result: a glyph-top misfit count and the proposed
/// correction.
#[derive(Debug, Clone, Copy)]
pub struct XHeightRefit {
    pub new_x_height: f32,
    pub baseline_shift: f32,
    pub misfit_count: usize,
}

/// Count how many of a word's per-character glyph tops fall outside the
/// language's expected top/bottom envelope for the given x-height.
pub fn count_misfits(glyph_tops: &[f32], x_height: f32, baseline: f32) -> usize {
    let top_envelope = baseline + x_height * 1.1;
    let bottom_envelope = baseline - x_height * 0.3;
    glyph_tops
        .iter()
        .filter(|&&top| top > top_envelope || top < bottom_envelope)
        .count()
}

/// Search for a compatible x-height/baseline-shift pair that reduces
/// misfits, honoring the `min_refit_xht_fraction` floor.
pub fn fit_x_height(
    glyph_tops: &[f32],
    current_x_height: f32,
    baseline: f32,
    cfg: &RecognitionConfig,
) -> Option<XHeightRefit> {
    let baseline_misfits = count_misfits(glyph_tops, current_x_height, baseline);
    if baseline_misfits == 0 {
        return None;
    }

    let floor = cfg.min_refit_xht_fraction * current_x_height;
    let mut best: Option<XHeightRefit> = None;
    // Sample candidate x-heights down to the permitted floor.
    let mut candidate_xht = current_x_height;
    while candidate_xht >= floor {
        for shift_steps in -3..=3 {
            let shift = shift_steps as f32 * (current_x_height * 0.02);
            let misfits = count_misfits(glyph_tops, candidate_xht, baseline + shift);
            if misfits < best.map(|b| b.misfit_count).unwrap_or(baseline_misfits) {
                best = Some(XHeightRefit {
                    new_x_height: candidate_xht,
                    baseline_shift: shift,
                    misfit_count: misfits,
                });
            }
        }
        candidate_xht -= current_x_height * 0.05;
    }
    best.filter(|b| b.misfit_count < baseline_misfits)
}

/// Accept a re-fit result only when the misfit count strictly decreased and
/// certainty or rating improved.
pub fn accept_refit(
    old: &BestChoice,
    new: &BestChoice,
    old_misfits: usize,
    new_misfits: usize,
) -> bool {
    new_misfits < old_misfits
        && (new.min_certainty() > old.min_certainty() || new.total_rating() < old.total_rating())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::UnicharId;

    fn bc(unichars: Vec<u32>, rating: f32, certainty: f32) -> BestChoice {
        let n = unichars.len();
        let mut b = BestChoice::new(
            unichars.into_iter().map(UnicharId).collect(),
            vec![rating / n.max(1) as f32; n],
            vec![certainty; n],
        );
        b.permuter = Some(PermuterTag::SystemDawg);
        b
    }

    fn word_with(best: BestChoice, accepted: bool) -> WordResult {
        let mut w = WordResult::new(
            crate::word::Blob {
                x0: 0.0,
                x1: 10.0,
                y0: 0.0,
                y1: 10.0,
            },
            0.0,
            10.0,
            vec![],
        );
        w.reject_map = crate::reject::RejectMap::new(best.len());
        w.flags.tess_accepted = accepted;
        w.best_choice = best;
        w
    }

    #[test]
    fn bad_new_candidate_never_wins() {
        let cfg = RecognitionConfig::default();
        let current = vec![word_with(bc(vec![1, 2], 2.0, 1.0), true)];
        let bad_new = vec![word_with(BestChoice::default(), false)];
        assert!(!prefer_new_candidate(&bad_new, &current, &cfg));
    }

    #[test]
    fn better_certainty_and_rating_wins() {
        let cfg = RecognitionConfig::default();
        let current = vec![word_with(bc(vec![1, 2], 4.0, 1.0), true)];
        let better = vec![word_with(bc(vec![1, 2], 2.0, 2.0), true)];
        assert!(prefer_new_candidate(&better, &current, &cfg));
    }

    #[test]
    fn dictionary_valid_candidate_beats_invalid_within_margin() {
        let cfg = RecognitionConfig::default();
        let mut invalid = bc(vec![1, 2], 2.0, 1.0);
        invalid.permuter = Some(PermuterTag::NoPerm);
        let current = vec![word_with(invalid, true)];
        let valid = vec![word_with(bc(vec![1, 2], 2.5, 1.0), true)];
        assert!(prefer_new_candidate(&valid, &current, &cfg));
    }

    #[test]
    fn x_height_refit_reduces_misfits() {
        let cfg = RecognitionConfig::default();
        // Two glyph tops within envelope, two far above it at x_height=10.
        let tops = vec![10.5, 10.0, 20.0, 21.0];
        let refit = fit_x_height(&tops, 10.0, 0.0, &cfg);
        assert!(refit.is_some());
        let refit = refit.unwrap();
        assert!(refit.misfit_count < count_misfits(&tops, 10.0, 0.0));
        assert!(refit.new_x_height >= cfg.min_refit_xht_fraction * 10.0);
    }

    #[test]
    fn accept_refit_requires_strict_misfit_decrease_and_improvement() {
        let old = bc(vec![1], 5.0, 1.0);
        let new = bc(vec![1], 4.0, 1.0);
        assert!(accept_refit(&old, &new, 4, 0));
        assert!(!accept_refit(&old, &new, 4, 4));
    }
}
