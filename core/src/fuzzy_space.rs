//! Fuzzy-Space Resolver: permutes ambiguous inter-word gaps to find the
//! word-boundary arrangement that best agrees with the dictionary.
//!
//! Reference upstream implementation: `ccmain/fixspace.cpp`'s
//! `fix_fuzzy_spaces`/`fix_fuzzy_space_list`/`eval_word_spacing`/
//! `fix_sp_fp_word`. Grounded in the teacher's `CandidateList` pagination
//! idiom (`candidate.rs`) for "keep the best scored alternative seen so
//! far" bookkeeping.

use crate::classifier::LegacyClassifier;
use crate::config::RecognitionConfig;
use crate::ids::UnicharId;
use crate::page::{Block, PageResult};
use crate::unichar::UnicharRepertoire;
use crate::word::{Blob, WordResult};

const ONE_IL_CONFLICT_CHARS: &[char] = &['1', 'I', 'l', '[', ']'];

/// Mirrors upstream `fixspace_thinks_word_done`.
pub fn fixspace_thinks_word_done(
    w: &WordResult,
    cfg: &RecognitionConfig,
    is_space: impl Fn(UnicharId) -> bool,
) -> bool {
    if w.flags.done {
        return true;
    }
    if cfg.fixspace_mode < 1 {
        return false;
    }
    if !w.best_choice.is_dictionary_class() {
        return false;
    }
    if !w.contains_no_space(is_space) {
        return false;
    }
    w.flags.tess_accepted
        || (cfg.fixspace_mode >= 2 && w.reject_map.reject_count() == 0)
        || cfg.fixspace_mode == 3
}

fn last_char(u: &UnicharRepertoireRef<'_>, w: &WordResult) -> Option<char> {
    w.best_choice
        .unichars
        .last()
        .map(|&id| u.text_for(id))
        .and_then(|s| s.chars().last())
}

fn first_char(u: &UnicharRepertoireRef<'_>, w: &WordResult) -> Option<char> {
    w.best_choice
        .unichars
        .first()
        .map(|&id| u.text_for(id))
        .and_then(|s| s.chars().next())
}

/// A thin wrapper letting us pass `&dyn UnicharRepertoire` around without
/// naming the trait object type everywhere.
pub struct UnicharRepertoireRef<'a>(pub &'a dyn UnicharRepertoire);

impl<'a> UnicharRepertoireRef<'a> {
    fn text_for(&self, id: UnicharId) -> &str {
        self.0.text_for(id)
    }
}

/// Mirrors upstream `eval_word_spacing`. `PERFECT_WERDS` (999, configurable)
/// is returned when every word in `run` is "done".
pub fn eval_word_spacing(
    run: &[WordResult],
    cfg: &RecognitionConfig,
    unicharset: &UnicharRepertoireRef<'_>,
    is_space: impl Fn(UnicharId) -> bool + Copy,
) -> i32 {
    let mut score = 0i32;
    let mut all_done = true;

    for (i, w) in run.iter().enumerate() {
        let done = fixspace_thinks_word_done(w, cfg, is_space);
        if !done {
            all_done = false;
            continue;
        }
        let mut credit = w.best_choice.len() as i32;

        // Suppression: digit-ending word followed by a 1-conflict-starting
        // word, or vice versa, is not credited.
        if let Some(next) = run.get(i + 1) {
            let ends_digit = last_char(unicharset, w).is_some_and(|c| c.is_ascii_digit());
            let next_starts_conflict =
                first_char(unicharset, next).is_some_and(|c| ONE_IL_CONFLICT_CHARS.contains(&c));
            let ends_conflict =
                last_char(unicharset, w).is_some_and(|c| ONE_IL_CONFLICT_CHARS.contains(&c));
            let next_starts_digit = first_char(unicharset, next).is_some_and(|c| c.is_ascii_digit());
            if (ends_digit && next_starts_conflict) || (ends_conflict && next_starts_digit) {
                credit = 0;
            }
        }
        score += credit;
    }

    if all_done {
        return cfg.perfect_werds_score;
    }

    // Bonus: adjacent "1" pairs, intra- or inter-word.
    let flat: Vec<char> = run
        .iter()
        .flat_map(|w| {
            w.best_choice
                .unichars
                .iter()
                .map(|&id| unicharset.text_for(id).chars().next().unwrap_or('\0'))
        })
        .collect();
    for pair in flat.windows(2) {
        if pair[0] == '1' && pair[1] == '1' {
            score += 1;
        }
        if cfg.credit_punctuation_pairs && is_punctuation_pair(pair[0], pair[1]) {
            score += 1;
        }
    }

    score
}

fn is_punctuation_pair(a: char, b: char) -> bool {
    const SET: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"'];
    SET.contains(&a) && SET.contains(&b)
}

/// Classify any word in `current` lacking a best choice.
fn match_current_words(current: &mut [WordResult], legacy: &dyn LegacyClassifier) {
    for w in current.iter_mut() {
        if w.best_choice.is_empty() {
            let out = legacy.classify_word(w);
            w.best_choice = out.best_choice;
            w.alternates = out.alternates;
            w.ratings = out.ratings;
            w.flags.tess_accepted = out.tess_accepted;
            w.reject_map = crate::reject::RejectMap::new(w.best_choice.len());
        }
    }
}

/// Merge the smallest-gap word pairs into `combination` words. Returns
/// false (terminate) when no gaps remain.
fn transform_to_next_perm(current: &mut Vec<WordResult>) -> bool {
    if current.len() < 2 {
        return false;
    }
    let mut gaps: Vec<f32> = Vec::with_capacity(current.len() - 1);
    for pair in current.windows(2) {
        gaps.push(pair[1].bbox.x0 - pair[0].bbox.x1);
    }
    let min_gap = gaps.iter().copied().fold(f32::INFINITY, f32::min);
    if !min_gap.is_finite() {
        return false;
    }

    let mut merged = Vec::with_capacity(current.len());
    let mut i = 0;
    while i < current.len() {
        if i + 1 < current.len() && (gaps[i] - min_gap).abs() < f32::EPSILON {
            let a = current[i].clone();
            let b = current[i + 1].clone();
            merged.push(combine_words(a, b));
            i += 2;
        } else {
            merged.push(current[i].clone());
            i += 1;
        }
    }
    *current = merged;
    true
}

/// Build a `combination` word spanning `a` and `b`. The returned word owns deep copies
/// of both sources in `combo_sources`; the caller is responsible for also
/// keeping (separately flagged) copies of the sources in the row structure
/// so the page can still iterate over them.
fn combine_words(a: WordResult, b: WordResult) -> WordResult {
    let mut src_a = a.deep_copy();
    src_a.flags.part_of_combo = true;
    let mut src_b = b.deep_copy();
    src_b.flags.part_of_combo = true;

    let mut combo = a;
    combo.bbox.x1 = combo.bbox.x1.max(b.bbox.x1);
    combo.bbox.y0 = combo.bbox.y0.min(b.bbox.y0);
    combo.bbox.y1 = combo.bbox.y1.max(b.bbox.y1);
    combo.chopped_blobs.extend(b.chopped_blobs);
    combo.original_blobs.extend(b.original_blobs);
    combo.best_choice = crate::word::BestChoice::default();
    combo.alternates.clear();
    combo.reject_map = crate::reject::RejectMap::new(0);
    combo.flags.combination = true;
    combo.flags.part_of_combo = false;
    combo.flags.done = false;
    combo.combo_sources = vec![src_a, src_b];
    combo
}

/// Expand a search result list back into row storage: every combination
/// word's owned sources are also inserted, flagged `part_of_combo`, right
/// after it, so the page structure keeps them for iteration even though
/// output consumers skip them.
fn expand_for_row(words: Vec<WordResult>) -> Vec<WordResult> {
    let mut out = Vec::with_capacity(words.len());
    for w in words {
        let sources = w.combo_sources.clone();
        out.push(w);
        out.extend(sources);
    }
    out
}

/// The fuzzy-space search algorithm for one run.
pub fn fix_fuzzy_space_list(
    run: &[WordResult],
    legacy: &dyn LegacyClassifier,
    cfg: &RecognitionConfig,
    unicharset: &UnicharRepertoireRef<'_>,
    is_space: impl Fn(UnicharId) -> bool + Copy,
) -> Vec<WordResult> {
    let initial_score = eval_word_spacing(run, cfg, unicharset, is_space);
    if initial_score == cfg.perfect_werds_score {
        return run.to_vec();
    }

    let mut current: Vec<WordResult> = run
        .iter()
        .map(|w| {
            let mut c = w.deep_copy();
            c.flags.combination = false;
            c
        })
        .collect();
    let mut best = run.to_vec();
    let mut best_score = initial_score;

    loop {
        if current.is_empty() {
            break;
        }
        match_current_words(&mut current, legacy);
        let score = eval_word_spacing(&current, cfg, unicharset, is_space);
        if score > best_score {
            best_score = score;
            best = current.clone();
        }
        if score == cfg.perfect_werds_score {
            break;
        }
        if !transform_to_next_perm(&mut current) {
            break;
        }
    }

    best
}

/// Mirrors upstream `fix_fuzzy_spaces`: walk the page, extract maximal runs of
/// words connected by `fuzzy_space_right`, optimize each, and splice the
/// result back into its row.
pub fn fix_fuzzy_spaces(
    page: &mut PageResult,
    legacy: &dyn LegacyClassifier,
    cfg: &RecognitionConfig,
    unicharset: &UnicharRepertoireRef<'_>,
    is_space: impl Fn(UnicharId) -> bool + Copy,
) {
    for block in &mut page.blocks {
        fix_fuzzy_spaces_block(block, legacy, cfg, unicharset, is_space);
    }
}

fn fix_fuzzy_spaces_block(
    block: &mut Block,
    legacy: &dyn LegacyClassifier,
    cfg: &RecognitionConfig,
    unicharset: &UnicharRepertoireRef<'_>,
    is_space: impl Fn(UnicharId) -> bool + Copy,
) {
    for row in &mut block.rows {
        // Sources kept around from an earlier merge (`part_of_combo`) are
        // not live row positions any more; re-derive the row purely from
        // the still-active words so a second call is a no-op.
        let active: Vec<WordResult> = row
            .words
            .iter()
            .filter(|w| !w.flags.part_of_combo)
            .cloned()
            .collect();
        if active.is_empty() {
            continue;
        }

        let mut result = Vec::with_capacity(active.len());
        let mut run_start = 0;
        let mut i = 0;
        while i < active.len() {
            let connects_next = active[i].flags.fuzzy_space_right && i + 1 < active.len();
            if !connects_next {
                let run = &active[run_start..=i];
                if run.len() > 1 {
                    result.extend(fix_fuzzy_space_list(run, legacy, cfg, unicharset, is_space));
                } else {
                    result.push(run[0].clone());
                }
                run_start = i + 1;
            }
            i += 1;
        }
        row.words = expand_for_row(result);
    }
}

/// A noise-likelihood score for a blob: small outlines far from the
/// baseline score low. Lower is noisier.
fn blob_noise_score(blob: &Blob, baseline: f32, x_height: f32) -> f32 {
    let size = blob.width().min(blob.height());
    let dist_above = (blob.y1 - (baseline + x_height)).max(0.0);
    let dist_below = (baseline - blob.y0).max(0.0);
    size - (dist_above + dist_below)
}

/// Mirrors upstream `fix_sp_fp_word`: for fixed-pitch input, try splitting one
/// word at its worst noise blob. Returns `None` when the split is refused
/// by the guard conditions or does not improve the spacing score.
pub fn fix_sp_fp_word(
    word: &WordResult,
    cfg: &RecognitionConfig,
    legacy: &dyn LegacyClassifier,
    unicharset: &UnicharRepertoireRef<'_>,
    is_space: impl Fn(UnicharId) -> bool + Copy,
) -> Option<(WordResult, WordResult)> {
    if word.chopped_blobs.len() < 5 {
        return None;
    }
    if word.flags.repeat_char {
        return None;
    }

    let (worst_idx, worst_score) = word
        .chopped_blobs
        .iter()
        .enumerate()
        .map(|(i, b)| (i, blob_noise_score(b, word.baseline, word.x_height)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())?;

    if worst_idx < cfg.non_noise_limit
        || worst_idx + cfg.non_noise_limit >= word.chopped_blobs.len()
    {
        return None;
    }
    let _ = worst_score;
    if word.chopped_blobs[worst_idx].width().min(word.chopped_blobs[worst_idx].height())
        > cfg.small_outline * word.x_height
    {
        return None;
    }

    let split_x = word.chopped_blobs[worst_idx].x_mid();
    let mut left_blobs: Vec<Blob> = word.chopped_blobs[..worst_idx].to_vec();
    let mut right_blobs: Vec<Blob> = word.chopped_blobs[worst_idx + 1..].to_vec();
    if left_blobs.is_empty() || right_blobs.is_empty() {
        return None;
    }
    left_blobs.retain(|b| b.x_mid() < split_x);
    right_blobs.retain(|b| b.x_mid() >= split_x);

    let left_bbox = Blob {
        x0: word.bbox.x0,
        x1: split_x,
        y0: word.bbox.y0,
        y1: word.bbox.y1,
    };
    let right_bbox = Blob {
        x0: split_x,
        x1: word.bbox.x1,
        y0: word.bbox.y0,
        y1: word.bbox.y1,
    };
    let left = WordResult::new(left_bbox, word.baseline, word.x_height, left_blobs);
    let right = WordResult::new(right_bbox, word.baseline, word.x_height, right_blobs);

    let original_score = eval_word_spacing(
        std::slice::from_ref(word),
        cfg,
        unicharset,
        is_space,
    );
    let mut split_run = vec![left, right];
    match_current_words(&mut split_run, legacy);
    let split_score = eval_word_spacing(&split_run, cfg, unicharset, is_space);

    if split_score > original_score {
        let mut iter = split_run.into_iter();
        Some((iter.next().unwrap(), iter.next().unwrap()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{BlobChoice, ClassifyWordOutput};
    use crate::unichar::SimpleUnicharset;
    use crate::word::{BestChoice, PermuterTag};

    struct NullClassifier;
    impl LegacyClassifier for NullClassifier {
        fn classify_word(&self, _word: &WordResult) -> ClassifyWordOutput {
            ClassifyWordOutput::default()
        }
        fn classify_blob(&self, _blob: &Blob) -> Vec<BlobChoice> {
            Vec::new()
        }
    }

    fn make_word(bbox: Blob, text: &str, u: &mut SimpleUnicharset, done: bool) -> WordResult {
        let ids = u.intern_str(text);
        let blobs: Vec<Blob> = (0..ids.len())
            .map(|i| Blob {
                x0: bbox.x0 + i as f32,
                x1: bbox.x0 + i as f32 + 1.0,
                y0: bbox.y0,
                y1: bbox.y1,
            })
            .collect();
        let mut w = WordResult::new(bbox, 0.0, 10.0, blobs);
        let n = ids.len();
        w.best_choice = BestChoice::new(ids, vec![1.0; n], vec![-1.0; n]);
        w.best_choice.permuter = Some(PermuterTag::SystemDawg);
        w.flags.done = done;
        w.flags.tess_accepted = done;
        w
    }

    #[test]
    fn perfect_score_when_all_done() {
        let mut u = SimpleUnicharset::new();
        let w1 = make_word(
            Blob {
                x0: 0.0,
                x1: 3.0,
                y0: 0.0,
                y1: 10.0,
            },
            "cat",
            &mut u,
            true,
        );
        let cfg = RecognitionConfig::default();
        let wrapped = UnicharRepertoireRef(&u);
        let score = eval_word_spacing(&[w1], &cfg, &wrapped, |id| u.is_space(id));
        assert_eq!(score, cfg.perfect_werds_score);
    }

    #[test]
    fn suppresses_digit_one_conflict_boundary() {
        let mut u = SimpleUnicharset::new();
        let w1 = make_word(
            Blob {
                x0: 0.0,
                x1: 3.0,
                y0: 0.0,
                y1: 10.0,
            },
            "561",
            &mut u,
            true,
        );
        let w2 = make_word(
            Blob {
                x0: 4.0,
                x1: 6.0,
                y0: 0.0,
                y1: 10.0,
            },
            "I3",
            &mut u,
            true,
        );
        let cfg = RecognitionConfig::default();
        let wrapped = UnicharRepertoireRef(&u);
        // w2 is also done, so this hits the all_done early-return first;
        // test suppression directly against the per-word credit logic via a
        // not-fully-done run instead.
        let mut w3 = w2.clone();
        w3.flags.done = false;
        w3.flags.tess_accepted = false;
        let score = eval_word_spacing(&[w1.clone(), w3], &cfg, &wrapped, |id| u.is_space(id));
        // only w1 contributes, and its contribution is suppressed by the
        // 1-conflict boundary, so only the "1" adjacency bonus (none here
        // since '1' and 'I' don't match) remains: score 0.
        assert_eq!(score, 0);
    }

    #[test]
    fn run_returns_unchanged_when_already_perfect() {
        let mut u = SimpleUnicharset::new();
        let w1 = make_word(
            Blob {
                x0: 0.0,
                x1: 3.0,
                y0: 0.0,
                y1: 10.0,
            },
            "cat",
            &mut u,
            true,
        );
        let cfg = RecognitionConfig::default();
        let wrapped = UnicharRepertoireRef(&u);
        let legacy = NullClassifier;
        let out = fix_fuzzy_space_list(&[w1.clone()], &legacy, &cfg, &wrapped, |id| u.is_space(id));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].best_choice.unichars, w1.best_choice.unichars);
    }

    #[test]
    fn fix_sp_fp_word_refuses_short_words() {
        let mut u = SimpleUnicharset::new();
        let w = make_word(
            Blob {
                x0: 0.0,
                x1: 3.0,
                y0: 0.0,
                y1: 10.0,
            },
            "cat",
            &mut u,
            false,
        );
        let cfg = RecognitionConfig::default();
        let wrapped = UnicharRepertoireRef(&u);
        let legacy = NullClassifier;
        assert!(fix_sp_fp_word(&w, &cfg, &legacy, &wrapped, |id| u.is_space(id)).is_none());
    }
}
