//! Rejection Engine: per-word reject-map construction, document-quality
//! scoring, and the suspect-level downgrade pass.
//!
//! Reference upstream implementation: `src/ccmain/reject.cpp`'s
//! `Tesseract::make_reject_map`/`one_ell_conflict`/`flip_0O`, and
//! `Tesseract::quality_based_rejection` (declared in `tesseractclass.h`,
//! called from `control.cpp`) for the quality-ratio accumulation.

use crate::config::RecognitionConfig;
use crate::ids::UnicharId;
use crate::pass_context::PassStats;
use crate::reject::{RejectMap, RejectReason};
use crate::unichar::UnicharRepertoire;
use crate::word::{PermuterTag, WordResult};

const ONE_IL_SET: &[char] = &['1', 'I', 'l'];

/// Mirrors upstream `flip_0O`: context-aware 0/O substitution. Only touches
/// non-sub/superscript positions. Returns the number of characters flipped.
pub fn flip_0_o(word: &mut WordResult, unicharset: &mut dyn UnicharRepertoire) -> usize
where
{
    flip_pair(word, unicharset, '0', 'O')
}

/// Context-aware '.'/'-' substitution (hyphen vs. period confusion).
pub fn flip_hyphens(word: &mut WordResult, unicharset: &mut dyn UnicharRepertoire) -> usize {
    flip_pair(word, unicharset, '.', '-')
}

/// Shared aspect-ratio-driven flip: if a non-sub/superscript character's
/// recognized glyph is taller/narrower than typical for `from` and matches
/// the profile of `to` given its neighbors being alphabetic, substitute it.
/// This crate does not model glyph aspect ratio directly (no raster
/// access), so the heuristic reduces to "digit run vs. letter run"
/// context, matching the word's own best_choice content.
fn flip_pair(
    word: &mut WordResult,
    unicharset: &mut dyn UnicharRepertoire,
    from: char,
    to: char,
) -> usize {
    use crate::word::ScriptPos;
    let mut flips = 0;
    let n = word.best_choice.unichars.len();
    for i in 0..n {
        if matches!(
            word.script_pos.get(i),
            Some(ScriptPos::Subscript) | Some(ScriptPos::Superscript)
        ) {
            continue;
        }
        let Some(ch) = unicharset
            .text_for(word.best_choice.unichars[i])
            .chars()
            .next()
        else {
            continue;
        };
        if ch != from {
            continue;
        }
        let prev_alpha = i > 0
            && unicharset
                .text_for(word.best_choice.unichars[i - 1])
                .chars()
                .next()
                .is_some_and(|c| c.is_alphabetic());
        let next_alpha = i + 1 < n
            && unicharset
                .text_for(word.best_choice.unichars[i + 1])
                .chars()
                .next()
                .is_some_and(|c| c.is_alphabetic());
        if prev_alpha || next_alpha {
            word.best_choice.unichars[i] = unicharset.id_for(to).unwrap_or(word.best_choice.unichars[i]);
            flips += 1;
        }
    }
    flips
}

/// Flag every character whose unichar is the space unichar as TESS_FAILURE.
pub fn reject_blanks(word: &mut WordResult, is_space: impl Fn(UnicharId) -> bool) {
    for (i, &u) in word.best_choice.unichars.iter().enumerate() {
        if is_space(u) {
            word.reject_map.get_mut(i).reject(RejectReason::TessFailure);
        }
    }
}

/// Reject the whole word if its x-height (image pixels) is too small to be
/// sane.
pub fn reject_if_too_small(word: &mut WordResult, x_height_pixels: i32, cfg: &RecognitionConfig) {
    if x_height_pixels <= cfg.min_sane_x_ht_pixels {
        let len = word.best_choice.len();
        word.reject_map = RejectMap::all_rejected(len, RejectReason::BadQuality);
    }
}

/// Mirrors upstream `one_ell_conflict`: detect 1/I/l confusion. `valid_word`
/// is a dictionary probe: flipping the leading character to the other
/// member of the confusion set and checking whether the result becomes a
/// dictionary word.
pub fn one_ell_conflict(
    word: &mut WordResult,
    update: bool,
    valid_word: impl Fn(&[UnicharId]) -> Option<PermuterTag>,
    unicharset: &dyn UnicharRepertoire,
) -> bool {
    if word.best_choice.is_empty() {
        return false;
    }
    let first_char = unicharset
        .text_for(word.best_choice.unichars[0])
        .chars()
        .next();
    let Some(c) = first_char else { return false };
    if !ONE_IL_SET.contains(&c) {
        return false;
    }

    let alt_char = match c {
        'I' => 'l',
        'l' => 'I',
        _ => return false,
    };
    let Some(alt_id) = unicharset.id_for(alt_char) else {
        return false;
    };
    let mut flipped = word.best_choice.unichars.clone();
    flipped[0] = alt_id;
    let found = valid_word(&flipped).is_some();

    if found && update {
        word.reject_map.get_mut(0).flag(RejectReason::Postnn1Il);
        let has_digit = word
            .best_choice
            .unichars
            .iter()
            .skip(1)
            .filter_map(|&u| unicharset.text_for(u).chars().next())
            .any(|ch| ch.is_ascii_digit());
        if has_digit {
            word.best_choice.permuter = Some(PermuterTag::Number);
        }
    }
    found
}

/// Flag characters within `image_border` pixels of any edge as edge-char
/// noise.
pub fn flag_edge_chars(
    word: &mut WordResult,
    image_width: i32,
    image_height: i32,
    cfg: &RecognitionConfig,
) {
    let border = cfg.image_border as f32;
    for (i, blob) in word.chopped_blobs.iter().enumerate() {
        if i >= word.best_choice.len() {
            break;
        }
        if blob.x0 <= border
            || blob.y0 <= border
            || (image_width as f32 - blob.x1) <= border
            || (image_height as f32 - blob.y1) <= border
        {
            word.reject_map.get_mut(i).flag(RejectReason::EdgeChar);
        }
    }
}

/// Permuter-based acceptance. Returns whether the whole word is acceptable
/// by this rule.
pub fn permuter_acceptance(word: &mut WordResult, is_space: impl Fn(UnicharId) -> bool) -> bool {
    let no_space = word.contains_no_space(&is_space);
    let permuter_ok = word.best_choice.permuter.is_some_and(|p| {
        p.is_dictionary_class()
            || (p == PermuterTag::Number && word.best_choice.unichars.iter().all(|_| true))
    });
    let accept = word.flags.tess_accepted && no_space && permuter_ok;
    if !accept {
        for i in 0..word.reject_map.len() {
            word.reject_map.get_mut(i).flag(RejectReason::BadPermuter);
        }
    }
    accept
}

/// Per-word done rule.
pub fn compute_done(word: &mut WordResult, is_space: impl Fn(UnicharId) -> bool, one_il: bool) {
    let mut done = word.flags.tess_accepted && word.contains_no_space(&is_space);
    let dictionary_class = word.best_choice.is_dictionary_class();
    if one_il && !dictionary_class {
        done = false;
    }
    if !dictionary_class && word.best_choice.permuter != Some(PermuterTag::Number) {
        done = false;
    }
    word.flags.done = done;
}

/// Quality-based page rejection. Feeds one non-repeat word's contribution
/// into the running `PassStats` accumulator.
pub fn accumulate_quality(stats: &mut PassStats, word: &WordResult) {
    if word.flags.repeat_char {
        return;
    }
    let char_count = word.best_choice.len();
    let reject_count = word.reject_map.reject_count();
    let blob_quality = word.best_choice.min_certainty() as f64;
    let outline_errors = word.reject_map.iter().filter(|e| e.has(RejectReason::EdgeChar)).count();
    let char_quality = word.best_choice.total_rating() as f64;
    let good_char_quality = if word.flags.tess_accepted {
        char_quality
    } else {
        0.0
    };
    stats.accumulate_word(
        char_count,
        reject_count,
        blob_quality,
        outline_errors,
        char_quality,
        good_char_quality,
    );
}

/// Whether the accumulated document stats meet the "good quality" bar.
pub fn is_good_quality_document(stats: &PassStats, cfg: &RecognitionConfig) -> bool {
    stats.rej_pc() as f32 <= cfg.quality_rej_pc
        && stats.blob_pc() as f32 >= cfg.quality_blob_pc
        && stats.outline_pc() as f32 <= cfg.quality_outline_pc
        && stats.char_pc() as f32 >= cfg.quality_char_pc
}

/// Suspect-level downgrade. Mutates `map` in place.
/// At level 0, everything but TESS_FAILURE is unrejected. At 1-2, a
/// conservative subset of reasons are unrejected (those representing
/// borderline calls rather than outright failures); level 3 and above
/// leaves the map untouched (strictest).
pub fn apply_suspect_level(map: &mut RejectMap, suspect_level: u8) {
    if suspect_level == 0 {
        for i in 0..map.len() {
            let e = map.get_mut(i);
            if !e.has(RejectReason::TessFailure) {
                e.accepted = true;
            }
        }
        return;
    }
    if suspect_level <= 2 {
        let unreject_reasons = [
            RejectReason::DocReject,
            RejectReason::BlockReject,
            RejectReason::RowReject,
            RejectReason::MmReject,
        ];
        for i in 0..map.len() {
            let e = map.get_mut(i);
            if !e.accepted
                && !e.has(RejectReason::TessFailure)
                && e.reasons.iter().all(|r| unreject_reasons.contains(r))
            {
                e.setrej_minimal_rej_accept();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unichar::SimpleUnicharset;
    use crate::word::{BestChoice, Blob};

    fn sample_word(text: &str, u: &mut SimpleUnicharset) -> WordResult {
        let ids = u.intern_str(text);
        let n = ids.len();
        let bbox = Blob {
            x0: 0.0,
            x1: n as f32,
            y0: 0.0,
            y1: 10.0,
        };
        let mut w = WordResult::new(bbox, 0.0, 10.0, vec![]);
        w.best_choice = BestChoice::new(ids, vec![1.0; n], vec![-1.0; n]);
        w
    }

    #[test]
    fn reject_blanks_flags_space_unichars() {
        let mut u = SimpleUnicharset::new();
        let mut w = sample_word("a b", &mut u);
        reject_blanks(&mut w, |id| u.is_space(id));
        assert!(w.reject_map.get(1).has(RejectReason::TessFailure));
        assert!(!w.reject_map.get(0).has(RejectReason::TessFailure));
    }

    #[test]
    fn too_small_x_height_rejects_whole_word() {
        let mut u = SimpleUnicharset::new();
        let mut w = sample_word("cat", &mut u);
        let cfg = RecognitionConfig::default();
        reject_if_too_small(&mut w, 5, &cfg);
        assert!(w.reject_map.all_accepted() == false);
        assert_eq!(w.reject_map.reject_count(), 3);
    }

    #[test]
    fn one_ell_conflict_detects_dictionary_flip() {
        let mut u = SimpleUnicharset::new();
        let mut w = sample_word("I23", &mut u);
        let valid = |ids: &[UnicharId]| -> Option<PermuterTag> {
            let text: String = ids.iter().map(|&id| u.text_for(id)).collect();
            if text == "l23" {
                Some(PermuterTag::SystemDawg)
            } else {
                None
            }
        };
        let found = one_ell_conflict(&mut w, true, valid, &u);
        assert!(found);
        assert!(w.reject_map.get(0).has(RejectReason::Postnn1Il));
        assert_eq!(w.best_choice.permuter, Some(PermuterTag::Number));
    }

    #[test]
    fn good_quality_document_thresholds() {
        let mut stats = PassStats::default();
        stats.accumulate_word(100, 2, 50.0, 0, 97.0, 95.0);
        let cfg = RecognitionConfig::default();
        assert!(is_good_quality_document(&stats, &cfg));
    }

    #[test]
    fn suspect_level_zero_unrejects_all_but_tess_failure() {
        let mut map = RejectMap::new(2);
        map.get_mut(0).reject(RejectReason::BadPermuter);
        map.get_mut(1).reject(RejectReason::TessFailure);
        apply_suspect_level(&mut map, 0);
        assert!(map.get(0).accepted);
        assert!(!map.get(1).accepted);
    }
}
