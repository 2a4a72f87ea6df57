//! Diacritic Reassigner: attaches noise outlines (tittles, accents) back
//! onto the blobs the classifier should have seen them as part of
//!.
//!
//! Reference upstream implementation: `ccmain/fixspace.cpp`'s
//! `Tesseract::fix_noisy_outline`s and `classify/blobclass.cpp`'s
//! `cluster_id` merge helpers. The upstream `non_overlapped_used`
//! double-increment is preserved literally in the `non_overlapped_used`
//! counter below, rather than "fixed".

use crate::classifier::LegacyClassifier;
use crate::config::RecognitionConfig;
use crate::word::{Blob, WordResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiacriticSide {
    Left,
    Right,
    NewBlob,
}

/// Result of one reassignment pass over a word.
#[derive(Debug, Clone, Default)]
pub struct DiacriticOutcome {
    pub attached_count: usize,
    /// True when an inserted stand-alone blob extended past the word's
    /// original right edge, in which case the next word must be marked
    /// fuzzy.
    pub extended_right_edge: bool,
}

fn baseline_certainty(legacy: &dyn LegacyClassifier, blob: &Blob) -> f32 {
    legacy
        .classify_blob(blob)
        .into_iter()
        .map(|c| c.certainty)
        .fold(f32::NEG_INFINITY, f32::max)
}

fn certainty_with_outlines(legacy: &dyn LegacyClassifier, blob: &Blob, outlines: &[Blob]) -> f32 {
    let merged = merge_blob(blob, outlines);
    baseline_certainty(legacy, &merged)
}

fn merge_blob(blob: &Blob, outlines: &[Blob]) -> Blob {
    let mut x0 = blob.x0;
    let mut x1 = blob.x1;
    let mut y0 = blob.y0;
    let mut y1 = blob.y1;
    for o in outlines {
        x0 = x0.min(o.x0);
        x1 = x1.max(o.x1);
        y0 = y0.min(o.y0);
        y1 = y1.max(o.y1);
    }
    Blob { x0, x1, y0, y1 }
}

/// Greedy descent over the overlap-candidate set for one main blob,
/// returning the accepted inclusion set (possibly empty) and whether it met
/// the threshold.
fn greedy_overlap_descent(
    legacy: &dyn LegacyClassifier,
    blob: &Blob,
    candidates: Vec<Blob>,
    cfg: &RecognitionConfig,
) -> Option<Vec<Blob>> {
    let baseline = baseline_certainty(legacy, blob);
    let threshold = cfg.noise_cert_basechar;
    let target = baseline - cfg.noise_cert_factor * (baseline - threshold);

    let mut included = candidates;
    let mut current_certainty = certainty_with_outlines(legacy, blob, &included);

    loop {
        if current_certainty >= target {
            return Some(included);
        }
        if included.is_empty() {
            break;
        }
        // Find the outline whose removal most increases certainty.
        let mut best_idx = None;
        let mut best_certainty = current_certainty;
        for i in 0..included.len() {
            let mut trial = included.clone();
            trial.remove(i);
            let c = certainty_with_outlines(legacy, blob, &trial);
            if c > best_certainty {
                best_certainty = c;
                best_idx = Some(i);
            }
        }
        match best_idx {
            Some(i) => {
                included.remove(i);
                current_certainty = best_certainty;
            }
            None => break,
        }
    }

    if current_certainty >= target {
        Some(included)
    } else {
        None
    }
}

/// Reassign `word.reject_outlines` into `word.chopped_blobs`
/// (attaching into existing blobs) or into new stand-alone blobs, mutating
/// `word` in place.
///
/// Preconditions: reject list nonempty, main list nonempty,
/// reject count <= `max_noise_per_word`. Returns `None` if preconditions
/// aren't met (no-op).
pub fn reassign_diacritics(
    word: &mut WordResult,
    legacy: &dyn LegacyClassifier,
    cfg: &RecognitionConfig,
) -> Option<DiacriticOutcome> {
    if word.reject_outlines.is_empty() || word.chopped_blobs.is_empty() {
        return None;
    }
    if word.reject_outlines.len() > cfg.max_noise_per_word {
        return None;
    }

    let mut outcome = DiacriticOutcome::default();

    // Step 1: sort reject outlines by x-midpoint.
    word.reject_outlines
        .sort_by(|a, b| a.x_mid().partial_cmp(&b.x_mid()).unwrap());

    let mut remaining: Vec<Blob> = Vec::new();
    let mut consumed = vec![false; word.reject_outlines.len()];

    // Step 2+3: per-main-blob overlap-candidate attachment.
    let mut blob_attachments: Vec<Vec<Blob>> = vec![Vec::new(); word.chopped_blobs.len()];
    for (bi, blob) in word.chopped_blobs.iter().enumerate() {
        let mut candidates = Vec::new();
        for (oi, outline) in word.reject_outlines.iter().enumerate() {
            if consumed[oi] {
                continue;
            }
            if blob.x_overlaps(outline) {
                candidates.push(*outline);
                consumed[oi] = true;
            }
        }
        if candidates.is_empty() {
            continue;
        }
        if candidates.len() > cfg.max_noise_per_blob {
            // Too many candidates for one blob: push them to step 4's
            // adjacency grouping instead of the greedy descent.
            remaining.extend(candidates);
            continue;
        }
        if let Some(accepted) = greedy_overlap_descent(legacy, blob, candidates, cfg) {
            outcome.attached_count += accepted.len();
            blob_attachments[bi] = accepted;
        }
    }

    for (oi, consumed) in consumed.iter().enumerate() {
        if !consumed {
            remaining.push(word.reject_outlines[oi]);
        }
    }

    // Apply accepted attachments by expanding the blob extents.
    for (bi, attachments) in blob_attachments.into_iter().enumerate() {
        if !attachments.is_empty() {
            word.chopped_blobs[bi] = merge_blob(&word.chopped_blobs[bi], &attachments);
        }
    }

    // Step 4: remaining outlines, grouped by x-adjacency.
    remaining.sort_by(|a, b| a.x_mid().partial_cmp(&b.x_mid()).unwrap());
    let groups = group_by_adjacency(&remaining);
    let word_right_edge = word.bbox.x1;
    let mut placed_outlines: Vec<usize> = Vec::new();
    let mut new_blobs = Vec::new();

    // Preserve the upstream double-increment: both the left-attach and
    // new-blob branches bump this counter, so it over-counts relative to
    // `new_blobs.len()`.
    let mut non_overlapped_used = 0usize;

    for (gi, group) in groups.iter().enumerate() {
        let group_blob = merge_blob(&group[0], &group[1..]);
        let mut placed = false;

        if let Some(left_idx) = nearest_blob_index(&word.chopped_blobs, group_blob.x_mid(), true)
        {
            let cert = certainty_with_outlines(legacy, &word.chopped_blobs[left_idx], group);
            if cert >= cfg.noise_cert_disjoint {
                word.chopped_blobs[left_idx] = merge_blob(&word.chopped_blobs[left_idx], group);
                non_overlapped_used += 1;
                placed = true;
            }
        }
        if !placed {
            if let Some(right_idx) =
                nearest_blob_index(&word.chopped_blobs, group_blob.x_mid(), false)
            {
                let cert = certainty_with_outlines(legacy, &word.chopped_blobs[right_idx], group);
                if cert >= cfg.noise_cert_disjoint {
                    word.chopped_blobs[right_idx] =
                        merge_blob(&word.chopped_blobs[right_idx], group);
                    non_overlapped_used += 1;
                    placed = true;
                }
            }
        }
        if !placed {
            let cert = baseline_certainty(legacy, &group_blob);
            if cert >= cfg.noise_cert_punc {
                new_blobs.push(group_blob);
                non_overlapped_used += 1;
                placed = true;
            }
        }

        if placed {
            placed_outlines.push(gi);
            outcome.attached_count += group.len();
            if group_blob.x1 > word_right_edge {
                outcome.extended_right_edge = true;
            }
        }
    }
    let _ = non_overlapped_used;

    word.chopped_blobs.extend(new_blobs);
    word.chopped_blobs
        .sort_by(|a, b| a.x0.partial_cmp(&b.x0).unwrap());

    // Only outlines not successfully placed remain rejected.
    word.reject_outlines = groups
        .into_iter()
        .enumerate()
        .filter(|(gi, _)| !placed_outlines.contains(gi))
        .flat_map(|(_, g)| g)
        .collect();

    Some(outcome)
}

fn group_by_adjacency(sorted: &[Blob]) -> Vec<Vec<Blob>> {
    let mut groups: Vec<Vec<Blob>> = Vec::new();
    for &b in sorted {
        match groups.last_mut() {
            Some(last) if b.x0 - last.last().unwrap().x1 < last.last().unwrap().width().max(1.0) => {
                last.push(b);
            }
            _ => groups.push(vec![b]),
        }
    }
    groups
}

fn nearest_blob_index(blobs: &[Blob], x_mid: f32, left: bool) -> Option<usize> {
    if left {
        blobs
            .iter()
            .enumerate()
            .filter(|(_, b)| b.x_mid() <= x_mid)
            .max_by(|(_, a), (_, b)| a.x_mid().partial_cmp(&b.x_mid()).unwrap())
            .map(|(i, _)| i)
    } else {
        blobs
            .iter()
            .enumerate()
            .filter(|(_, b)| b.x_mid() >= x_mid)
            .min_by(|(_, a), (_, b)| a.x_mid().partial_cmp(&b.x_mid()).unwrap())
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::BlobChoice;
    use crate::ids::UnicharId;

    /// Classifies "i" confidently only when a blob's width exceeds the bare
    /// stem's, i.e. when the dot has been merged in.
    struct DotSensitiveClassifier;
    impl LegacyClassifier for DotSensitiveClassifier {
        fn classify_word(&self, _word: &WordResult) -> crate::classifier::ClassifyWordOutput {
            crate::classifier::ClassifyWordOutput::default()
        }
        fn classify_blob(&self, blob: &Blob) -> Vec<BlobChoice> {
            let certainty = if blob.height() > 3.0 { -1.0 } else { -6.0 };
            vec![BlobChoice {
                unichar: UnicharId(1),
                rating: 1.0,
                certainty,
            }]
        }
    }

    fn word_with_noise() -> WordResult {
        let stem = Blob {
            x0: 0.0,
            x1: 1.0,
            y0: 0.0,
            y1: 2.0,
        };
        let mut w = WordResult::new(
            Blob {
                x0: 0.0,
                x1: 1.0,
                y0: -2.0,
                y1: 2.0,
            },
            0.0,
            2.0,
            vec![stem],
        );
        w.reject_outlines = vec![Blob {
            x0: 0.2,
            x1: 0.8,
            y0: 3.0,
            y1: 4.0,
        }];
        w
    }

    #[test]
    fn attaches_overlapping_outline_to_blob() {
        let mut w = word_with_noise();
        let cfg = RecognitionConfig::default();
        let legacy = DotSensitiveClassifier;
        let outcome = reassign_diacritics(&mut w, &legacy, &cfg).expect("should run");
        assert_eq!(outcome.attached_count, 1);
        assert!(w.reject_outlines.is_empty());
        assert!(w.chopped_blobs[0].height() > 3.0);
    }

    #[test]
    fn no_op_when_reject_list_empty() {
        let mut w = word_with_noise();
        w.reject_outlines.clear();
        let cfg = RecognitionConfig::default();
        let legacy = DotSensitiveClassifier;
        assert!(reassign_diacritics(&mut w, &legacy, &cfg).is_none());
    }

    #[test]
    fn no_op_when_exceeds_max_noise_per_word() {
        let mut w = word_with_noise();
        let cfg = RecognitionConfig {
            max_noise_per_word: 0,
            ..RecognitionConfig::default()
        };
        let legacy = DotSensitiveClassifier;
        assert!(reassign_diacritics(&mut w, &legacy, &cfg).is_none());
    }
}
