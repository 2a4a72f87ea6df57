//! Bigram Corrector: validates adjacent word pairs against the dictionary
//! and swaps in the best jointly-valid alternate reading.
//!
//! Reference upstream implementation: `src/ccmain/control.cpp`'s
//! `Tesseract::bigram_correction_pass`, driving `Dict::valid_bigram` over
//! each adjacent word pair's alt-choice cross product. The Cartesian-product
//! bound below is this crate's own addition, grounded on the teacher's
//! `Engine::limit` bounded-fan-out idiom in `engine.rs`.

use tracing::debug;

use crate::config::RecognitionConfig;
use crate::dictionary::DictionaryOracle;
use crate::ids::UnicharId;
use crate::unichar::UnicharRepertoire;
use crate::word::{BestChoice, ScriptPos, WordResult};

/// The non-superscript "body" of a choice, used for the bigram lookups below.
fn strip_superscript(choice: &BestChoice, script_pos: &[ScriptPos]) -> Vec<UnicharId> {
    choice
        .unichars
        .iter()
        .enumerate()
        .filter(|(i, _)| !matches!(script_pos.get(*i), Some(ScriptPos::Superscript)))
        .map(|(_, &u)| u)
        .collect()
}

fn ranked_candidates<'a>(
    best: &'a BestChoice,
    alternates: &'a [BestChoice],
    cap: usize,
    label: &str,
) -> Vec<&'a BestChoice> {
    let mut all: Vec<&BestChoice> = std::iter::once(best).chain(alternates.iter()).collect();
    all.sort_by(|a, b| a.total_rating().partial_cmp(&b.total_rating()).unwrap());
    if all.len() > cap {
        debug!(
            word = label,
            total = all.len(),
            kept = cap,
            "truncating bigram alternates to MAX_BIGRAM_ALTERNATES"
        );
        all.truncate(cap);
    }
    all
}

/// Lowercased, terminal-punctuation-trimmed text for the "did the choice
/// actually change" comparison below.
fn compare_key(ids: &[UnicharId], unicharset: &dyn UnicharRepertoire) -> String {
    let mut s: String = ids.iter().map(|&id| unicharset.text_for(id)).collect();
    while s.ends_with(|c: char| c.is_ascii_punctuation()) {
        s.pop();
    }
    s.to_lowercase()
}

/// Attempt to correct one adjacent word pair sharing a language.
/// Returns true if either word's `best_choice` was replaced.
pub fn correct_bigram(
    w1: &mut WordResult,
    w2: &mut WordResult,
    dict: &dyn DictionaryOracle,
    cfg: &RecognitionConfig,
    unicharset: &dyn UnicharRepertoire,
) -> bool {
    if w1.flags.repeat_char || w2.flags.repeat_char {
        return false;
    }

    let body1 = strip_superscript(&w1.best_choice, &w1.script_pos);
    let body2 = strip_superscript(&w2.best_choice, &w2.script_pos);
    if dict.valid_bigram(&body1, &body2) {
        return false;
    }

    let candidates1 = ranked_candidates(
        &w1.best_choice,
        &w1.alternates,
        cfg.max_bigram_alternates,
        "w1",
    );
    let candidates2 = ranked_candidates(
        &w2.best_choice,
        &w2.alternates,
        cfg.max_bigram_alternates,
        "w2",
    );

    let mut best_pair: Option<(usize, usize, f32)> = None;
    for (i, c1) in candidates1.iter().enumerate() {
        let b1 = strip_superscript(c1, &w1.script_pos);
        for (j, c2) in candidates2.iter().enumerate() {
            let b2 = strip_superscript(c2, &w2.script_pos);
            if !dict.valid_bigram(&b1, &b2) {
                continue;
            }
            let sum = c1.total_rating() + c2.total_rating();
            if best_pair.is_none_or(|(_, _, best_sum)| sum < best_sum) {
                best_pair = Some((i, j, sum));
            }
        }
    }

    let Some((i, j, _)) = best_pair else {
        return false;
    };

    let chosen1 = candidates1[i].clone();
    let chosen2 = candidates2[j].clone();

    let changed = compare_key(&chosen1.unichars, unicharset)
        != compare_key(&w1.best_choice.unichars, unicharset)
        || compare_key(&chosen2.unichars, unicharset)
            != compare_key(&w2.best_choice.unichars, unicharset);

    if changed {
        w1.best_choice = chosen1;
        w2.best_choice = chosen2;
        w1.reject_map = crate::reject::RejectMap::new(w1.best_choice.len());
        w2.reject_map = crate::reject::RejectMap::new(w2.best_choice.len());
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unichar::SimpleUnicharset;
    use crate::word::{Blob, PermuterTag};

    struct PairDictionary {
        valid_pairs: Vec<(Vec<UnicharId>, Vec<UnicharId>)>,
    }

    impl DictionaryOracle for PairDictionary {
        fn valid_word(&self, _choice: &[UnicharId]) -> Option<PermuterTag> {
            None
        }
        fn valid_bigram(&self, w1: &[UnicharId], w2: &[UnicharId]) -> bool {
            self.valid_pairs
                .iter()
                .any(|(a, b)| a == w1 && b == w2)
        }
        fn add_document_word(&mut self, _choice: &[UnicharId]) {}
        fn acceptable_word(&self, _choice: &[UnicharId]) -> crate::dictionary::AcceptableWord {
            crate::dictionary::AcceptableWord::Unacceptable
        }
    }

    fn word_with_choice(text: &str, rating: f32, u: &mut SimpleUnicharset) -> WordResult {
        let ids = u.intern_str(text);
        let n = ids.len();
        let bbox = Blob {
            x0: 0.0,
            x1: n as f32,
            y0: 0.0,
            y1: 10.0,
        };
        let mut w = WordResult::new(bbox, 0.0, 10.0, vec![]);
        w.best_choice = BestChoice::new(ids, vec![rating; n], vec![-1.0; n]);
        w
    }

    #[test]
    fn skips_repeat_char_words() {
        let mut u = SimpleUnicharset::new();
        let mut w1 = word_with_choice("aaaa", 1.0, &mut u);
        let mut w2 = word_with_choice("bbbb", 1.0, &mut u);
        w1.flags.repeat_char = true;
        let dict = PairDictionary {
            valid_pairs: vec![],
        };
        let cfg = RecognitionConfig::default();
        assert!(!correct_bigram(&mut w1, &mut w2, &dict, &cfg, &u));
    }

    #[test]
    fn accepts_as_is_when_already_valid() {
        let mut u = SimpleUnicharset::new();
        let mut w1 = word_with_choice("New", 1.0, &mut u);
        let mut w2 = word_with_choice("York", 1.0, &mut u);
        let dict = PairDictionary {
            valid_pairs: vec![(
                w1.best_choice.unichars.clone(),
                w2.best_choice.unichars.clone(),
            )],
        };
        let cfg = RecognitionConfig::default();
        assert!(!correct_bigram(&mut w1, &mut w2, &dict, &cfg, &u));
    }

    #[test]
    fn replaces_with_alternate_validated_pair() {
        let mut u = SimpleUnicharset::new();
        let mut w1 = word_with_choice("Neiv", 1.0, &mut u);
        let alt1 = {
            let ids = u.intern_str("New");
            let n = ids.len();
            BestChoice::new(ids, vec![2.0; n], vec![-1.0; n])
        };
        w1.alternates.push(alt1.clone());

        let mut w2 = word_with_choice("York", 1.0, &mut u);

        let dict = PairDictionary {
            valid_pairs: vec![(alt1.unichars.clone(), w2.best_choice.unichars.clone())],
        };
        let cfg = RecognitionConfig::default();
        let changed = correct_bigram(&mut w1, &mut w2, &dict, &cfg, &u);
        assert!(changed);
        assert_eq!(w1.best_choice.unichars, alt1.unichars);
        assert!(w1.lengths_consistent());
        assert!(w2.lengths_consistent());
    }
}
