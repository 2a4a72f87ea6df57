//! `DictionaryOracle` and `AmbiguityTable`: narrow interfaces onto the DAWG
//! and ambiguity-table internals (out of scope here).
//!
//! Reference upstream implementation: `Dict::valid_word`/`valid_bigram`/
//! `add_document_word` (declared via `getDict()` in
//! `src/ccmain/tesseractclass.h`, called from `control.cpp`) and the
//! ambiguity-table usage in `src/ccutil/ambigs.cpp`.

use crate::ids::UnicharId;
use crate::word::PermuterTag;

/// `acceptable_word` classification, used by the rejection engine and the
/// suspect-level downgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptableWord {
    Unacceptable,
    LowerCase,
    UpperCase,
    InitialCap,
    LcAbbrev,
    UcAbbrev,
}

/// The dictionary (DAWG) black-box query surface.
pub trait DictionaryOracle {
    /// Returns the permuter tag that validates `choice`, or `None` if no
    /// DAWG accepts it.
    fn valid_word(&self, choice: &[UnicharId]) -> Option<PermuterTag>;

    /// Whether the ordered pair `(w1, w2)` is a valid bigram.
    fn valid_bigram(&self, w1: &[UnicharId], w2: &[UnicharId]) -> bool;

    /// In-page augmentation: feed an accepted word back into the
    /// short-lived document dictionary, append-only within a page.
    fn add_document_word(&mut self, choice: &[UnicharId]);

    fn acceptable_word(&self, choice: &[UnicharId]) -> AcceptableWord;
}

/// The ambiguity-replacement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbigType {
    Replace,
    Definite,
    Case,
    Dangerous,
}

#[derive(Debug, Clone)]
pub struct AmbigEntry {
    pub wrong_ngram: Vec<UnicharId>,
    pub correct_ngram: Vec<UnicharId>,
    pub kind: AmbigType,
}

/// Universal + per-language ambiguity table.
pub trait AmbiguityTable {
    fn lookup(&self, sequence: &[UnicharId]) -> Vec<AmbigEntry>;
}

/// Simple in-memory `DictionaryOracle`, used for tests and as the default
/// "document dictionary" implementation: a short-lived in-memory DAWG that
/// accepted words get folded into as recognition proceeds.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDictionary {
    words: std::collections::HashSet<Vec<UnicharId>>,
    bigrams: std::collections::HashSet<(Vec<UnicharId>, Vec<UnicharId>)>,
    permuter: PermuterTag,
}

impl InMemoryDictionary {
    pub fn new(permuter: PermuterTag) -> Self {
        InMemoryDictionary {
            words: Default::default(),
            bigrams: Default::default(),
            permuter,
        }
    }

    pub fn insert_word(&mut self, word: Vec<UnicharId>) {
        self.words.insert(word);
    }

    pub fn insert_bigram(&mut self, w1: Vec<UnicharId>, w2: Vec<UnicharId>) {
        self.bigrams.insert((w1, w2));
    }
}

impl DictionaryOracle for InMemoryDictionary {
    fn valid_word(&self, choice: &[UnicharId]) -> Option<PermuterTag> {
        if self.words.contains(choice) {
            Some(self.permuter)
        } else {
            None
        }
    }

    fn valid_bigram(&self, w1: &[UnicharId], w2: &[UnicharId]) -> bool {
        self.bigrams.contains(&(w1.to_vec(), w2.to_vec()))
            || (self.words.contains(w1) && self.words.contains(w2))
    }

    fn add_document_word(&mut self, choice: &[UnicharId]) {
        self.words.insert(choice.to_vec());
    }

    fn acceptable_word(&self, choice: &[UnicharId]) -> AcceptableWord {
        if self.words.contains(choice) {
            AcceptableWord::LowerCase
        } else {
            AcceptableWord::Unacceptable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(s: &str) -> Vec<UnicharId> {
        s.bytes().map(|b| UnicharId(b as u32)).collect()
    }

    #[test]
    fn in_memory_dictionary_validates_inserted_words() {
        let mut d = InMemoryDictionary::new(PermuterTag::SystemDawg);
        d.insert_word(seq("the"));
        assert_eq!(d.valid_word(&seq("the")), Some(PermuterTag::SystemDawg));
        assert_eq!(d.valid_word(&seq("xyz")), None);
    }

    #[test]
    fn document_word_augmentation() {
        let mut d = InMemoryDictionary::new(PermuterTag::DocDawg);
        assert_eq!(d.valid_word(&seq("zebra")), None);
        d.add_document_word(&seq("zebra"));
        assert_eq!(d.valid_word(&seq("zebra")), Some(PermuterTag::DocDawg));
    }

    #[test]
    fn bigram_validity_from_explicit_pair_or_both_words_known() {
        let mut d = InMemoryDictionary::new(PermuterTag::SystemDawg);
        d.insert_word(seq("the"));
        d.insert_word(seq("dog"));
        assert!(d.valid_bigram(&seq("the"), &seq("dog")));
        d.words.clear();
        d.insert_bigram(seq("new"), seq("york"));
        assert!(d.valid_bigram(&seq("new"), &seq("york")));
        assert!(!d.valid_bigram(&seq("new"), &seq("jersey")));
    }
}
