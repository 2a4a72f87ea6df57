//! The unit of recognition: `WordResult` and its supporting types.
//!
//! Reference upstream implementation: `WERD_RES` (forward-declared in
//! `src/ccmain/tesseractclass.h`/`docqual.h`/`fixspace.h`, used throughout
//! `control.cpp`) for the bounding geometry, blob lists, ratings matrix,
//! `best_choice`, `alt_choices`, `raw_choice`, `reject_map`, control flags,
//! and blamer bundle. Character identity is carried as `UnicharId`, never
//! `char`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ids::{LanguageId, UnicharId};
use crate::reject::{RejectEntry, RejectMap, RejectReason};

/// Which language-model path approved a `BestChoice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermuterTag {
    NoPerm,
    TopChoice,
    SystemDawg,
    UserDawg,
    FreqDawg,
    DocDawg,
    Number,
    PuncDawg,
    Compound,
}

impl Default for PermuterTag {
    fn default() -> Self {
        PermuterTag::NoPerm
    }
}

impl PermuterTag {
    /// True for every permuter the dispatch/rejection rules treat as
    /// "dictionary-class".
    pub fn is_dictionary_class(self) -> bool {
        matches!(
            self,
            PermuterTag::SystemDawg
                | PermuterTag::UserDawg
                | PermuterTag::FreqDawg
                | PermuterTag::DocDawg
                | PermuterTag::PuncDawg
                | PermuterTag::Compound
        )
    }
}

/// Per-character script position, used by pass 6 (font/script-position) and
/// by the bigram corrector to strip superscript spans before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptPos {
    Normal,
    Subscript,
    Superscript,
}

/// A scored candidate character at a position, as produced by a classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharChoice {
    pub unichar: UnicharId,
    pub rating: f32,
    pub certainty: f32,
}

/// Upper-triangular table indexed by (start_blob, end_blob); cell is the
/// candidate list for the contiguous blob span `[start, end]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingsMatrix {
    num_blobs: usize,
    // cells[start][end - start] for end >= start
    cells: Vec<Vec<Vec<CharChoice>>>,
}

impl RatingsMatrix {
    pub fn new(num_blobs: usize) -> Self {
        let cells = (0..num_blobs)
            .map(|start| vec![Vec::new(); num_blobs - start])
            .collect();
        RatingsMatrix { num_blobs, cells }
    }

    pub fn num_blobs(&self) -> usize {
        self.num_blobs
    }

    pub fn set_cell(&mut self, start: usize, end: usize, choices: Vec<CharChoice>) {
        self.cells[start][end - start] = choices;
    }

    pub fn cell(&self, start: usize, end: usize) -> &[CharChoice] {
        &self.cells[start][end - start]
    }
}

/// A sequence of unichar ids with per-position rating/certainty, a total
/// rating, a minimum certainty, and the permuter that approved it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BestChoice {
    pub unichars: Vec<UnicharId>,
    pub ratings: Vec<f32>,
    pub certainties: Vec<f32>,
    pub permuter: Option<PermuterTag>,
    pub dangerous_ambig: bool,
    pub min_x_height: f32,
    pub max_x_height: f32,
}

impl BestChoice {
    pub fn new(unichars: Vec<UnicharId>, ratings: Vec<f32>, certainties: Vec<f32>) -> Self {
        debug_assert_eq!(unichars.len(), ratings.len());
        debug_assert_eq!(unichars.len(), certainties.len());
        BestChoice {
            unichars,
            ratings,
            certainties,
            permuter: None,
            dangerous_ambig: false,
            min_x_height: 0.0,
            max_x_height: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.unichars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unichars.is_empty()
    }

    pub fn total_rating(&self) -> f32 {
        self.ratings.iter().sum()
    }

    pub fn min_certainty(&self) -> f32 {
        self.certainties
            .iter()
            .copied()
            .fold(f32::INFINITY, f32::min)
    }

    pub fn is_dictionary_class(&self) -> bool {
        self.permuter.is_some_and(PermuterTag::is_dictionary_class)
    }
}

/// A single contiguous foreground connected component, or a merged group of
/// such components chosen by the (external) chopper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blob {
    pub x0: f32,
    pub x1: f32,
    pub y0: f32,
    pub y1: f32,
}

impl Blob {
    pub fn x_mid(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// True when this blob's major x-extent overlaps `other`'s.
    pub fn x_overlaps(&self, other: &Blob) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1
    }
}

/// Control flags, mirroring `WERD_RES`'s boolean members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFlags {
    pub done: bool,
    pub tess_accepted: bool,
    pub tess_failed: bool,
    pub tess_would_adapt: bool,
    pub combination: bool,
    pub part_of_combo: bool,
    pub odd_size: bool,
    /// Inter-word gap to the right of this word is "fuzzy". Read by the
    /// fuzzy-space resolver.
    pub fuzzy_space_right: bool,
    /// This word is a repeated-character ("leader") word, e.g. a row of
    /// dots or dashes; bigram correction and fixed-pitch splitting both
    /// skip these.
    pub repeat_char: bool,
}

/// Exclusively-owned, optional attribution bundle for debug builds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlamerBundle {
    pub truth_text: Option<String>,
    pub debug_trace: Vec<String>,
}

/// The unit of recognition: one word, as it progresses through passes 1-6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordResult {
    // --- bounding geometry ---
    pub bbox: Blob,
    pub baseline: f32,
    pub x_height: f32,
    pub ascender: f32,
    pub descender: f32,
    pub small_caps: bool,

    // --- source image fragments ---
    pub original_blobs: Vec<Blob>,
    pub chopped_blobs: Vec<Blob>,
    pub rebuilt_blobs: Vec<Blob>,
    /// Outlines the chopper rejected as noise, awaiting the diacritic
    /// reassigner.
    pub reject_outlines: Vec<Blob>,

    // --- recognition ---
    pub ratings: RatingsMatrix,
    pub best_choice: BestChoice,
    pub alternates: Vec<BestChoice>,
    pub raw_choice: Option<BestChoice>,
    pub reject_map: RejectMap,

    pub language: LanguageId,
    pub font_id: Option<u32>,
    pub script_pos: Vec<ScriptPos>,

    pub flags: WordFlags,
    pub blamer: Option<BlamerBundle>,

    pub blob_widths: Vec<f32>,
    pub blob_gaps: Vec<f32>,
    /// Chop-point grouping: `best_state[i]` is the number of chopped blobs
    /// grouped into output character `i`. Sums to `chopped_blobs.len()`.
    pub best_state: Vec<usize>,

    /// Deep copies of the source pieces a `combination` word was built
    /// from. Empty unless `flags.combination` is set.
    /// The sources themselves are also kept, flagged `part_of_combo`, as
    /// separate entries in the row so the page structure still iterates
    /// them; this field is the combination word's own exclusive ownership
    /// copy, independent of the row's entries.
    pub combo_sources: Vec<WordResult>,
}

impl WordResult {
    /// A freshly layout-produced word: chopped blobs present, nothing
    /// classified yet.
    pub fn new(bbox: Blob, baseline: f32, x_height: f32, chopped_blobs: Vec<Blob>) -> Self {
        let num_blobs = chopped_blobs.len();
        WordResult {
            bbox,
            baseline,
            x_height,
            ascender: 0.0,
            descender: 0.0,
            small_caps: false,
            original_blobs: chopped_blobs.clone(),
            chopped_blobs,
            rebuilt_blobs: Vec::new(),
            reject_outlines: Vec::new(),
            ratings: RatingsMatrix::new(num_blobs),
            best_choice: BestChoice::default(),
            alternates: Vec::new(),
            raw_choice: None,
            reject_map: RejectMap::new(0),
            language: LanguageId::PRIMARY,
            font_id: None,
            script_pos: Vec::new(),
            flags: WordFlags::default(),
            blamer: None,
            blob_widths: Vec::new(),
            blob_gaps: Vec::new(),
            best_state: Vec::new(),
            combo_sources: Vec::new(),
        }
    }

    /// Install the one-space, all-rejected result for a word the classifier
    /// could not process.
    pub fn make_fake(&mut self, space: UnicharId) {
        self.best_choice = BestChoice::new(vec![space], vec![0.0], vec![0.0]);
        self.reject_map = RejectMap::all_rejected(1, RejectReason::TessFailure);
        self.flags.tess_failed = true;
        self.flags.tess_accepted = false;
        self.flags.done = false;
        self.best_state = vec![self.chopped_blobs.len().max(1)];
    }

    /// Invariant: `best_choice.length() == reject_map.length()`.
    pub fn lengths_consistent(&self) -> bool {
        self.best_choice.len() == self.reject_map.len()
    }

    /// Invariant: `sum(best_state) == chopped_word.num_blobs`.
    pub fn best_state_consistent(&self) -> bool {
        self.best_state.iter().sum::<usize>() == self.chopped_blobs.len()
    }

    /// Invariant: ratings matrix dimension == chopped blob count.
    pub fn ratings_consistent(&self) -> bool {
        self.ratings.num_blobs() == self.chopped_blobs.len()
    }

    /// True when the best_choice text contains no space unichar.
    pub fn contains_no_space(&self, is_space: impl Fn(UnicharId) -> bool) -> bool {
        !self.best_choice.unichars.iter().any(|&u| is_space(u))
    }

    /// Deep copy used by fuzzy-space's `current` working list and by
    /// combination-word construction.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    pub fn unique_reasons(&self) -> HashSet<RejectReason> {
        self.reject_map
            .iter()
            .flat_map(|e| e.reasons.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(n: u32) -> UnicharId {
        UnicharId(n)
    }

    #[test]
    fn fake_word_is_all_rejected() {
        let mut w = WordResult::new(
            Blob {
                x0: 0.0,
                x1: 10.0,
                y0: 0.0,
                y1: 10.0,
            },
            0.0,
            10.0,
            vec![],
        );
        w.make_fake(uid(32));
        assert!(w.flags.tess_failed);
        assert_eq!(w.best_choice.len(), 1);
        assert_eq!(w.reject_map.len(), 1);
        assert!(!w.reject_map.get(0).accepted);
        assert!(w.lengths_consistent());
    }

    #[test]
    fn best_state_consistency() {
        let blobs = vec![
            Blob {
                x0: 0.0,
                x1: 5.0,
                y0: 0.0,
                y1: 10.0,
            },
            Blob {
                x0: 5.0,
                x1: 10.0,
                y0: 0.0,
                y1: 10.0,
            },
        ];
        let mut w = WordResult::new(
            Blob {
                x0: 0.0,
                x1: 10.0,
                y0: 0.0,
                y1: 10.0,
            },
            0.0,
            10.0,
            blobs,
        );
        w.best_state = vec![2];
        assert!(w.best_state_consistent());
        assert!(w.ratings_consistent());
    }

    #[test]
    fn permuter_dictionary_class() {
        assert!(PermuterTag::SystemDawg.is_dictionary_class());
        assert!(PermuterTag::Number.is_dictionary_class() == false);
        assert!(!PermuterTag::NoPerm.is_dictionary_class());
    }
}
