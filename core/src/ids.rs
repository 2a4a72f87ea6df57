//! Arena-style identifiers.
//!
//! Reference upstream implementation: `ccutil/unicity_table.h` (the legacy
//! unicharset index) and the cyclic `WordResult <-> PAGE_RES_IT` pointer
//! network in `src/ccmain/tesseractclass.h`, replaced here by small integer
//! indices.

use serde::{Deserialize, Serialize};

/// Index into an external unicharset. Never constructed from a raw `char`;
/// only `UnicharRepertoire` implementations mint these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnicharId(pub u32);

/// Index into the page's configured language table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageId(pub u16);

impl LanguageId {
    pub const PRIMARY: LanguageId = LanguageId(0);
}

/// Identifies a Word by (block, row, word) position rather than a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WordId {
    pub block: usize,
    pub row: usize,
    pub word: usize,
}

impl WordId {
    pub fn new(block: usize, row: usize, word: usize) -> Self {
        WordId { block, row, word }
    }
}

impl std::fmt::Display for WordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.block, self.row, self.word)
    }
}
