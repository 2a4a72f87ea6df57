//! Per-character rejection map.
//!
//! Reference upstream implementation: the `reject_map[i].setrej_*()` call
//! sites threaded through `src/ccmain/reject.cpp`, whose per-character
//! `REJ_FLAGS` bit array is collapsed here into a `HashSet` per character.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single reason a character may be flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    TessFailure,
    BadPermuter,
    PoorMatch,
    OneIlConflict,
    Hyphen,
    BadQuality,
    EdgeChar,
    DocReject,
    BlockReject,
    RowReject,
    MmReject,
    Postnn1Il,
    MinimalRejAccept,
}

/// Accept/reject status plus reason flags for a single character position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectEntry {
    pub accepted: bool,
    pub reasons: HashSet<RejectReason>,
}

impl RejectEntry {
    pub fn accepted() -> Self {
        RejectEntry {
            accepted: true,
            reasons: HashSet::new(),
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        let mut reasons = HashSet::new();
        reasons.insert(reason);
        RejectEntry {
            accepted: false,
            reasons,
        }
    }

    /// Flag a reason without necessarily flipping acceptance (matches
    /// upstream's habit of recording a reason code alongside an otherwise
    /// accepted character, e.g. `MINIMAL_REJ_ACCEPT`).
    pub fn flag(&mut self, reason: RejectReason) {
        self.reasons.insert(reason);
    }

    pub fn has(&self, reason: RejectReason) -> bool {
        self.reasons.contains(&reason)
    }

    /// Monotone transition toward finalization: once rejected for a reason
    /// other than `MinimalRejAccept`, `reject()` keeps the entry rejected
    /// and adds the reason.
    pub fn reject(&mut self, reason: RejectReason) {
        self.accepted = false;
        self.reasons.insert(reason);
    }

    /// The one explicit re-acceptance path (`setrej_minimal_rej_accept` in
    /// upstream): re-accepts the character but leaves the historical reason
    /// flags in place so
    /// callers can see why it was once rejected.
    pub fn setrej_minimal_rej_accept(&mut self) {
        self.accepted = true;
        self.reasons.insert(RejectReason::MinimalRejAccept);
    }
}

/// Fixed-length array over a word's `best_choice`, one entry per character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectMap {
    entries: Vec<RejectEntry>,
}

impl RejectMap {
    pub fn new(len: usize) -> Self {
        RejectMap {
            entries: vec![RejectEntry::accepted(); len],
        }
    }

    pub fn all_rejected(len: usize, reason: RejectReason) -> Self {
        RejectMap {
            entries: (0..len).map(|_| RejectEntry::rejected(reason)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, i: usize) -> &RejectEntry {
        &self.entries[i]
    }

    pub fn get_mut(&mut self, i: usize) -> &mut RejectEntry {
        &mut self.entries[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RejectEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RejectEntry> {
        self.entries.iter_mut()
    }

    pub fn reject_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.accepted).count()
    }

    pub fn accept_count(&self) -> usize {
        self.entries.iter().filter(|e| e.accepted).count()
    }

    pub fn all_accepted(&self) -> bool {
        self.entries.iter().all(|e| e.accepted)
    }

    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    pub fn push(&mut self, entry: RejectEntry) {
        self.entries.push(entry);
    }

    pub fn extend_from(&mut self, other: &RejectMap) {
        self.entries.extend(other.entries.iter().cloned());
    }
}
