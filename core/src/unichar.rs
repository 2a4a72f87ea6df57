//! `UnicharRepertoire`: the narrow boundary between `UnicharId` and
//! displayable text.
//!
//! Grounded on the teacher's `utils::normalize`/`to_fullwidth`/`to_halfwidth`
//! free-standing conversion functions in `lib.rs`: a small conversion
//! surface, not a heavyweight trait hierarchy.

use crate::ids::UnicharId;
use std::collections::HashMap;

pub trait UnicharRepertoire {
    fn id_for(&self, ch: char) -> Option<UnicharId>;
    fn text_for(&self, id: UnicharId) -> &str;
    fn is_space(&self, id: UnicharId) -> bool;
}

/// A simple bidirectional char<->id table, sufficient for tests and for
/// embedders that don't need the full unicharset file format (out of scope
/// here).
#[derive(Debug, Clone, Default)]
pub struct SimpleUnicharset {
    id_to_text: Vec<String>,
    text_to_id: HashMap<String, UnicharId>,
    space_id: Option<UnicharId>,
}

impl SimpleUnicharset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, ch: char) -> UnicharId {
        let text = ch.to_string();
        if let Some(&id) = self.text_to_id.get(&text) {
            return id;
        }
        let id = UnicharId(self.id_to_text.len() as u32);
        self.id_to_text.push(text.clone());
        self.text_to_id.insert(text, id);
        if ch == ' ' {
            self.space_id = Some(id);
        }
        id
    }

    pub fn intern_str(&mut self, s: &str) -> Vec<UnicharId> {
        s.chars().map(|c| self.intern(c)).collect()
    }

    pub fn text_of(&self, ids: &[UnicharId]) -> String {
        ids.iter().map(|&id| self.text_for(id)).collect()
    }
}

impl UnicharRepertoire for SimpleUnicharset {
    fn id_for(&self, ch: char) -> Option<UnicharId> {
        self.text_to_id.get(&ch.to_string()).copied()
    }

    fn text_for(&self, id: UnicharId) -> &str {
        self.id_to_text
            .get(id.0 as usize)
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    fn is_space(&self, id: UnicharId) -> bool {
        self.space_id == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_stable_and_round_trips() {
        let mut u = SimpleUnicharset::new();
        let ids = u.intern_str("hi");
        assert_eq!(u.text_of(&ids), "hi");
        let ids2 = u.intern_str("hi");
        assert_eq!(ids, ids2);
    }

    #[test]
    fn space_detection() {
        let mut u = SimpleUnicharset::new();
        let ids = u.intern_str("a b");
        assert!(!u.is_space(ids[0]));
        assert!(u.is_space(ids[1]));
    }
}
