//! `PassContext`/`PassStats`: the explicit threaded state replacing the
//! legacy singleton's per-page mutables.
//!
//! Reference upstream implementation: `tesseractclass.h`'s `Tesseract`
//! instance members `most_recently_used_`, and the per-page accumulators
//! threaded through `control.cpp`/`reject.cpp`'s quality-based rejection
//! (`STATS` members of `Tesseract`). Here they are fields of a value
//! threaded through `recognize_all_words` rather than state owned by a
//! singleton.

use crate::ids::LanguageId;
use std::time::Instant;

/// Running totals feeding the document-quality ratios, accumulated
/// pass-by-pass and read once at the document rejection pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassStats {
    pub char_count: u64,
    pub reject_count: u64,
    pub blob_quality_sum: f64,
    pub outline_error_count: u64,
    pub char_quality_sum: f64,
    pub good_char_quality_sum: f64,
}

impl PassStats {
    pub fn accumulate_word(
        &mut self,
        char_count: usize,
        reject_count: usize,
        blob_quality: f64,
        outline_errors: usize,
        char_quality: f64,
        good_char_quality: f64,
    ) {
        self.char_count += char_count as u64;
        self.reject_count += reject_count as u64;
        self.blob_quality_sum += blob_quality;
        self.outline_error_count += outline_errors as u64;
        self.char_quality_sum += char_quality;
        self.good_char_quality_sum += good_char_quality;
    }

    pub fn rej_pc(&self) -> f64 {
        ratio(self.reject_count as f64, self.char_count)
    }

    pub fn blob_pc(&self) -> f64 {
        ratio(self.blob_quality_sum, self.char_count)
    }

    pub fn outline_pc(&self) -> f64 {
        ratio(self.outline_error_count as f64, self.char_count)
    }

    pub fn char_pc(&self) -> f64 {
        ratio(self.char_quality_sum, self.char_count)
    }
}

fn ratio(numerator: f64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

/// The per-page state threaded through `recognize_all_words`, replacing
/// process-wide mutables with an explicit value.
pub struct PassContext {
    /// Most-recently-successful language, read at the top of the "order of
    /// tries" rule in `dispatch` and updated after every successful
    /// dispatch.
    pub mru_language: LanguageId,
    pub stats: PassStats,
    /// The suspect-level downgrade dial (0-3).
    pub suspect_level: u8,
    pub deadline: Option<Instant>,
}

impl PassContext {
    pub fn new(suspect_level: u8, deadline: Option<Instant>) -> Self {
        PassContext {
            mru_language: LanguageId::PRIMARY,
            stats: PassStats::default(),
            suspect_level,
            deadline,
        }
    }

    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_ratios_guard_against_zero_chars() {
        let stats = PassStats::default();
        assert_eq!(stats.rej_pc(), 0.0);
        assert_eq!(stats.char_pc(), 0.0);
    }

    #[test]
    fn accumulate_and_compute_ratios() {
        let mut stats = PassStats::default();
        stats.accumulate_word(4, 1, 3.0, 0, 3.8, 3.0);
        assert!((stats.rej_pc() - 0.25).abs() < 1e-9);
        assert!((stats.char_pc() - 0.95).abs() < 1e-9);
    }
}
