//! Tunable thresholds for the recognition controller.
//!
//! Reference upstream implementation: the many file-scope `BOOL_VAR`/
//! `double_VAR` declarations scattered across `src/ccmain/control.cpp`,
//! `fixspace.cpp`, and `reject.cpp`, collected here into one documented
//! struct the way `libchinese-core`'s `Config` collects its own tunables.

use serde::{Deserialize, Serialize};

/// Which engine(s) `dispatch` tries for a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchMode {
    SequenceOnly,
    LegacyOnly,
    Combined,
}

impl Default for DispatchMode {
    fn default() -> Self {
        DispatchMode::Combined
    }
}

/// All tunable recognition constants, collected the way
/// `libchinese-core::Config` collects its own scoring constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    // --- §4.2 Multi-language Dispatch ---
    /// Ratio a new candidate's rating may exceed the current best's by and
    /// still be preferred, when the new candidate is dictionary-valid and
    /// the current one isn't. Upstream `RATING_RATIO` (control.cpp).
    pub rating_ratio: f32,
    /// Certainty slack granted to the same comparison. Upstream
    /// `CERTAINTY_MARGIN` (control.cpp).
    pub certainty_margin: f32,
    pub dispatch_mode: DispatchMode,

    // --- §4.2.1 X-height re-fit ---
    pub min_refit_xht_fraction: f32,

    // --- §4.3 Diacritic Reassigner ---
    pub max_noise_per_word: usize,
    pub max_noise_per_blob: usize,
    pub noise_cert_factor: f32,
    pub noise_cert_basechar: f32,
    pub noise_cert_disjoint: f32,
    pub noise_cert_punc: f32,

    // --- §4.4 Fuzzy-Space Resolver ---
    pub non_noise_limit: usize,
    pub small_outline: f32,
    /// Fixed-pitch-splitting and `fixspace_thinks_word_done` share this
    /// mode dial, mirroring upstream's overloaded `fixspace` mode flag.
    pub fixspace_mode: u8,
    pub perfect_werds_score: i32,
    /// Credit adjacent punctuation pairs in `eval_word_spacing`.
    pub credit_punctuation_pairs: bool,

    // --- §4.5 Bigram Corrector ---
    pub max_bigram_alternates: usize,

    // --- §4.6 Rejection Engine ---
    pub rejection_mode: u8,
    pub min_sane_x_ht_pixels: i32,
    pub image_border: i32,
    pub quality_rej_pc: f32,
    pub quality_blob_pc: f32,
    pub quality_outline_pc: f32,
    pub quality_char_pc: f32,
    pub suspect_level: u8,

    // --- §5 Concurrency ---
    pub parallel_preclassify: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            rating_ratio: 1.5,
            certainty_margin: 5.5,
            dispatch_mode: DispatchMode::default(),

            min_refit_xht_fraction: 0.5,

            max_noise_per_word: 16,
            max_noise_per_blob: 8,
            noise_cert_factor: 0.375,
            noise_cert_basechar: -8.0,
            noise_cert_disjoint: -2.5,
            noise_cert_punc: -2.5,

            non_noise_limit: 1,
            small_outline: 0.28,
            fixspace_mode: 1,
            perfect_werds_score: 999,
            credit_punctuation_pairs: false,

            max_bigram_alternates: 4,

            rejection_mode: 5,
            min_sane_x_ht_pixels: 8,
            image_border: 2,
            quality_rej_pc: 0.08,
            quality_blob_pc: 0.0,
            quality_outline_pc: 1.0,
            quality_char_pc: 0.95,
            suspect_level: 2,

            parallel_preclassify: false,
        }
    }
}

impl RecognitionConfig {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_constants() {
        let cfg = RecognitionConfig::default();
        assert_eq!(cfg.rating_ratio, 1.5);
        assert_eq!(cfg.certainty_margin, 5.5);
        assert_eq!(cfg.max_noise_per_word, 16);
        assert_eq!(cfg.max_noise_per_blob, 8);
        assert_eq!(cfg.min_sane_x_ht_pixels, 8);
        assert_eq!(cfg.image_border, 2);
    }

    #[test]
    fn toml_round_trip() {
        let cfg = RecognitionConfig::default();
        let s = cfg.to_toml_string().unwrap();
        let back = RecognitionConfig::from_toml_str(&s).unwrap();
        assert_eq!(back.rating_ratio, cfg.rating_ratio);
        assert_eq!(back.suspect_level, cfg.suspect_level);
    }
}
