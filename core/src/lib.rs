//! ocr-recognition-controller
//!
//! Page-level OCR recognition controller: pass orchestration, multi-language
//! dispatch, diacritic reassignment, fuzzy-space resolution, bigram
//! correction, and rejection scoring over an already-segmented page.
//!
//! Out of scope (see `pass.rs`, `classifier.rs`): thresholding, connected
//! component extraction, the segmentation-search chopper, and the sequence
//! recognizer's own internals. Those are consumed only through the
//! `LegacyClassifier`/`SequenceRecognizer`/`LayoutSource`/`ImageProvider`
//! trait boundaries in `classifier.rs`.
//!
//! Public API:
//! - `PageResult` / `WordResult` - the recognized-page data model
//! - `RecognitionConfig` - tunable thresholds
//! - `recognize_all_words` - the pass orchestrator entry point
//! - `LanguageDataBundle` - persisted language data

pub mod ids;
pub use ids::{LanguageId, UnicharId, WordId};

pub mod unichar;
pub use unichar::{SimpleUnicharset, UnicharRepertoire};

pub mod error;
pub use error::{OcrError, OcrResult};

pub mod config;
pub use config::{DispatchMode, RecognitionConfig};

pub mod monitor;
pub use monitor::{DeadlineMonitor, Monitor, NullMonitor};

pub mod pass_context;
pub use pass_context::{PassContext, PassStats};

pub mod reject;
pub use reject::{RejectEntry, RejectMap, RejectReason};

pub mod word;
pub use word::{
    BestChoice, BlamerBundle, Blob, CharChoice, PermuterTag, RatingsMatrix, ScriptPos, WordFlags,
    WordResult,
};

pub mod page;
pub use page::{Block, PageCursor, PageIterator, PageResult, Row};

pub mod dictionary;
pub use dictionary::{AcceptableWord, AmbigEntry, AmbigType, AmbiguityTable, DictionaryOracle};

pub mod classifier;
pub use classifier::{
    BlobChoice, Classifier, ClassifyWordOutput, ImageProvider, LayoutSource, LegacyClassifier,
    SequenceRecognizer, SequenceWord, SEQUENCE_CERTAINTY_SCALE,
};

pub mod diacritic;
pub use diacritic::{reassign_diacritics, DiacriticOutcome};

pub mod fuzzy_space;
pub use fuzzy_space::{fix_fuzzy_spaces, UnicharRepertoireRef};

pub mod bigram;
pub use bigram::correct_bigram;

pub mod rejection;

pub mod dispatch;
pub use dispatch::{classify_word_and_language, XHeightRefit};

pub mod pass;
pub use pass::{recognize_all_words, DoPasses, RecognitionEnv};

pub mod bundle;
pub use bundle::{BundleEntry, BundleError, EntryKind, LanguageDataBundle};

/// Small, free-standing conversion helpers at the boundary between this
/// crate's internal `UnicharId` representation and external `char`/`str`
/// text, mirroring the teacher's `utils::normalize` surface rather than a
/// heavyweight trait hierarchy.
pub mod utils {
    /// Normalize input strings (NFC) and trim whitespace.
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }
}
