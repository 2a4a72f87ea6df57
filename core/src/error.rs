//! Error taxonomy for the recognition controller.
//!
//! The teacher crate has no custom error enum of its own (`UserDict` returns concrete `Result<T,
//! redb::Error>`; `WordBigram`/`NGramModel` return `anyhow::Result`); this
//! follows the same split rather than reaching for `thiserror`.

use crate::ids::WordId;

/// Errors that can terminate recognition outright (`InvariantViolation`,
/// `ResourceUnavailable`) or that are recorded for a single word without
/// unwinding (`ClassifierFailure`, `DecodeFailure`).
///
/// `DictionaryValidationFailure` and `Cancelled` are deliberately not
/// variants here: the former only ever changes a permuter
/// tag, and the latter is reported through `recognize_all_words`'s `bool`
/// return, not as an `Err`.
#[derive(Debug)]
pub enum OcrError {
    /// A word the classifier could not process. Recoverable: the caller
    /// still gets a `tess_failed=true` word with a fake best_choice.
    ClassifierFailure {
        word: WordId,
        source: Option<anyhow::Error>,
    },
    /// Text could not be encoded in the active unicharset.
    DecodeFailure { text: String },
    /// A required language data component is missing at initialization.
    ResourceUnavailable { component: &'static str },
    /// An internal consistency check failed. Must never be masked.
    InvariantViolation { message: String },
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrError::ClassifierFailure { word, source } => {
                write!(f, "classifier failure on word {word}")?;
                if let Some(source) = source {
                    write!(f, ": {source}")?;
                }
                Ok(())
            }
            OcrError::DecodeFailure { text } => {
                write!(f, "cannot encode {text:?} in the active unicharset")
            }
            OcrError::ResourceUnavailable { component } => {
                write!(f, "required language data component missing: {component}")
            }
            OcrError::InvariantViolation { message } => {
                write!(f, "invariant violated: {message}")
            }
        }
    }
}

impl std::error::Error for OcrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OcrError::ClassifierFailure { source: Some(e), .. } => Some(e.as_ref()),
            _ => None,
        }
    }
}

pub type OcrResult<T> = std::result::Result<T, OcrError>;

/// Raises an `InvariantViolation` in release builds; panics (via
/// `debug_assert!`) in debug builds so violations are caught loudly in
/// tests, but a long-running embedder never sees the process die over a
/// single bad page.
#[macro_export]
macro_rules! invariant {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            debug_assert!($cond, $($arg)*);
            return Err($crate::error::OcrError::InvariantViolation {
                message: format!($($arg)*),
            });
        }
    };
}
