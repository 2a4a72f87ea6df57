//! External classifier collaborators and the tagged dispatch
//! variant replacing the legacy dual-path virtual-dispatch cascade
//!.
//!
//! Reference upstream implementation: `classify/classify.h`'s
//! `Classify::AdaptiveClassifyWord` (legacy segmentation-search path) and
//! `lstm/lstmrecognizer.h` (sequence path), unified behind
//! `tesseractclass.h`'s `Tesseract::classify_word_and_language`.

use crate::ids::UnicharId;
use crate::word::{BestChoice, Blob, RatingsMatrix, WordResult};

/// A single classified blob span, as returned by `LegacyClassifier::classify_blob`.
#[derive(Debug, Clone)]
pub struct BlobChoice {
    pub unichar: UnicharId,
    pub rating: f32,
    pub certainty: f32,
}

/// The segmentation-search classifier.
/// Out of scope here: the chopper and segmentation search internals live
/// behind this trait.
pub trait LegacyClassifier: Sync {
    /// Classify a whole word, populating its ratings matrix and returning
    /// the chosen best_choice, alternates, and acceptance flags.
    fn classify_word(
        &self,
        word: &WordResult,
    ) -> ClassifyWordOutput;

    /// Classify a single blob in isolation, used by the diacritic reassigner
    /// and the parallel pre-classification stage.
    fn classify_blob(&self, blob: &Blob) -> Vec<BlobChoice>;
}

#[derive(Debug, Clone, Default)]
pub struct ClassifyWordOutput {
    pub best_choice: BestChoice,
    pub alternates: Vec<BestChoice>,
    pub ratings: RatingsMatrix,
    pub tess_accepted: bool,
    pub tess_would_adapt: bool,
}

/// One recognized word span as emitted by a line-level sequence recognizer;
/// a single input word may yield several of these.
#[derive(Debug, Clone)]
pub struct SequenceWord {
    pub best_choice: BestChoice,
    pub alternates: Vec<BestChoice>,
    pub space_certainty: f32,
}

/// The confidence scale factor applied to align sequence-recognizer
/// certainties with legacy certainty ranges.
pub const SEQUENCE_CERTAINTY_SCALE: f32 = 7.0;

/// The neural sequence line recognizer.
/// Its internals are not modeled; only this narrow trait is exposed.
pub trait SequenceRecognizer {
    /// Recognize a line image, returning zero or more words. Returns an
    /// empty vec on failure.
    fn recognize_line(
        &self,
        word: &WordResult,
        threshold: f32,
        certainty_cutoff: f32,
        invert: bool,
    ) -> Vec<SequenceWord>;
}

/// The image a `WordResult`'s geometry was derived from.
pub trait ImageProvider {
    /// Best-available-depth image; never color-mapped.
    fn best_pix(&self) -> &[u8];
    fn image_width(&self) -> u32;
    fn image_height(&self) -> u32;
    /// DPI after any scaling already applied upstream.
    fn source_resolution(&self) -> u32;
}

/// Produces the initial Block→Row→Word layout; out of scope here, consumed
/// only through this narrow interface.
pub trait LayoutSource {
    fn produce_page(&self, image: &dyn ImageProvider) -> crate::page::PageResult;
}

/// A tagged dispatch variant, replacing deep virtual dispatch across
/// "classifier kinds" with data: callers match on this instead of relying
/// on trait-object polymorphism for the retry cascade.
pub enum Classifier<'a> {
    Legacy(&'a dyn LegacyClassifier),
    Sequence(&'a dyn SequenceRecognizer),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::Blob;

    struct FakeLegacy;
    impl LegacyClassifier for FakeLegacy {
        fn classify_word(&self, _word: &WordResult) -> ClassifyWordOutput {
            ClassifyWordOutput::default()
        }
        fn classify_blob(&self, _blob: &Blob) -> Vec<BlobChoice> {
            vec![]
        }
    }

    #[test]
    fn classifier_variant_dispatches_by_tag() {
        let legacy = FakeLegacy;
        let c = Classifier::Legacy(&legacy);
        match c {
            Classifier::Legacy(_) => {}
            Classifier::Sequence(_) => panic!("wrong variant"),
        }
    }
}
