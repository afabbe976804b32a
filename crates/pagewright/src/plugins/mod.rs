//! Capability seams for the models the pipeline depends on.
//!
//! # Capability Types
//!
//! - [`LayoutDetector`] - page regions with classes and confidences
//! - [`StructureDetector`] - cells or row/column bands inside a table crop
//! - [`OcrEngine`] - line/word text spans with confidences
//! - [`HandwritingRecognizer`] - transcription of single crops, batched per page
//! - [`WordDetector`] - word boxes for re-recognizing handwritten regions
//! - [`VisionFallback`] - last-resort extraction through a vision-capable API
//! - [`KeyValueExtractor`] - structured fields pulled from the finished transcript
//! - [`SubwordTokenizer`] - token counts for the handwriting classifier
//!
//! Capabilities are bundled in [`Capabilities`] and passed to the pipeline explicitly.
//! Expensive models are loaded once through a [`ModelCache`] owned by the caller.
//!
//! ```rust
//! use pagewright::plugins::{Capability, SubwordTokenizer};
//! use pagewright::Result;
//!
//! struct WhitespaceTokenizer;
//!
//! impl Capability for WhitespaceTokenizer {
//!     fn name(&self) -> &str {
//!         "whitespace"
//!     }
//! }
//!
//! impl SubwordTokenizer for WhitespaceTokenizer {
//!     fn count_tokens(&self, text: &str) -> Result<usize> {
//!         Ok(text.split_whitespace().count())
//!     }
//! }
//! ```

pub mod cache;
pub mod traits;

#[cfg(feature = "hf-tokenizer")]
pub mod tokenizer;

#[cfg(feature = "vision-http")]
pub mod generate;
#[cfg(feature = "vision-http")]
pub mod keyvalue;
#[cfg(feature = "vision-http")]
pub mod vision;

pub use cache::ModelCache;
pub use traits::{
    Capability, HandwritingRecognizer, KeyValueExtractor, LayoutDetector, OcrEngine, StructureDetector,
    SubwordTokenizer, VisionFallback, WordDetector,
};

#[cfg(feature = "hf-tokenizer")]
pub use tokenizer::HfTokenizer;

#[cfg(feature = "vision-http")]
pub use generate::GenerateClient;
#[cfg(feature = "vision-http")]
pub use keyvalue::HttpKeyValueExtractor;
#[cfg(feature = "vision-http")]
pub use vision::HttpVisionClient;

use crate::text::WordDictionary;
use std::fmt;
use std::sync::Arc;

/// Every model handle the page pipeline needs.
///
/// The structure detector, word detector, vision fallback and key-value extractor are
/// optional. Without a structure detector no tables are reconstructed. Without a word
/// detector a handwritten region is recognized as a single crop. Without a vision
/// fallback invalid text is kept as-is, and without an extractor no fields are produced.
#[derive(Clone)]
pub struct Capabilities {
    pub layout: Arc<dyn LayoutDetector>,
    pub ocr: Arc<dyn OcrEngine>,
    pub handwriting: Arc<dyn HandwritingRecognizer>,
    pub tokenizer: Arc<dyn SubwordTokenizer>,
    pub dictionary: Arc<WordDictionary>,
    pub structure: Option<Arc<dyn StructureDetector>>,
    pub words: Option<Arc<dyn WordDetector>>,
    pub vision: Option<Arc<dyn VisionFallback>>,
    pub key_values: Option<Arc<dyn KeyValueExtractor>>,
}

impl Capabilities {
    pub fn new(
        layout: Arc<dyn LayoutDetector>,
        ocr: Arc<dyn OcrEngine>,
        handwriting: Arc<dyn HandwritingRecognizer>,
        tokenizer: Arc<dyn SubwordTokenizer>,
        dictionary: Arc<WordDictionary>,
    ) -> Self {
        Self {
            layout,
            ocr,
            handwriting,
            tokenizer,
            dictionary,
            structure: None,
            words: None,
            vision: None,
            key_values: None,
        }
    }

    pub fn with_structure(mut self, structure: Arc<dyn StructureDetector>) -> Self {
        self.structure = Some(structure);
        self
    }

    pub fn with_word_detector(mut self, words: Arc<dyn WordDetector>) -> Self {
        self.words = Some(words);
        self
    }

    pub fn with_vision(mut self, vision: Arc<dyn VisionFallback>) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_key_value_extractor(mut self, extractor: Arc<dyn KeyValueExtractor>) -> Self {
        self.key_values = Some(extractor);
        self
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("layout", &self.layout.name())
            .field("ocr", &self.ocr.name())
            .field("handwriting", &self.handwriting.name())
            .field("tokenizer", &self.tokenizer.name())
            .field("dictionary_words", &self.dictionary.len())
            .field("structure", &self.structure.as_ref().map(|c| c.name().to_string()))
            .field("words", &self.words.as_ref().map(|c| c.name().to_string()))
            .field("vision", &self.vision.as_ref().map(|c| c.name().to_string()))
            .field("key_values", &self.key_values.as_ref().map(|c| c.name().to_string()))
            .finish()
    }
}
