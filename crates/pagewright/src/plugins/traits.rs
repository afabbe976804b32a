//! Capability traits for the external models the pipeline drives.
//!
//! Each model is a black box with an input/output contract. Implementations must be
//! `Send + Sync`: region work runs on a thread pool and capabilities are shared behind
//! `Arc`.

use crate::Result;
use crate::types::{Detection, FieldMap, ScoredBox, StructureDetection, TextSpan};
use image::DynamicImage;

/// Common identity of every capability, used in logs and error messages.
pub trait Capability: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Page layout detector producing classified regions.
pub trait LayoutDetector: Capability {
    /// Detect regions with at least `confidence`, after the model's own NMS at `iou`.
    fn detect(&self, image: &DynamicImage, confidence: f64, iou: f64) -> Result<Vec<Detection>>;
}

/// Table structure recognizer run on a cropped table region.
///
/// Coordinates are relative to the crop. Models may report cells directly or row and
/// column bands; both are handled downstream.
pub trait StructureDetector: Capability {
    fn detect_structure(&self, table: &DynamicImage) -> Result<Vec<StructureDetection>>;
}

/// General-purpose OCR engine emitting line- or word-level spans.
pub trait OcrEngine: Capability {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextSpan>>;
}

/// Handwriting recognition model that transcribes a single cropped line or word.
pub trait HandwritingRecognizer: Capability {
    fn generate(&self, crop: &DynamicImage) -> Result<String>;

    /// Transcribe many crops. The output has one entry per crop, in input order.
    fn generate_batch(&self, crops: &[DynamicImage]) -> Result<Vec<String>> {
        crops.iter().map(|crop| self.generate(crop)).collect()
    }
}

/// Word-level detector used when a handwritten region is re-recognized from scratch.
pub trait WordDetector: Capability {
    fn detect_words(&self, region: &DynamicImage) -> Result<Vec<ScoredBox>>;
}

/// Vision-capable model queried as a last resort.
///
/// Transport, quota and parsing failures are reported as `None`.
pub trait VisionFallback: Capability {
    fn extract(&self, image: &DynamicImage) -> Option<String>;
}

/// Structured key-value extraction from a page transcript.
///
/// Returns `None` when nothing usable could be extracted.
pub trait KeyValueExtractor: Capability {
    fn extract_fields(&self, text: &str) -> Option<FieldMap>;
}

/// Sub-word tokenizer used by the handwriting classifier.
pub trait SubwordTokenizer: Capability {
    fn count_tokens(&self, text: &str) -> Result<usize>;
}
