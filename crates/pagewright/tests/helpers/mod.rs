//! Scripted model doubles shared by the integration tests.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pagewright::plugins::{
    Capability, HandwritingRecognizer, KeyValueExtractor, LayoutDetector, OcrEngine, StructureDetector,
    SubwordTokenizer, VisionFallback, WordDetector,
};
use pagewright::{
    BoundingBox, Capabilities, Detection, FieldMap, LayoutClass, PagewrightError, Result, ScoredBox,
    StructureDetection, TextSpan, WordDictionary,
};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Route pipeline logs to the test harness. `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pagewright=debug")),
        )
        .with_test_writer()
        .try_init();
}

pub const PAGE_WIDTH: u32 = 400;
pub const PAGE_HEIGHT: u32 = 300;

pub fn bx(x0: i32, y0: i32, x1: i32, y1: i32) -> BoundingBox {
    BoundingBox::new(x0, y0, x1, y1).unwrap()
}

pub fn page() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, Rgb([255, 255, 255])))
}

pub fn page_png() -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    page().write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

pub fn region(x0: i32, y0: i32, x1: i32, y1: i32, class: LayoutClass) -> Detection {
    Detection::new(bx(x0, y0, x1, y1), class, 0.9)
}

pub fn span(y0: i32, text: &str, confidence: f64) -> TextSpan {
    TextSpan::new(bx(0, y0, 100, y0 + 20), text, confidence)
}

pub fn dictionary() -> WordDictionary {
    WordDictionary::from_words([
        "the", "cat", "sat", "on", "mat", "name", "qty", "bolt", "four", "a", "dog",
    ])
}

pub struct ScriptedLayout {
    detections: Option<Vec<Detection>>,
    pub calls: AtomicUsize,
}

impl ScriptedLayout {
    pub fn returning(detections: Vec<Detection>) -> Arc<Self> {
        Arc::new(Self {
            detections: Some(detections),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            detections: None,
            calls: AtomicUsize::new(0),
        })
    }
}

impl Capability for ScriptedLayout {
    fn name(&self) -> &str {
        "scripted-layout"
    }
}

impl LayoutDetector for ScriptedLayout {
    fn detect(&self, _image: &DynamicImage, _confidence: f64, _iou: f64) -> Result<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.detections
            .clone()
            .ok_or_else(|| PagewrightError::model("scripted-layout", "weights not loaded"))
    }
}

type OcrScript = dyn Fn(u32, u32) -> Result<Vec<TextSpan>> + Send + Sync;

/// OCR double keyed on crop size, so each region or cell can be scripted separately.
pub struct ScriptedOcr {
    script: Box<OcrScript>,
    pub calls: AtomicUsize,
}

impl ScriptedOcr {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(u32, u32) -> Result<Vec<TextSpan>> + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn constant(spans: Vec<TextSpan>) -> Arc<Self> {
        Self::new(move |_, _| Ok(spans.clone()))
    }
}

impl Capability for ScriptedOcr {
    fn name(&self) -> &str {
        "scripted-ocr"
    }
}

impl OcrEngine for ScriptedOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextSpan>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.script)(image.width(), image.height())
    }
}

/// Handwriting double that pops one scripted text per crop.
pub struct ScriptedHandwriting {
    texts: Mutex<Vec<String>>,
    fail: bool,
    pub batch_calls: AtomicUsize,
    pub crops_seen: AtomicUsize,
}

impl ScriptedHandwriting {
    pub fn returning(texts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            texts: Mutex::new(texts.iter().rev().map(|t| t.to_string()).collect()),
            fail: false,
            batch_calls: AtomicUsize::new(0),
            crops_seen: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            texts: Mutex::new(Vec::new()),
            fail: true,
            batch_calls: AtomicUsize::new(0),
            crops_seen: AtomicUsize::new(0),
        })
    }
}

impl Capability for ScriptedHandwriting {
    fn name(&self) -> &str {
        "scripted-htr"
    }
}

impl HandwritingRecognizer for ScriptedHandwriting {
    fn generate(&self, _crop: &DynamicImage) -> Result<String> {
        if self.fail {
            return Err(PagewrightError::model("scripted-htr", "out of memory"));
        }
        Ok(self.texts.lock().unwrap().pop().unwrap_or_default())
    }

    fn generate_batch(&self, crops: &[DynamicImage]) -> Result<Vec<String>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.crops_seen.fetch_add(crops.len(), Ordering::SeqCst);
        crops.iter().map(|crop| self.generate(crop)).collect()
    }
}

/// Known words are one token; anything else costs one token per character.
pub struct VocabTokenizer {
    vocab: WordDictionary,
}

impl VocabTokenizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { vocab: dictionary() })
    }
}

impl Capability for VocabTokenizer {}

impl SubwordTokenizer for VocabTokenizer {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(text
            .split_whitespace()
            .map(|w| if self.vocab.contains(w) { 1 } else { w.chars().count() })
            .sum())
    }
}

pub struct ScriptedVision {
    text: Option<String>,
    pub calls: AtomicUsize,
}

impl ScriptedVision {
    pub fn returning(text: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            text: text.map(str::to_string),
            calls: AtomicUsize::new(0),
        })
    }
}

impl Capability for ScriptedVision {}

impl VisionFallback for ScriptedVision {
    fn extract(&self, _image: &DynamicImage) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text.clone()
    }
}

/// Key-value extractor that records every transcript it is given.
pub struct ScriptedKeyValues {
    fields: FieldMap,
    pub texts: Mutex<Vec<String>>,
}

impl ScriptedKeyValues {
    pub fn returning(fields: FieldMap) -> Arc<Self> {
        Arc::new(Self {
            fields,
            texts: Mutex::new(Vec::new()),
        })
    }
}

impl Capability for ScriptedKeyValues {}

impl KeyValueExtractor for ScriptedKeyValues {
    fn extract_fields(&self, text: &str) -> Option<FieldMap> {
        self.texts.lock().unwrap().push(text.to_string());
        Some(self.fields.clone())
    }
}

pub struct ScriptedWords {
    words: Vec<ScoredBox>,
}

impl ScriptedWords {
    pub fn returning(words: Vec<ScoredBox>) -> Arc<Self> {
        Arc::new(Self { words })
    }
}

impl Capability for ScriptedWords {}

impl WordDetector for ScriptedWords {
    fn detect_words(&self, _region: &DynamicImage) -> Result<Vec<ScoredBox>> {
        Ok(self.words.clone())
    }
}

pub struct ScriptedStructure {
    detections: Vec<StructureDetection>,
}

impl ScriptedStructure {
    pub fn returning(detections: Vec<StructureDetection>) -> Arc<Self> {
        Arc::new(Self { detections })
    }
}

impl Capability for ScriptedStructure {}

impl StructureDetector for ScriptedStructure {
    fn detect_structure(&self, _table: &DynamicImage) -> Result<Vec<StructureDetection>> {
        Ok(self.detections.clone())
    }
}

pub fn capabilities(
    layout: Arc<ScriptedLayout>,
    ocr: Arc<ScriptedOcr>,
    handwriting: Arc<ScriptedHandwriting>,
) -> Capabilities {
    Capabilities::new(layout, ocr, handwriting, VocabTokenizer::new(), Arc::new(dictionary()))
}
