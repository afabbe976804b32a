//! Pagewright - Document Page Layout and OCR Consolidation
//!
//! Pagewright turns the noisy, independently produced outputs of several document
//! models (layout detector, OCR engine, handwriting recognizer, table structure model,
//! vision fallback) into one ordered, classified transcript per page plus the page's
//! tables.
//!
//! # Quick Start
//!
//! ```rust
//! use pagewright::layout::{ClassThresholds, RowGrouping, assemble_reading_order, filter_regions};
//! use pagewright::{BoundingBox, Detection, LayoutClass};
//!
//! # fn main() -> pagewright::Result<()> {
//! let detections = vec![
//!     Detection::new(BoundingBox::new(0, 0, 100, 100)?, LayoutClass::Table, 0.9),
//!     Detection::new(BoundingBox::new(10, 10, 50, 50)?, LayoutClass::PlainText, 0.8),
//!     Detection::new(BoundingBox::new(200, 0, 300, 50)?, LayoutClass::PlainText, 0.7),
//! ];
//!
//! let kept = filter_regions(detections, &ClassThresholds::default(), 0.5);
//! let ordered = assemble_reading_order(kept, RowGrouping::adaptive());
//! assert_eq!(ordered.len(), 2);
//! assert_eq!(ordered[0].detection.class, LayoutClass::Table);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Layout** (`layout`): box geometry, detection filtering, reading order
//! - **Text** (`text`): handwriting classification, dictionary validity, fuzzy matching, form fields
//! - **OCR** (`ocr`): recognition plans, span patching, batched recognition, tables
//! - **Plugins** (`plugins`): capability traits, model cache, HTTP vision client, tokenizer
//! - **Core** (`core`): configuration, the page pipeline, progress reporting

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod layout;
pub mod ocr;
pub mod plugins;
pub mod text;
pub mod types;
pub mod utils;

pub use error::{PagewrightError, Result};
pub use types::*;

pub use core::config::{
    ClassifierConfig, KeyValueConfig, LayoutConfig, PipelineConfig, ReadingOrderConfig, ReconcilerConfig, TableConfig,
    VisionConfig,
};
pub use core::pipeline::PagePipeline;
pub use core::progress::{NoProgress, PageProgress, ProgressObserver};

pub use layout::BoundingBox;
pub use ocr::RecognitionPlan;
pub use plugins::{Capabilities, ModelCache};
pub use text::{FormProfile, HandwritingClassifier, RegexFieldExtractor, WordDictionary, check_text_validity};
