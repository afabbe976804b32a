//! Data model shared by every pipeline stage.
//!
//! All values are created per page and never mutated after construction; stages
//! consume them by reference and return new values.

use crate::layout::BoundingBox;
use crate::{PagewrightError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Region classes emitted by the layout detector, in the detector's id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutClass {
    Title,
    PlainText,
    Abandon,
    Figure,
    FigureCaption,
    Table,
    TableCaption,
    TableFootnote,
    Formula,
    FormulaCaption,
}

impl LayoutClass {
    pub const ALL: [LayoutClass; 10] = [
        LayoutClass::Title,
        LayoutClass::PlainText,
        LayoutClass::Abandon,
        LayoutClass::Figure,
        LayoutClass::FigureCaption,
        LayoutClass::Table,
        LayoutClass::TableCaption,
        LayoutClass::TableFootnote,
        LayoutClass::Formula,
        LayoutClass::FormulaCaption,
    ];

    /// Map the detector's numeric class id.
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn id(&self) -> u32 {
        *self as u32
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutClass::Title => "Title",
            LayoutClass::PlainText => "PlainText",
            LayoutClass::Abandon => "Abandon",
            LayoutClass::Figure => "Figure",
            LayoutClass::FigureCaption => "FigureCaption",
            LayoutClass::Table => "Table",
            LayoutClass::TableCaption => "TableCaption",
            LayoutClass::TableFootnote => "TableFootnote",
            LayoutClass::Formula => "Formula",
            LayoutClass::FormulaCaption => "FormulaCaption",
        }
    }
}

impl fmt::Display for LayoutClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutClass {
    type Err = PagewrightError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| PagewrightError::validation(format!("Unknown layout class: '{}'", s)))
    }
}

/// A classified region produced by the layout detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class: LayoutClass,
    pub confidence: f64,
}

impl Detection {
    pub fn new(bbox: BoundingBox, class: LayoutClass, confidence: f64) -> Self {
        Self {
            bbox,
            class,
            confidence,
        }
    }
}

/// A detection placed in page reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedRegion {
    pub detection: Detection,
    pub sequence_index: usize,
}

/// One line or word recognized by the OCR engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub bbox: BoundingBox,
    pub text: String,
    pub confidence: f64,
}

impl TextSpan {
    pub fn new(bbox: BoundingBox, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            bbox,
            text: text.into(),
            confidence,
        }
    }
}

/// A class-less box with a score, as produced by word-level detectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredBox {
    pub bbox: BoundingBox,
    pub confidence: f64,
}

/// Element kinds reported by the table structure model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureClass {
    Cell,
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureDetection {
    pub bbox: BoundingBox,
    pub class: StructureClass,
    pub confidence: f64,
}

/// Printed-vs-handwritten verdict for a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Script {
    Printed,
    Handwritten,
}

impl Script {
    pub fn is_handwritten(&self) -> bool {
        matches!(self, Script::Handwritten)
    }

    /// `0` for printed, `1` for handwritten.
    pub fn as_flag(&self) -> u8 {
        match self {
            Script::Printed => 0,
            Script::Handwritten => 1,
        }
    }
}

/// Which path produced a region's final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Ocr,
    HandwritingPatch,
    RegionRecognition,
    VisionFallback,
    Empty,
}

/// Final text for one ordered region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTranscript {
    pub region_id: usize,
    pub class: LayoutClass,
    pub bbox: BoundingBox,
    pub text: String,
    pub is_handwritten: bool,
    pub source: TextSource,
}

/// Ordered per-region transcript of a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTranscript {
    pub regions: Vec<RegionTranscript>,
}

impl PageTranscript {
    /// Build from regions in any order; the result is sorted by `region_id`.
    pub fn from_regions(mut regions: Vec<RegionTranscript>) -> Self {
        regions.sort_by_key(|r| r.region_id);
        Self { regions }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Region texts joined by newlines in reading order, skipping empty regions.
    pub fn text(&self) -> String {
        self.regions
            .iter()
            .map(|r| r.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Rectangular table of cell strings; every row has the same column count.
///
/// Deserialized grids are padded through [`TableGrid::from_rows`] like any other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTableGrid")]
pub struct TableGrid {
    rows: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct RawTableGrid {
    #[serde(default)]
    rows: Vec<Vec<String>>,
}

impl From<RawTableGrid> for TableGrid {
    fn from(raw: RawTableGrid) -> Self {
        Self::from_rows(raw.rows)
    }
}

impl TableGrid {
    /// Pad ragged rows with empty strings up to the widest row. Never truncates.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        let max_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(max_cols, String::new());
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pipe table with the first row as header.
    pub fn to_markdown(&self) -> String {
        let Some((header, body)) = self.rows.split_first() else {
            return String::new();
        };
        if header.is_empty() {
            return String::new();
        }

        let escape = |cell: &str| cell.replace('|', "\\|").replace('\n', " ");
        let mut out = String::new();
        out.push_str("| ");
        out.push_str(&header.iter().map(|c| escape(c)).collect::<Vec<_>>().join(" | "));
        out.push_str(" |\n|");
        out.push_str(&vec![" --- "; header.len()].join("|"));
        out.push_str("|\n");
        for row in body {
            out.push_str("| ");
            out.push_str(&row.iter().map(|c| escape(c)).collect::<Vec<_>>().join(" | "));
            out.push_str(" |\n");
        }
        out
    }
}

/// Named fields extracted from a transcript. Fields a profile names but cannot find are `null`.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Everything the pipeline produces for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub transcript: PageTranscript,
    pub tables: Vec<TableGrid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_values: Option<FieldMap>,
}
