//! Table reconstruction from structure-model detections.
//!
//! The structure model runs on a cropped table region and reports either cells or row
//! and column bands. Cells are grouped into rows with the adaptive row grouping; bands
//! are intersected into cells. Each cell is then read from its own crop and the rows are
//! padded into a rectangular [`TableGrid`].

use crate::layout::{BoundingBox, RowGrouping, group_rows};
use crate::plugins::{HandwritingRecognizer, OcrEngine, SubwordTokenizer};
use crate::text::HandwritingClassifier;
use crate::types::{StructureClass, StructureDetection, TableGrid};
use crate::utils::crop_exact;
use image::DynamicImage;

/// Cell boxes of one table row, left to right. `None` marks a cell whose row and
/// column bands do not overlap.
pub type CellRow = Vec<Option<BoundingBox>>;

/// Arrange structure detections into rows of cell boxes.
///
/// Cell detections take precedence. Without cells, rows × columns are intersected;
/// rows are ordered top-to-bottom and columns left-to-right.
pub fn cell_grid(detections: &[StructureDetection], min_confidence: f64, grouping: RowGrouping) -> Vec<CellRow> {
    let confident = detections.iter().filter(|d| d.confidence >= min_confidence);
    let (mut cells, mut rows, mut columns) = (Vec::new(), Vec::new(), Vec::new());
    for detection in confident {
        match detection.class {
            StructureClass::Cell => cells.push(detection.bbox),
            StructureClass::Row => rows.push(detection.bbox),
            StructureClass::Column => columns.push(detection.bbox),
        }
    }

    if !cells.is_empty() {
        return group_rows(cells, grouping)
            .into_iter()
            .map(|row| row.into_iter().map(Some).collect())
            .collect();
    }

    rows.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));
    columns.sort_by_key(|c| c.x0());
    rows.iter()
        .map(|row| columns.iter().map(|column| row.intersection(column)).collect())
        .collect()
}

/// Read every cell of `rows` from `table` and pad the result into a grid.
///
/// Cells that cannot be cropped contribute an empty string, so no row loses a
/// detected cell.
pub fn reconstruct_table<F>(table: &DynamicImage, rows: &[CellRow], mut read_cell: F) -> TableGrid
where
    F: FnMut(&DynamicImage) -> String,
{
    let texts: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            row.iter()
                .enumerate()
                .map(|(column_index, cell)| {
                    match cell.as_ref().and_then(|bbox| crop_exact(table, bbox)) {
                        Some(crop) => read_cell(&crop),
                        None => {
                            tracing::debug!(row_index, column_index, "skipping cell with empty crop");
                            String::new()
                        }
                    }
                })
                .collect()
        })
        .collect();
    TableGrid::from_rows(texts)
}

/// Reads one cell with OCR, switching to handwriting recognition when the cell text
/// classifies as handwritten.
pub struct CellReader<'a> {
    pub ocr: &'a dyn OcrEngine,
    pub handwriting: &'a dyn HandwritingRecognizer,
    pub tokenizer: &'a dyn SubwordTokenizer,
    pub classifier: &'a HandwritingClassifier,
    pub line_grouping: RowGrouping,
}

impl CellReader<'_> {
    pub fn read(&self, cell: &DynamicImage) -> String {
        let spans = match self.ocr.recognize(cell) {
            Ok(spans) => crate::layout::sort_reading_order(spans, self.line_grouping),
            Err(e) => {
                tracing::warn!(model = self.ocr.name(), error = %e, "cell OCR failed");
                return String::new();
            }
        };
        if spans.is_empty() {
            return String::new();
        }

        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        let ocr_text = texts.join(" ");

        let handwritten = match self.classifier.classify(&texts, self.tokenizer) {
            Ok(script) => script.is_handwritten(),
            Err(e) => {
                tracing::warn!(model = self.tokenizer.name(), error = %e, "cell classification failed");
                false
            }
        };
        if !handwritten {
            return ocr_text;
        }

        match self.handwriting.generate(cell) {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => ocr_text,
            Err(e) => {
                tracing::warn!(model = self.handwriting.name(), error = %e, "cell handwriting recognition failed");
                ocr_text
            }
        }
    }
}
