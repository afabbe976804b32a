//! OCR consolidation: reconciling OCR spans with handwriting recognition, and
//! rebuilding tables from structure detections.

pub mod reconcile;
pub mod table;

pub use reconcile::{
    RecognitionPlan, Validated, join_lines, join_words, order_lines, patch_spans, recognize_batched, select_words,
    validate_or_fallback,
};
pub use table::{CellReader, CellRow, cell_grid, reconstruct_table};
