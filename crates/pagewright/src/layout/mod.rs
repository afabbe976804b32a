//! Region geometry, detection filtering and reading-order assembly.
//!
//! - [`geometry`]: the validated [`BoundingBox`] and its area/containment/IoU primitives
//! - [`filter`]: per-class thresholds, NMS and containment removal over raw detections
//! - [`reading_order`]: row grouping and left-to-right ordering of regions, words and lines

pub mod filter;
pub mod geometry;
pub mod reading_order;

pub use filter::{ClassThresholds, filter_regions, nms};
pub use geometry::{BoundingBox, area, contains, iou};
pub use reading_order::{RowGrouping, assemble_reading_order, group_rows, sort_reading_order};

use crate::types::{Detection, ScoredBox, StructureDetection, TextSpan};

/// Anything that occupies a box on the page.
pub trait Positioned {
    fn bbox(&self) -> &BoundingBox;
}

/// A positioned item carrying a detector score, the input to suppression.
pub trait Scored: Positioned {
    fn confidence(&self) -> f64;
}

impl Positioned for BoundingBox {
    fn bbox(&self) -> &BoundingBox {
        self
    }
}

impl Positioned for Detection {
    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

impl Scored for Detection {
    fn confidence(&self) -> f64 {
        self.confidence
    }
}

impl Positioned for ScoredBox {
    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

impl Scored for ScoredBox {
    fn confidence(&self) -> f64 {
        self.confidence
    }
}

impl Positioned for TextSpan {
    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

impl Scored for TextSpan {
    fn confidence(&self) -> f64 {
        self.confidence
    }
}

impl Positioned for StructureDetection {
    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

impl Scored for StructureDetection {
    fn confidence(&self) -> f64 {
        self.confidence
    }
}

impl<T: Positioned> Positioned for &T {
    fn bbox(&self) -> &BoundingBox {
        (**self).bbox()
    }
}
