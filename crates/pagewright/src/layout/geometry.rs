//! Axis-aligned box primitives shared by filtering, ordering and cropping.

use crate::{PagewrightError, Result};
use serde::{Deserialize, Serialize};

/// Integer page-space rectangle `(x0, y0, x1, y1)` with `x1 > x0` and `y1 > y0`.
///
/// The constructor is the only way to obtain a box, so every `BoundingBox` in the
/// crate has a strictly positive width and height. Deserialization goes through the
/// same check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

impl BoundingBox {
    /// Create a box, rejecting non-positive width or height.
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Result<Self> {
        if x1 <= x0 {
            return Err(PagewrightError::invalid_box(x0, y0, x1, y1, "non-positive width"));
        }
        if y1 <= y0 {
            return Err(PagewrightError::invalid_box(x0, y0, x1, y1, "non-positive height"));
        }
        Ok(Self { x0, y0, x1, y1 })
    }

    /// Create a box from floating-point model output, truncating toward zero the way
    /// detectors' `xyxy` tensors are usually cast.
    pub fn from_f32(x0: f32, y0: f32, x1: f32, y1: f32) -> Result<Self> {
        Self::new(x0 as i32, y0 as i32, x1 as i32, y1 as i32)
    }

    /// Axis-aligned hull of a polygon, as emitted by OCR engines that report
    /// quadrilaterals instead of rectangles.
    pub fn from_points(points: &[(f32, f32)]) -> Result<Self> {
        if points.is_empty() {
            return Err(PagewrightError::validation("cannot build a box from zero points"));
        }
        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for &(x, y) in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Self::from_f32(min_x, min_y, max_x, max_y)
    }

    pub fn x0(&self) -> i32 {
        self.x0
    }

    pub fn y0(&self) -> i32 {
        self.y0
    }

    pub fn x1(&self) -> i32 {
        self.x1
    }

    pub fn y1(&self) -> i32 {
        self.y1
    }

    /// Extent along x; fits in `u32` for any valid box.
    pub fn width(&self) -> u32 {
        self.x1.abs_diff(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.abs_diff(self.y0)
    }

    /// `(x1 - x0) * (y1 - y0)`. Always positive.
    pub fn area(&self) -> f64 {
        f64::from(self.width()) * f64::from(self.height())
    }

    pub fn center_x(&self) -> f64 {
        (f64::from(self.x0) + f64::from(self.x1)) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (f64::from(self.y0) + f64::from(self.y1)) / 2.0
    }

    /// True iff `inner` lies within `self` with inclusive bounds. A box contains itself.
    pub fn contains(&self, inner: &BoundingBox) -> bool {
        inner.x0 >= self.x0 && inner.x1 <= self.x1 && inner.y0 >= self.y0 && inner.y1 <= self.y1
    }

    /// Area of the overlap, zero when the boxes are disjoint or only touch.
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let ix0 = self.x0.max(other.x0);
        let iy0 = self.y0.max(other.y0);
        let ix1 = self.x1.min(other.x1);
        let iy1 = self.y1.min(other.y1);
        let w = (i64::from(ix1) - i64::from(ix0)).max(0);
        let h = (i64::from(iy1) - i64::from(iy0)).max(0);
        w as f64 * h as f64
    }

    /// Overlapping rectangle, if the boxes share positive area.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        BoundingBox::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        )
        .ok()
    }

    /// Intersection over union; 0 for disjoint boxes.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let intersection = self.intersection_area(other);
        let union = self.area() + other.area() - intersection;
        if union > 0.0 { intersection / union } else { 0.0 }
    }

    /// Grow the box by `padding` on every side, clamped to `[0, width) x [0, height)`.
    ///
    /// Returns `None` when the clamped box has no area, i.e. it lies outside the image.
    pub fn expand_within(&self, padding: u32, width: u32, height: u32) -> Option<BoundingBox> {
        let pad = i32::try_from(padding).unwrap_or(i32::MAX);
        let max_x = i32::try_from(width).unwrap_or(i32::MAX);
        let max_y = i32::try_from(height).unwrap_or(i32::MAX);
        BoundingBox::new(
            self.x0.saturating_sub(pad).max(0),
            self.y0.saturating_sub(pad).max(0),
            self.x1.saturating_add(pad).min(max_x),
            self.y1.saturating_add(pad).min(max_y),
        )
        .ok()
    }
}

impl TryFrom<[i32; 4]> for BoundingBox {
    type Error = PagewrightError;

    fn try_from(value: [i32; 4]) -> Result<Self> {
        Self::new(value[0], value[1], value[2], value[3])
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}

/// Free-function form of [`BoundingBox::area`].
pub fn area(b: &BoundingBox) -> f64 {
    b.area()
}

/// Free-function form of [`BoundingBox::contains`].
pub fn contains(outer: &BoundingBox, inner: &BoundingBox) -> bool {
    outer.contains(inner)
}

/// Free-function form of [`BoundingBox::iou`].
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    a.iou(b)
}
