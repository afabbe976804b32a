//! Reading-order reconstruction.
//!
//! Items are sorted by vertical center, greedily grouped into rows, and each row is
//! sorted by left edge. The same routine orders page regions, detected words inside a
//! region, and OCR lines; only the row threshold differs.

use super::Positioned;
use crate::types::{Detection, LayoutClass, OrderedRegion};

/// How consecutive items are grouped into a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowGrouping {
    /// Join the row when the vertical-center distance to the previous item is below
    /// `max(ratio * previous_height, min_threshold)`.
    Adaptive { ratio: f64, min_threshold: f64 },
    /// Join the row when the vertical-center distance to the row's first item is below
    /// a fixed pixel threshold.
    Fixed(f64),
}

impl RowGrouping {
    /// Word- and region-level grouping: `max(0.7 * h, 10)`.
    pub const fn adaptive() -> Self {
        RowGrouping::Adaptive {
            ratio: 0.7,
            min_threshold: 10.0,
        }
    }

    /// Line-level grouping used when joining OCR spans: 20 px.
    pub const fn lines() -> Self {
        RowGrouping::Fixed(20.0)
    }

    fn same_row<T: Positioned>(&self, row: &[T], candidate: &T) -> bool {
        let center = candidate.bbox().center_y();
        match *self {
            RowGrouping::Adaptive { ratio, min_threshold } => row.last().is_some_and(|prev| {
                let threshold = (ratio * f64::from(prev.bbox().height())).max(min_threshold);
                (center - prev.bbox().center_y()).abs() < threshold
            }),
            RowGrouping::Fixed(threshold) => row
                .first()
                .is_some_and(|anchor| (center - anchor.bbox().center_y()).abs() < threshold),
        }
    }
}

impl Default for RowGrouping {
    fn default() -> Self {
        Self::adaptive()
    }
}

/// Group items into rows, top-to-bottom, each row ordered left-to-right.
///
/// Sorting is stable throughout: items with equal centers or equal left edges keep
/// their input order.
pub fn group_rows<T: Positioned>(mut items: Vec<T>, grouping: RowGrouping) -> Vec<Vec<T>> {
    items.sort_by(|a, b| a.bbox().center_y().total_cmp(&b.bbox().center_y()));

    let mut rows: Vec<Vec<T>> = Vec::new();
    let mut current: Vec<T> = Vec::new();
    for item in items {
        if !current.is_empty() && !grouping.same_row(&current, &item) {
            rows.push(std::mem::take(&mut current));
        }
        current.push(item);
    }
    if !current.is_empty() {
        rows.push(current);
    }

    for row in &mut rows {
        row.sort_by_key(|item| item.bbox().x0());
    }
    rows
}

/// Flatten [`group_rows`] into a single reading order.
pub fn sort_reading_order<T: Positioned>(items: Vec<T>, grouping: RowGrouping) -> Vec<T> {
    group_rows(items, grouping).into_iter().flatten().collect()
}

/// Order a page's filtered detections and assign dense `sequence_index` values.
///
/// `Abandon` regions (headers, footers, page furniture) never receive an index.
pub fn assemble_reading_order(detections: Vec<Detection>, grouping: RowGrouping) -> Vec<OrderedRegion> {
    let content: Vec<Detection> = detections
        .into_iter()
        .filter(|d| d.class != LayoutClass::Abandon)
        .collect();

    sort_reading_order(content, grouping)
        .into_iter()
        .enumerate()
        .map(|(sequence_index, detection)| OrderedRegion {
            detection,
            sequence_index,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BoundingBox;

    fn bx(x0: i32, y0: i32, x1: i32, y1: i32) -> BoundingBox {
        BoundingBox::new(x0, y0, x1, y1).unwrap()
    }

    fn det(x0: i32, y0: i32, x1: i32, y1: i32, class: LayoutClass) -> Detection {
        Detection::new(bx(x0, y0, x1, y1), class, 0.9)
    }

    #[test]
    fn test_side_by_side_regions_share_a_row() {
        let a = det(0, 0, 100, 100, LayoutClass::Table);
        let c = det(200, 0, 300, 50, LayoutClass::PlainText);

        let ordered = assemble_reading_order(vec![c.clone(), a.clone()], RowGrouping::adaptive());
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].detection, a);
        assert_eq!(ordered[0].sequence_index, 0);
        assert_eq!(ordered[1].detection, c);
        assert_eq!(ordered[1].sequence_index, 1);
    }

    #[test]
    fn test_rows_top_to_bottom() {
        let words = vec![
            bx(50, 100, 90, 120),
            bx(0, 0, 40, 20),
            bx(0, 100, 40, 120),
            bx(50, 2, 90, 22),
        ];
        let rows = group_rows(words, RowGrouping::adaptive());
        assert_eq!(
            rows,
            vec![
                vec![bx(0, 0, 40, 20), bx(50, 2, 90, 22)],
                vec![bx(0, 100, 40, 120), bx(50, 100, 90, 120)],
            ]
        );
    }

    #[test]
    fn test_adaptive_threshold_has_floor() {
        // Height 4 gives 2.8 px, raised to the 10 px floor.
        let words = vec![bx(0, 0, 10, 4), bx(20, 8, 30, 12)];
        assert_eq!(group_rows(words, RowGrouping::adaptive()).len(), 1);

        let words = vec![bx(0, 0, 10, 4), bx(20, 12, 30, 16)];
        assert_eq!(group_rows(words, RowGrouping::adaptive()).len(), 2);
    }

    #[test]
    fn test_adaptive_chains_through_previous_item() {
        // Each step is 8 px, so a slanted line stays one row even though the ends are 16 px apart.
        let words = vec![bx(0, 0, 10, 10), bx(20, 8, 30, 18), bx(40, 16, 50, 26)];
        assert_eq!(group_rows(words, RowGrouping::adaptive()).len(), 1);
    }

    #[test]
    fn test_fixed_threshold_anchors_to_first_item() {
        let lines = vec![bx(0, 0, 10, 10), bx(20, 12, 30, 22), bx(40, 24, 50, 34)];
        let rows = group_rows(lines, RowGrouping::lines());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1], vec![bx(40, 24, 50, 34)]);
    }

    #[test]
    fn test_abandon_excluded_and_indices_dense() {
        let dets = vec![
            det(0, 0, 500, 30, LayoutClass::Abandon),
            det(0, 100, 500, 200, LayoutClass::PlainText),
            det(0, 300, 500, 400, LayoutClass::PlainText),
        ];
        let ordered = assemble_reading_order(dets, RowGrouping::adaptive());
        let indices: Vec<usize> = ordered.iter().map(|r| r.sequence_index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert!(ordered.iter().all(|r| r.detection.class != LayoutClass::Abandon));
    }

    #[test]
    fn test_equal_left_edges_keep_input_order() {
        let first = det(0, 0, 50, 50, LayoutClass::Title);
        let second = det(0, 0, 50, 50, LayoutClass::PlainText);
        let ordered = sort_reading_order(vec![first.clone(), second.clone()], RowGrouping::adaptive());
        assert_eq!(ordered, vec![first, second]);
    }

    #[test]
    fn test_empty() {
        assert!(group_rows(Vec::<BoundingBox>::new(), RowGrouping::lines()).is_empty());
    }
}
