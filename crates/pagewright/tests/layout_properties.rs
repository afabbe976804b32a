//! Property-based tests for filtering, reading order, classification and tables.

use pagewright::layout::{ClassThresholds, RowGrouping, assemble_reading_order, filter_regions};
use pagewright::plugins::{Capability, SubwordTokenizer};
use pagewright::{BoundingBox, Detection, HandwritingClassifier, LayoutClass, Result, Script, TableGrid};
use proptest::prelude::*;

fn arb_box() -> impl Strategy<Value = BoundingBox> {
    (0i32..500, 0i32..500, 1i32..200, 1i32..200)
        .prop_map(|(x0, y0, w, h)| BoundingBox::new(x0, y0, x0 + w, y0 + h).unwrap())
}

fn arb_detection() -> impl Strategy<Value = Detection> {
    (arb_box(), 0usize..LayoutClass::ALL.len(), 0.0f64..=1.0)
        .prop_map(|(bbox, class, confidence)| Detection::new(bbox, LayoutClass::ALL[class], confidence))
}

struct CharTokenizer;

impl Capability for CharTokenizer {}

impl SubwordTokenizer for CharTokenizer {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(text.chars().filter(|c| !c.is_whitespace()).count())
    }
}

proptest! {
    #[test]
    fn prop_iou_is_symmetric_and_bounded(a in arb_box(), b in arb_box()) {
        let ab = a.iou(&b);
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert!((ab - b.iou(&a)).abs() < 1e-12);
        prop_assert!(a.contains(&a));
        prop_assert!((a.iou(&a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn prop_filter_leaves_no_nested_pairs(
        detections in prop::collection::vec(arb_detection(), 0..24),
        overlap in 0.05f64..0.9,
    ) {
        let kept = filter_regions(detections, &ClassThresholds::uniform(0.2), overlap);

        for (i, a) in kept.iter().enumerate() {
            prop_assert!(a.confidence >= 0.2);
            for b in &kept[i + 1..] {
                prop_assert!(!a.bbox.contains(&b.bbox));
                prop_assert!(!b.bbox.contains(&a.bbox));
                if a.class == b.class {
                    prop_assert!(a.bbox.iou(&b.bbox) <= overlap);
                }
            }
        }
    }

    #[test]
    fn prop_filter_is_idempotent(
        detections in prop::collection::vec(arb_detection(), 0..24),
        overlap in 0.05f64..0.9,
    ) {
        let thresholds = ClassThresholds::uniform(0.1);
        let once = filter_regions(detections, &thresholds, overlap);
        let twice = filter_regions(once.clone(), &thresholds, overlap);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_reading_order_is_dense_permutation(detections in prop::collection::vec(arb_detection(), 0..24)) {
        let content = detections.iter().filter(|d| d.class != LayoutClass::Abandon).count();
        let ordered = assemble_reading_order(detections.clone(), RowGrouping::adaptive());

        prop_assert_eq!(ordered.len(), content);
        for (i, region) in ordered.iter().enumerate() {
            prop_assert_eq!(region.sequence_index, i);
            prop_assert!(region.detection.class != LayoutClass::Abandon);
            prop_assert!(detections.contains(&region.detection));
        }
    }

    #[test]
    fn prop_single_row_is_left_to_right(xs in prop::collection::vec(0i32..1000, 1..16)) {
        let detections: Vec<Detection> = xs
            .iter()
            .map(|&x| Detection::new(BoundingBox::new(x, 100, x + 40, 130).unwrap(), LayoutClass::PlainText, 0.9))
            .collect();

        for grouping in [RowGrouping::adaptive(), RowGrouping::lines()] {
            let ordered = assemble_reading_order(detections.clone(), grouping);
            let lefts: Vec<i32> = ordered.iter().map(|r| r.detection.bbox.x0()).collect();
            prop_assert!(lefts.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn prop_single_word_is_printed(word in "[a-z]{1,16}", noise in "[0-9 ,.]{0,6}") {
        let classifier = HandwritingClassifier::new(Vec::new(), 0.65);
        let text = format!("{}{}{}", noise, word, noise);
        prop_assert_eq!(classifier.classify(&[text], &CharTokenizer).unwrap(), Script::Printed);
    }

    #[test]
    fn prop_table_rows_are_padded(rows in prop::collection::vec(prop::collection::vec("[a-z]{0,4}", 0..6), 0..6)) {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let grid = TableGrid::from_rows(rows.clone());

        prop_assert_eq!(grid.num_rows(), rows.len());
        for (padded, original) in grid.rows().iter().zip(&rows) {
            prop_assert_eq!(padded.len(), width);
            prop_assert_eq!(&padded[..original.len()], &original[..]);
            prop_assert!(padded[original.len()..].iter().all(String::is_empty));
        }
    }
}
