//! Detection post-processing: confidence gating, non-max suppression and removal of
//! regions nested inside larger regions.
//!
//! The filter is idempotent. Running it over its own output returns the same set,
//! because greedy NMS survivors never overlap above the threshold and the containment
//! pass leaves no nested pair behind.

use super::Scored;
use crate::types::{Detection, LayoutClass};
use ahash::AHashMap;
use std::cmp::Ordering;

/// Minimum confidence per layout class, with a fallback for classes without an entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassThresholds {
    default: f64,
    per_class: AHashMap<LayoutClass, f64>,
}

impl ClassThresholds {
    /// Same threshold for every class.
    pub fn uniform(threshold: f64) -> Self {
        Self {
            default: threshold,
            per_class: AHashMap::new(),
        }
    }

    pub fn with(mut self, class: LayoutClass, threshold: f64) -> Self {
        self.per_class.insert(class, threshold);
        self
    }

    pub fn threshold_for(&self, class: LayoutClass) -> f64 {
        self.per_class.get(&class).copied().unwrap_or(self.default)
    }

    pub fn passes(&self, detection: &Detection) -> bool {
        detection.confidence >= self.threshold_for(detection.class)
    }
}

/// Confidence descending, ties by input position so the order is total.
fn by_confidence<T: Scored>(items: &[T]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        items[b]
            .confidence()
            .total_cmp(&items[a].confidence())
            .then(a.cmp(&b))
    });
    order
}

/// Greedy suppression restricted to pairs for which `same_group` holds.
/// Survivors keep their input order.
fn suppress<T, F>(items: Vec<T>, iou_threshold: f64, same_group: F) -> Vec<T>
where
    T: Scored,
    F: Fn(&T, &T) -> bool,
{
    let order = by_confidence(&items);
    let mut suppressed = vec![false; items.len()];

    for (rank, &i) in order.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        for &j in &order[rank + 1..] {
            if suppressed[j] || !same_group(&items[i], &items[j]) {
                continue;
            }
            if items[i].bbox().iou(items[j].bbox()) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    items
        .into_iter()
        .zip(suppressed)
        .filter_map(|(item, gone)| (!gone).then_some(item))
        .collect()
}

/// Class-agnostic non-max suppression: among boxes overlapping above `iou_threshold`,
/// only the highest-confidence one survives. Survivors keep their input order.
pub fn nms<T: Scored>(items: Vec<T>, iou_threshold: f64) -> Vec<T> {
    suppress(items, iou_threshold, |_, _| true)
}

/// Drop every detection whose box lies inside an already-kept, larger box,
/// regardless of class. Equal areas resolve in favour of the earlier detection.
fn remove_contained(detections: Vec<Detection>) -> Vec<Detection> {
    let mut sorted = detections;
    sorted.sort_by(|a, b| b.bbox.area().partial_cmp(&a.bbox.area()).unwrap_or(Ordering::Equal));

    let mut kept: Vec<Detection> = Vec::with_capacity(sorted.len());
    for detection in sorted {
        if kept.iter().any(|outer| outer.bbox.contains(&detection.bbox)) {
            tracing::trace!(class = %detection.class, "dropping contained region");
            continue;
        }
        kept.push(detection);
    }
    kept
}

/// Filter one page's raw layout detections.
///
/// 1. Drop detections below their class threshold.
/// 2. Per-class NMS at `overlap_threshold`.
/// 3. Containment removal in area-descending order.
///
/// The output is returned largest-first; callers that need reading order pass it to
/// [`assemble_reading_order`](super::assemble_reading_order).
pub fn filter_regions(
    detections: Vec<Detection>,
    thresholds: &ClassThresholds,
    overlap_threshold: f64,
) -> Vec<Detection> {
    if detections.is_empty() {
        return detections;
    }

    let input = detections.len();
    let confident: Vec<Detection> = detections.into_iter().filter(|d| thresholds.passes(d)).collect();
    let after_threshold = confident.len();

    let deduplicated = suppress(confident, overlap_threshold, |a, b| a.class == b.class);
    let after_nms = deduplicated.len();

    let kept = remove_contained(deduplicated);

    tracing::debug!(
        input,
        after_threshold,
        after_nms,
        kept = kept.len(),
        "filtered layout detections"
    );
    kept
}
