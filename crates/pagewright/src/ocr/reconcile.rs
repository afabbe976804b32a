//! Reconciliation of OCR output with handwriting recognition.
//!
//! For each region a [`RecognitionPlan`] is decided once from the OCR span confidences
//! and the script verdict, then executed by the page pipeline:
//!
//! - every span confident: keep the OCR text
//! - printed with weak spans, or handwritten with fewer than
//!   `region_recognition_min_spans` weak spans: re-recognize the weak spans and
//!   substitute the nearest match
//! - handwritten with many weak spans: detect words and recognize the whole region

use crate::core::config::ReconcilerConfig;
use crate::layout::{RowGrouping, nms, sort_reading_order};
use crate::plugins::{HandwritingRecognizer, VisionFallback};
use crate::text::{WordDictionary, check_text_validity, closest_match};
use crate::types::{ScoredBox, Script, TextSpan};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// How a region's final text is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecognitionPlan {
    /// Every span met the acceptance threshold.
    AcceptAsIs,
    /// Re-recognize the spans at these indices (into the line-ordered spans).
    PatchSpans { low: Vec<usize> },
    /// Detect words and recognize the region from scratch.
    RecognizeRegion,
}

impl RecognitionPlan {
    /// `spans` must already be in line reading order.
    pub fn decide(spans: &[TextSpan], script: Script, config: &ReconcilerConfig) -> Self {
        let low = low_confidence_indices(spans, config.acceptance_threshold);
        if low.is_empty() {
            RecognitionPlan::AcceptAsIs
        } else if script.is_handwritten() && low.len() >= config.region_recognition_min_spans {
            RecognitionPlan::RecognizeRegion
        } else {
            RecognitionPlan::PatchSpans { low }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RecognitionPlan::AcceptAsIs => "accept",
            RecognitionPlan::PatchSpans { .. } => "patch",
            RecognitionPlan::RecognizeRegion => "recognize",
        }
    }
}

/// Indices of spans whose confidence is below `threshold`.
pub fn low_confidence_indices(spans: &[TextSpan], threshold: f64) -> Vec<usize> {
    spans
        .iter()
        .enumerate()
        .filter_map(|(i, span)| (span.confidence < threshold).then_some(i))
        .collect()
}

/// Put OCR spans into line reading order.
pub fn order_lines(spans: Vec<TextSpan>, grouping: RowGrouping) -> Vec<TextSpan> {
    sort_reading_order(spans, grouping)
}

pub fn join_lines(spans: &[TextSpan]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join("\n")
}

/// Replace each weak span's text with its nearest regenerated candidate.
///
/// Confident spans are kept verbatim. A weak span keeps its OCR text when no candidate
/// reaches `cutoff`.
pub fn patch_spans(spans: &[TextSpan], low: &[usize], candidates: &[String], cutoff: f64) -> String {
    spans
        .iter()
        .enumerate()
        .map(|(i, span)| {
            if !low.contains(&i) {
                return span.text.as_str();
            }
            match closest_match(&span.text, candidates, cutoff) {
                Some(replacement) => {
                    tracing::debug!(from = %span.text, to = replacement, "patched span");
                    replacement
                }
                None => span.text.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Word detections kept for recognition, in reading order.
pub fn select_words(words: Vec<ScoredBox>, config: &ReconcilerConfig, grouping: RowGrouping) -> Vec<ScoredBox> {
    let confident: Vec<ScoredBox> = words
        .into_iter()
        .filter(|w| w.confidence >= config.word_confidence)
        .collect();
    sort_reading_order(nms(confident, config.word_nms_iou), grouping)
}

/// Handwriting models tend to emit a trailing period for word crops.
pub fn clean_word(text: &str) -> String {
    text.replace('.', " ").trim().to_string()
}

pub fn join_words(words: &[String]) -> String {
    words
        .iter()
        .map(|w| clean_word(w))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Recognize every group of crops with one batched call.
///
/// Results come back per group, in order. If the page-wide batch fails or returns the
/// wrong number of texts, each group is retried on its own; a group whose retry also
/// fails yields `None`.
pub fn recognize_batched(
    recognizer: &dyn HandwritingRecognizer,
    groups: &[Vec<DynamicImage>],
) -> Vec<Option<Vec<String>>> {
    let total: usize = groups.iter().map(Vec::len).sum();
    if total == 0 {
        return groups.iter().map(|_| Some(Vec::new())).collect();
    }

    let all: Vec<DynamicImage> = groups.iter().flatten().cloned().collect();
    match recognizer.generate_batch(&all) {
        Ok(texts) if texts.len() == total => {
            let mut texts = texts.into_iter();
            return groups
                .iter()
                .map(|group| Some(texts.by_ref().take(group.len()).collect()))
                .collect();
        }
        Ok(texts) => {
            tracing::warn!(
                model = recognizer.name(),
                expected = total,
                got = texts.len(),
                "handwriting batch returned wrong number of texts, retrying per region"
            );
        }
        Err(e) => {
            tracing::warn!(model = recognizer.name(), error = %e, "handwriting batch failed, retrying per region");
        }
    }

    groups
        .iter()
        .map(|group| {
            if group.is_empty() {
                return Some(Vec::new());
            }
            match recognizer.generate_batch(group) {
                Ok(texts) if texts.len() == group.len() => Some(texts),
                Ok(_) => {
                    tracing::warn!(model = recognizer.name(), "handwriting retry returned wrong number of texts");
                    None
                }
                Err(e) => {
                    tracing::warn!(model = recognizer.name(), error = %e, "handwriting retry failed");
                    None
                }
            }
        })
        .collect()
}

/// Outcome of the dictionary check.
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    /// The candidate passed, or failed with no usable fallback.
    Kept(String),
    /// The vision fallback replaced the candidate.
    Replaced(String),
}

/// Keep `candidate` if it reads as dictionary text, otherwise ask the vision fallback.
pub fn validate_or_fallback(
    candidate: String,
    dictionary: &WordDictionary,
    threshold: f64,
    vision: Option<&dyn VisionFallback>,
    region: &DynamicImage,
) -> Validated {
    if check_text_validity(&candidate, dictionary, threshold) {
        return Validated::Kept(candidate);
    }
    let Some(vision) = vision else {
        return Validated::Kept(candidate);
    };

    match vision.extract(region) {
        Some(text) if !text.trim().is_empty() => {
            tracing::debug!(model = vision.name(), "vision fallback replaced invalid text");
            Validated::Replaced(text.trim().to_string())
        }
        _ => Validated::Kept(candidate),
    }
}
