//! Text heuristics applied to OCR output.
//!
//! This module provides:
//! - Handwriting classification from sub-word tokenization granularity
//! - Dictionary-based validity scoring of candidate transcripts
//! - Fuzzy nearest-match substitution of low-confidence spans
//! - Pattern-based field extraction for known form layouts

pub mod classifier;
pub mod fields;
pub mod fuzzy;
pub mod validity;

pub use classifier::{Classification, HandwritingClassifier};
pub use fields::{FormProfile, RegexFieldExtractor};
pub use fuzzy::{closest_match, correct_texts, similarity};
pub use validity::{WordDictionary, check_text_validity, dictionary_coverage};

use once_cell::sync::Lazy;
use regex::Regex;

static ALPHA_WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]+").expect("Alphabetic word regex pattern is valid and should compile"));

/// Runs of ASCII letters, in order of appearance.
pub(crate) fn alphabetic_words(text: &str) -> impl Iterator<Item = &str> {
    ALPHA_WORD_PATTERN.find_iter(text).map(|m| m.as_str())
}
