//! Printed vs handwritten classification.
//!
//! Printed text is mostly whole dictionary words, so a sub-word tokenizer emits close
//! to one token per word. Misrecognized handwriting fragments into many short pieces.
//! The ratio `words / tokens` (granularity) separates the two.

use super::alphabetic_words;
use crate::Result;
use crate::plugins::SubwordTokenizer;
use crate::types::Script;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GRANULARITY_THRESHOLD: f64 = 0.65;

/// Institution names that tokenize badly and would skew the ratio.
pub fn default_substitutions() -> Vec<(String, String)> {
    vec![
        ("pulchowk".to_string(), "!".to_string()),
        ("tribhuvan".to_string(), "@".to_string()),
        ("msdsa".to_string(), "1".to_string()),
    ]
}

/// Outcome of one classification, kept for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub script: Script,
    pub word_count: usize,
    pub token_count: usize,
}

impl Classification {
    fn fixed(script: Script) -> Self {
        Self {
            script,
            word_count: 0,
            token_count: 0,
        }
    }

    /// `word_count / token_count`, or `None` when nothing was tokenized.
    pub fn granularity(&self) -> Option<f64> {
        (self.token_count > 0).then(|| self.word_count as f64 / self.token_count as f64)
    }
}

#[derive(Debug, Clone)]
pub struct HandwritingClassifier {
    substitutions: Vec<(String, String)>,
    threshold: f64,
}

impl Default for HandwritingClassifier {
    fn default() -> Self {
        Self::new(default_substitutions(), DEFAULT_GRANULARITY_THRESHOLD)
    }
}

impl HandwritingClassifier {
    /// Substitution keys are matched against lowercased text, so they should be lowercase.
    pub fn new(substitutions: Vec<(String, String)>, threshold: f64) -> Self {
        Self {
            substitutions,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classify one region from the texts its OCR spans produced.
    pub fn classify<S: AsRef<str>>(&self, texts: &[S], tokenizer: &dyn SubwordTokenizer) -> Result<Script> {
        self.classify_detailed(texts, tokenizer).map(|c| c.script)
    }

    pub fn classify_detailed<S: AsRef<str>>(
        &self,
        texts: &[S],
        tokenizer: &dyn SubwordTokenizer,
    ) -> Result<Classification> {
        if texts.is_empty() {
            return Ok(Classification::fixed(Script::Handwritten));
        }

        let mut joined = texts.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\n").to_lowercase();
        for (token, placeholder) in &self.substitutions {
            joined = joined.replace(token.as_str(), placeholder);
        }

        let words: Vec<&str> = alphabetic_words(&joined).collect();
        if words.is_empty() {
            return Ok(Classification::fixed(Script::Printed));
        }

        let token_count = tokenizer.count_tokens(&words.join(" "))?;
        if token_count == 0 {
            return Ok(Classification::fixed(Script::Printed));
        }

        let word_count = words.len();
        let granularity = word_count as f64 / token_count as f64;
        let script = if granularity >= self.threshold || word_count == 1 {
            Script::Printed
        } else {
            Script::Handwritten
        };

        tracing::debug!(word_count, token_count, granularity, ?script, "classified region script");
        Ok(Classification {
            script,
            word_count,
            token_count,
        })
    }
}
