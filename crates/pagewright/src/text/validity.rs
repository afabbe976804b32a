//! Reference-dictionary check for candidate transcripts.

use super::alphabetic_words;
use crate::Result;
use ahash::AHashSet;
use std::path::Path;

pub const DEFAULT_VALIDITY_THRESHOLD: f64 = 0.65;

/// Lowercase word set, loaded once per process and shared behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct WordDictionary {
    words: AHashSet<String>,
}

impl WordDictionary {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Load a word list with one entry per line.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let dictionary = Self::from_words(content.lines());
        tracing::debug!(path = %path.as_ref().display(), words = dictionary.len(), "loaded word dictionary");
        Ok(dictionary)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Fraction of alphabetic words found in the dictionary, `None` if there are no words.
pub fn dictionary_coverage(text: &str, dictionary: &WordDictionary) -> Option<f64> {
    let lowered = text.to_lowercase();
    let (known, total) = alphabetic_words(&lowered).fold((0usize, 0usize), |(known, total), word| {
        (known + usize::from(dictionary.words.contains(word)), total + 1)
    });
    (total > 0).then(|| known as f64 / total as f64)
}

/// True when at least `threshold` of the text's words are dictionary words.
/// Text without any alphabetic word is never valid.
pub fn check_text_validity(text: &str, dictionary: &WordDictionary, threshold: f64) -> bool {
    dictionary_coverage(text, dictionary).is_some_and(|coverage| coverage >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn dictionary() -> WordDictionary {
        WordDictionary::from_words(["the", "cat", "sat", "on", "mat", "Name"])
    }

    #[test]
    fn test_empty_text_is_invalid() {
        assert!(!check_text_validity("", &dictionary(), DEFAULT_VALIDITY_THRESHOLD));
        assert!(!check_text_validity("  42 ", &dictionary(), DEFAULT_VALIDITY_THRESHOLD));
    }

    #[test]
    fn test_dictionary_text_is_valid() {
        assert!(check_text_validity("The cat sat on the mat.", &dictionary(), DEFAULT_VALIDITY_THRESHOLD));
    }

    #[test]
    fn test_coverage_threshold() {
        let dict = dictionary();
        // 2 of 3 known.
        let coverage = dictionary_coverage("cat sat xyzzy", &dict).unwrap();
        assert!((coverage - 2.0 / 3.0).abs() < 1e-9);
        assert!(check_text_validity("cat sat xyzzy", &dict, 0.65));
        // 1 of 2 known.
        assert!(!check_text_validity("cat qwrtp", &dict, 0.65));
    }

    #[test]
    fn test_dictionary_is_case_insensitive() {
        let dict = dictionary();
        assert!(dict.contains("NAME"));
        assert!(dict.contains("name"));
        assert_eq!(dict.len(), 6);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Apple\n\n banana \ncherry").unwrap();
        let dict = WordDictionary::from_file(file.path()).unwrap();
        assert_eq!(dict.len(), 3);
        assert!(dict.contains("banana"));
    }

    #[test]
    fn test_from_missing_file_is_io_error() {
        let err = WordDictionary::from_file("/nonexistent/pagewright/words.txt").unwrap_err();
        assert!(matches!(err, crate::PagewrightError::Io(_)));
    }
}
