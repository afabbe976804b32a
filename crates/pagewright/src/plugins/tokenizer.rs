//! Sub-word tokenizer backed by a Hugging Face `tokenizer.json`.

use super::{Capability, ModelCache, SubwordTokenizer};
use crate::{PagewrightError, Result};
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;

pub struct HfTokenizer {
    name: String,
    tokenizer: Tokenizer,
}

impl HfTokenizer {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PagewrightError::validation(format!(
                "Tokenizer file not found: {}",
                path.display()
            )));
        }
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            PagewrightError::model("tokenizer", format!("Failed to load {}: {}", path.display(), e))
        })?;
        Ok(Self {
            name: format!("hf-tokenizer:{}", path.display()),
            tokenizer,
        })
    }

    /// Load through the cache so each tokenizer file is parsed once.
    pub fn cached(cache: &ModelCache, path: impl AsRef<Path>) -> Result<Arc<Self>> {
        let path = path.as_ref();
        cache.get_or_init(&format!("tokenizer:{}", path.display()), || Self::from_file(path))
    }
}

impl Capability for HfTokenizer {
    fn name(&self) -> &str {
        &self.name
    }
}

impl SubwordTokenizer for HfTokenizer {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| PagewrightError::model(self.name.as_str(), format!("Tokenization failed: {}", e)))?;
        Ok(encoding.get_ids().len())
    }
}
