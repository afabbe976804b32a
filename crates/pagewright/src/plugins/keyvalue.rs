//! Key-value extraction by prompting a `generateContent`-style model for a JSON object.

use super::generate::{GenerateClient, Part, strip_code_fences};
use super::{Capability, KeyValueExtractor};
use crate::Result;
use crate::core::config::{KeyValueConfig, VisionConfig};
use crate::types::FieldMap;
use serde_json::Value;

pub struct HttpKeyValueExtractor {
    client: GenerateClient,
    config: KeyValueConfig,
}

impl HttpKeyValueExtractor {
    /// `api` supplies the endpoint, model, key variable and timeout; its image prompt is unused.
    pub fn new(api: &VisionConfig, config: KeyValueConfig) -> Result<Self> {
        Ok(Self {
            client: GenerateClient::new(api)?,
            config,
        })
    }

    pub fn with_api_key(api: &VisionConfig, config: KeyValueConfig, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: GenerateClient::with_api_key(api, api_key)?,
            config,
        })
    }
}

impl Capability for HttpKeyValueExtractor {
    fn name(&self) -> &str {
        self.client.model()
    }
}

impl KeyValueExtractor for HttpKeyValueExtractor {
    fn extract_fields(&self, text: &str) -> Option<FieldMap> {
        let prompt = self.config.render_prompt(text);
        let response = match self.client.generate(vec![Part::text(&prompt)]) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(model = self.client.model(), error = %e, "key-value extraction failed");
                return None;
            }
        };
        let fields = parse_json_object(&response);
        if fields.is_none() {
            tracing::warn!(model = self.client.model(), response = %response, "response was not a JSON object");
        }
        fields
    }
}

/// Parse the outermost `{...}` span of a model response as a JSON object.
///
/// Code fences are removed first. Anything that is not a JSON object yields `None`.
pub fn parse_json_object(response: &str) -> Option<FieldMap> {
    let cleaned = strip_code_fences(response);
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end < start {
        return None;
    }
    match serde_json::from_str::<Value>(&cleaned[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "invalid JSON in model response");
            None
        }
    }
}
