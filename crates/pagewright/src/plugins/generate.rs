//! Blocking client for `generateContent`-style model APIs, shared by the vision
//! fallback and the key-value extractor.

use crate::core::config::VisionConfig;
use crate::{PagewrightError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct GenerateClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
pub(crate) struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub(crate) enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
pub(crate) struct InlineData {
    mime_type: &'static str,
    data: String,
}

impl<'a> Part<'a> {
    pub(crate) fn text(text: &'a str) -> Self {
        Part::Text { text }
    }

    pub(crate) fn png(base64: String) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: "image/png",
                data: base64,
            },
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateClient {
    /// Build a client reading the API key from the environment variable named in `config`.
    pub fn new(config: &VisionConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            PagewrightError::validation(format!(
                "{} environment variable not set; the generateContent API needs a key",
                config.api_key_env
            ))
        })?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &VisionConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PagewrightError::validation("generateContent API key is empty"));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PagewrightError::model_with_source(config.model.as_str(), "Failed to build HTTP client", e))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    pub(crate) fn request_body<'a>(parts: Vec<Part<'a>>) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content { parts }],
        }
    }

    /// Send one single-turn request and return the first candidate's text, code
    /// fences removed.
    pub(crate) fn generate(&self, parts: Vec<Part<'_>>) -> Result<String> {
        let body = Self::request_body(parts);
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| PagewrightError::model_with_source(self.model.as_str(), "Request failed", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().unwrap_or_default();
            return Err(PagewrightError::model(
                self.model.as_str(),
                format!("API error {}: {}", status, detail),
            ));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| PagewrightError::model_with_source(self.model.as_str(), "Malformed response", e))?;
        response_text(parsed).ok_or_else(|| PagewrightError::model(self.model.as_str(), "Response carried no text"))
    }
}

pub(crate) fn response_text(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    Some(strip_code_fences(&text))
}

/// Remove a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim().to_string()
}
