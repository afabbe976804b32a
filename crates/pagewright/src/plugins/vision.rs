//! Vision fallback over a `generateContent`-style HTTP API.

use super::generate::{GenerateClient, Part};
use super::{Capability, VisionFallback};
use crate::Result;
use crate::core::config::VisionConfig;
use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

pub struct HttpVisionClient {
    client: GenerateClient,
    prompt: String,
}

impl HttpVisionClient {
    /// Build a client reading the API key from the environment variable named in `config`.
    pub fn new(config: &VisionConfig) -> Result<Self> {
        Ok(Self {
            client: GenerateClient::new(config)?,
            prompt: config.prompt.clone(),
        })
    }

    pub fn with_api_key(config: &VisionConfig, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: GenerateClient::with_api_key(config, api_key)?,
            prompt: config.prompt.clone(),
        })
    }

    fn try_extract(&self, image: &DynamicImage) -> Result<String> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        let encoded = general_purpose::STANDARD.encode(&png);
        self.client
            .generate(vec![Part::text(&self.prompt), Part::png(encoded)])
    }
}

impl Capability for HttpVisionClient {
    fn name(&self) -> &str {
        self.client.model()
    }
}

impl VisionFallback for HttpVisionClient {
    fn extract(&self, image: &DynamicImage) -> Option<String> {
        match self.try_extract(image) {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(model = self.client.model(), error = %e, "vision fallback failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(HttpVisionClient::with_api_key(&VisionConfig::default(), "  ").is_err());
    }

    #[test]
    fn test_name_is_model() {
        let client = HttpVisionClient::with_api_key(&VisionConfig::default(), "key").unwrap();
        assert_eq!(client.name(), "gemini-2.0-flash");
    }

    #[test]
    fn test_unreachable_endpoint_yields_none() {
        let config = VisionConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..VisionConfig::default()
        };
        let client = HttpVisionClient::with_api_key(&config, "key").unwrap();
        let image = DynamicImage::new_rgb8(8, 8);
        assert!(client.extract(&image).is_none());
    }
}
