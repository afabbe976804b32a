//! Error types for pagewright.
//!
//! Every fallible operation in the crate returns [`PagewrightError`]. The variants
//! follow the crate's propagation policy:
//!
//! - `Io` wraps `std::io::Error` and always bubbles up unchanged.
//! - `InvalidBox` is raised when geometry is rejected at construction time.
//! - `ModelInvocation` covers any detector, OCR, recognizer or fallback API failure.
//!   The page pipeline catches it per region and degrades to the best text available.
//! - `ImageProcessing` is raised when a page image cannot be decoded. This is the
//!   single terminal error a page can produce.
//!
//! Empty detections or empty text are not errors; they are represented by empty
//! collections.
//!
//! # Example
//!
//! ```rust
//! use pagewright::{PagewrightError, Result};
//!
//! fn load_words(path: &str) -> Result<String> {
//!     let content = std::fs::read_to_string(path)?;
//!     if content.is_empty() {
//!         return Err(PagewrightError::validation(format!("Dictionary is empty: {}", path)));
//!     }
//!     Ok(content)
//! }
//! ```
use thiserror::Error;

/// Result type alias using `PagewrightError`.
pub type Result<T> = std::result::Result<T, PagewrightError>;

/// Main error type for all pagewright operations.
#[derive(Debug, Error)]
pub enum PagewrightError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bounding box ({x0}, {y0}, {x1}, {y1}): {message}")]
    InvalidBox {
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        message: String,
    },

    #[error("Model invocation failed in '{model}': {message}")]
    ModelInvocation {
        model: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Image processing error: {message}")]
    ImageProcessing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for PagewrightError {
    fn from(err: serde_json::Error) -> Self {
        PagewrightError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<image::ImageError> for PagewrightError {
    fn from(err: image::ImageError) -> Self {
        PagewrightError::ImageProcessing {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl PagewrightError {
    error_constructor!(image_processing, ImageProcessing);
    error_constructor!(validation, Validation);
    error_constructor!(serialization, Serialization);

    /// Create a ModelInvocation error for the named capability.
    pub fn model<M: Into<String>, S: Into<String>>(model: M, message: S) -> Self {
        Self::ModelInvocation {
            model: model.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a ModelInvocation error for the named capability with source.
    pub fn model_with_source<M, S, E>(model: M, message: S, source: E) -> Self
    where
        M: Into<String>,
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ModelInvocation {
            model: model.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn invalid_box<S: Into<String>>(x0: i32, y0: i32, x1: i32, y1: i32, message: S) -> Self {
        Self::InvalidBox {
            x0,
            y0,
            x1,
            y1,
            message: message.into(),
        }
    }

    /// True for failures that the pipeline absorbs at region granularity.
    pub fn is_model_failure(&self) -> bool {
        matches!(self, Self::ModelInvocation { .. })
    }
}
