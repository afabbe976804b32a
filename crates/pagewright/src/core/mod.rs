//! Core pipeline orchestration and configuration.
//!
//! This module contains:
//! - `config`: `PipelineConfig` with file loading and discovery
//! - `pipeline`: `PagePipeline`, the per-page driver and batch entry point
//! - `progress`: per-page progress events for batch runs

pub mod config;
pub mod pipeline;
pub mod progress;

pub use config::PipelineConfig;
pub use pipeline::PagePipeline;
pub use progress::{NoProgress, PageProgress, ProgressObserver};
