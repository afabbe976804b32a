//! Configuration loading and management.
//!
//! Every threshold the pipeline uses lives here with its default. Configuration can be
//! loaded from TOML, YAML, or JSON files, discovered as `pagewright.toml` in the
//! directory hierarchy, or built programmatically.

use crate::layout::{ClassThresholds, RowGrouping};
use crate::text::HandwritingClassifier;
use crate::types::LayoutClass;
use crate::{PagewrightError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "pagewright.toml";

/// Main pipeline configuration.
///
/// # Example
///
/// ```rust
/// use pagewright::core::config::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.reconciler.acceptance_threshold, 0.9);
///
/// // let config = PipelineConfig::from_toml_file("pagewright.toml")?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Size of the region worker pool.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub reading_order: ReadingOrderConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    #[serde(default)]
    pub table: TableConfig,

    /// Vision fallback settings; `None` disables the fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<VisionConfig>,

    /// Key-value extraction over the finished transcript; `None` disables it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_values: Option<KeyValueConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            layout: LayoutConfig::default(),
            reading_order: ReadingOrderConfig::default(),
            classifier: ClassifierConfig::default(),
            reconciler: ReconcilerConfig::default(),
            table: TableConfig::default(),
            vision: None,
            key_values: None,
        }
    }
}

/// Layout detection and region filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Confidence passed to the layout detector.
    #[serde(default = "default_detection_confidence")]
    pub detection_confidence: f64,

    /// NMS IoU passed to the layout detector.
    #[serde(default = "default_detection_iou")]
    pub detection_iou: f64,

    /// Per-class NMS overlap used by the region filter.
    #[serde(default = "default_overlap_threshold")]
    pub overlap_threshold: f64,

    /// Confidence floor for classes without an explicit entry.
    #[serde(default = "default_detection_confidence")]
    pub min_confidence: f64,

    /// Pixels added around each region before cropping.
    #[serde(default = "default_padding")]
    pub padding: u32,

    /// Confidence floor per class name, e.g. `Table = 0.3`.
    #[serde(default)]
    pub class_thresholds: BTreeMap<String, f64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            detection_confidence: default_detection_confidence(),
            detection_iou: default_detection_iou(),
            overlap_threshold: default_overlap_threshold(),
            min_confidence: default_detection_confidence(),
            padding: default_padding(),
            class_thresholds: BTreeMap::new(),
        }
    }
}

impl LayoutConfig {
    /// Resolve class names into a threshold table.
    pub fn class_thresholds(&self) -> Result<ClassThresholds> {
        self.class_thresholds
            .iter()
            .try_fold(ClassThresholds::uniform(self.min_confidence), |acc, (name, threshold)| {
                Ok(acc.with(name.parse::<LayoutClass>()?, *threshold))
            })
    }
}

/// Row grouping for region, word and line ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingOrderConfig {
    #[serde(default = "default_row_height_ratio")]
    pub row_height_ratio: f64,

    #[serde(default = "default_min_row_threshold")]
    pub min_row_threshold: f64,

    /// Fixed threshold used when joining OCR lines.
    #[serde(default = "default_line_threshold")]
    pub line_threshold: f64,
}

impl Default for ReadingOrderConfig {
    fn default() -> Self {
        Self {
            row_height_ratio: default_row_height_ratio(),
            min_row_threshold: default_min_row_threshold(),
            line_threshold: default_line_threshold(),
        }
    }
}

impl ReadingOrderConfig {
    pub fn region_grouping(&self) -> RowGrouping {
        RowGrouping::Adaptive {
            ratio: self.row_height_ratio,
            min_threshold: self.min_row_threshold,
        }
    }

    pub fn line_grouping(&self) -> RowGrouping {
        RowGrouping::Fixed(self.line_threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_granularity_threshold")]
    pub granularity_threshold: f64,

    /// Lowercase tokens replaced by placeholders before tokenizing.
    #[serde(default = "default_substitutions")]
    pub substitutions: BTreeMap<String, String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            granularity_threshold: default_granularity_threshold(),
            substitutions: default_substitutions(),
        }
    }
}

impl ClassifierConfig {
    pub fn classifier(&self) -> HandwritingClassifier {
        let substitutions = self
            .substitutions
            .iter()
            .map(|(token, placeholder)| (token.to_lowercase(), placeholder.clone()))
            .collect();
        HandwritingClassifier::new(substitutions, self.granularity_threshold)
    }
}

/// OCR/handwriting reconciliation thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Spans below this confidence are re-recognized.
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f64,

    #[serde(default = "default_similarity_cutoff")]
    pub similarity_cutoff: f64,

    #[serde(default = "default_validity_threshold")]
    pub validity_threshold: f64,

    /// Handwritten regions with at least this many low-confidence spans are
    /// re-recognized word by word.
    #[serde(default = "default_region_recognition_min_spans")]
    pub region_recognition_min_spans: usize,

    #[serde(default = "default_word_confidence")]
    pub word_confidence: f64,

    #[serde(default = "default_word_nms_iou")]
    pub word_nms_iou: f64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: default_acceptance_threshold(),
            similarity_cutoff: default_similarity_cutoff(),
            validity_threshold: default_validity_threshold(),
            region_recognition_min_spans: default_region_recognition_min_spans(),
            word_confidence: default_word_confidence(),
            word_nms_iou: default_word_nms_iou(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Structure detections below this confidence are ignored.
    #[serde(default = "default_structure_confidence")]
    pub structure_confidence: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            structure_confidence: default_structure_confidence(),
        }
    }
}

/// HTTP vision fallback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionConfig {
    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_vision_model")]
    pub model: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_vision_prompt")]
    pub prompt: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_vision_endpoint(),
            model: default_vision_model(),
            api_key_env: default_api_key_env(),
            prompt: default_vision_prompt(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Key-value extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValueConfig {
    /// Prompt template; `{text}` is replaced by the page transcript.
    #[serde(default = "default_key_value_prompt")]
    pub prompt: String,
}

impl Default for KeyValueConfig {
    fn default() -> Self {
        Self {
            prompt: default_key_value_prompt(),
        }
    }
}

impl KeyValueConfig {
    pub fn render_prompt(&self, text: &str) -> String {
        self.prompt.replace(KEY_VALUE_PLACEHOLDER, text)
    }
}

/// Placeholder substituted with the transcript in [`KeyValueConfig::prompt`].
pub const KEY_VALUE_PLACEHOLDER: &str = "{text}";

fn default_true() -> bool {
    true
}
fn default_max_workers() -> usize {
    num_cpus::get().max(1)
}
fn default_detection_confidence() -> f64 {
    0.05
}
fn default_detection_iou() -> f64 {
    0.1
}
fn default_overlap_threshold() -> f64 {
    0.1
}
fn default_padding() -> u32 {
    10
}
fn default_row_height_ratio() -> f64 {
    0.7
}
fn default_min_row_threshold() -> f64 {
    10.0
}
fn default_line_threshold() -> f64 {
    20.0
}
fn default_granularity_threshold() -> f64 {
    crate::text::classifier::DEFAULT_GRANULARITY_THRESHOLD
}
fn default_substitutions() -> BTreeMap<String, String> {
    crate::text::classifier::default_substitutions().into_iter().collect()
}
fn default_acceptance_threshold() -> f64 {
    0.9
}
fn default_similarity_cutoff() -> f64 {
    crate::text::fuzzy::DEFAULT_SIMILARITY_CUTOFF
}
fn default_validity_threshold() -> f64 {
    crate::text::validity::DEFAULT_VALIDITY_THRESHOLD
}
fn default_region_recognition_min_spans() -> usize {
    2
}
fn default_word_confidence() -> f64 {
    0.5
}
fn default_word_nms_iou() -> f64 {
    0.5
}
fn default_structure_confidence() -> f64 {
    0.5
}
fn default_vision_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_vision_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}
fn default_vision_prompt() -> String {
    "Extract all text from this image exactly as written. Preserve line breaks. \
     Return only the extracted text, without commentary or formatting."
        .to_string()
}
fn default_key_value_prompt() -> String {
    "Extract key-value pairs from the following text and return ONLY a valid JSON object. \
     Do not include any explanations, markdown formatting, or code blocks in your response. \
     Just return a clean JSON object where keys are the entity names and values are their \
     corresponding values.\n\nText:\n{text}\n"
        .to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PagewrightError::validation(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PagewrightError::validation(format!("{} must be positive, got {}", name, value)))
    }
}

impl PipelineConfig {
    /// Reject out-of-range thresholds and unknown class names.
    pub fn validate(&self) -> Result<()> {
        check_unit("layout.detection_confidence", self.layout.detection_confidence)?;
        check_unit("layout.detection_iou", self.layout.detection_iou)?;
        check_unit("layout.overlap_threshold", self.layout.overlap_threshold)?;
        check_unit("layout.min_confidence", self.layout.min_confidence)?;
        for (class, threshold) in &self.layout.class_thresholds {
            check_unit(&format!("layout.class_thresholds.{}", class), *threshold)?;
        }
        self.layout.class_thresholds()?;

        check_positive("reading_order.row_height_ratio", self.reading_order.row_height_ratio)?;
        check_positive("reading_order.min_row_threshold", self.reading_order.min_row_threshold)?;
        check_positive("reading_order.line_threshold", self.reading_order.line_threshold)?;

        check_unit("classifier.granularity_threshold", self.classifier.granularity_threshold)?;

        check_unit("reconciler.acceptance_threshold", self.reconciler.acceptance_threshold)?;
        check_unit("reconciler.similarity_cutoff", self.reconciler.similarity_cutoff)?;
        check_unit("reconciler.validity_threshold", self.reconciler.validity_threshold)?;
        check_unit("reconciler.word_confidence", self.reconciler.word_confidence)?;
        check_unit("reconciler.word_nms_iou", self.reconciler.word_nms_iou)?;
        if self.reconciler.region_recognition_min_spans == 0 {
            return Err(PagewrightError::validation(
                "reconciler.region_recognition_min_spans must be at least 1",
            ));
        }

        check_unit("table.structure_confidence", self.table.structure_confidence)?;

        if let Some(key_values) = &self.key_values
            && !key_values.prompt.contains(KEY_VALUE_PLACEHOLDER)
        {
            return Err(PagewrightError::validation(format!(
                "key_values.prompt must contain the {} placeholder",
                KEY_VALUE_PLACEHOLDER
            )));
        }

        if self.max_workers == 0 {
            return Err(PagewrightError::validation("max_workers must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `PagewrightError::Validation` if the file can't be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        toml::from_str(&content)
            .map_err(|e| PagewrightError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| PagewrightError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_json::from_str(&content)
            .map_err(|e| PagewrightError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load by extension: `.yaml`/`.yml`, `.json`, anything else as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Search for `pagewright.toml` in the current directory and its parents.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(PagewrightError::Io)?;
        Self::discover_from(current)
    }

    /// Same as [`discover`](Self::discover), starting from `start`.
    pub fn discover_from(start: impl Into<PathBuf>) -> Result<Option<Self>> {
        let mut current: PathBuf = start.into();

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "discovered configuration");
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| PagewrightError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.layout.detection_confidence, 0.05);
        assert_eq!(config.layout.detection_iou, 0.1);
        assert_eq!(config.layout.padding, 10);
        assert_eq!(config.reconciler.acceptance_threshold, 0.9);
        assert_eq!(config.reconciler.similarity_cutoff, 0.6);
        assert_eq!(config.reconciler.validity_threshold, 0.65);
        assert_eq!(config.reconciler.region_recognition_min_spans, 2);
        assert_eq!(config.classifier.granularity_threshold, 0.65);
        assert_eq!(config.classifier.substitutions.get("pulchowk").map(String::as_str), Some("!"));
        assert!(config.vision.is_none());
        assert!(config.max_workers >= 1);
        config.validate().unwrap();
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("pagewright.toml");

        fs::write(
            &config_path,
            r#"
max_workers = 3

[layout]
padding = 4

[layout.class_thresholds]
Table = 0.4

[reconciler]
acceptance_threshold = 0.8

[vision]
model = "gemini-1.5-pro"
        "#,
        )
        .unwrap();

        let config = PipelineConfig::from_toml_file(&config_path).unwrap();
        assert_eq!(config.max_workers, 3);
        assert_eq!(config.layout.padding, 4);
        assert_eq!(config.layout.detection_iou, 0.1);
        assert_eq!(config.reconciler.acceptance_threshold, 0.8);
        assert_eq!(config.reconciler.region_recognition_min_spans, 2);

        let vision = config.vision.as_ref().unwrap();
        assert_eq!(vision.model, "gemini-1.5-pro");
        assert_eq!(vision.api_key_env, "GOOGLE_API_KEY");

        let thresholds = config.layout.class_thresholds().unwrap();
        assert_eq!(thresholds.threshold_for(LayoutClass::Table), 0.4);
        assert_eq!(thresholds.threshold_for(LayoutClass::Title), 0.05);
    }

    #[test]
    fn test_from_yaml_and_json() {
        let dir = tempdir().unwrap();
        let yaml = dir.path().join("config.yaml");
        fs::write(&yaml, "reading_order:\n  line_threshold: 15.0\n").unwrap();
        let config = PipelineConfig::from_file(&yaml).unwrap();
        assert_eq!(config.reading_order.line_threshold, 15.0);
        assert_eq!(config.reading_order.line_grouping(), RowGrouping::Fixed(15.0));

        let json = dir.path().join("config.json");
        fs::write(&json, r#"{"table": {"enabled": false}}"#).unwrap();
        let config = PipelineConfig::from_file(&json).unwrap();
        assert!(!config.table.enabled);
        assert_eq!(config.table.structure_confidence, 0.5);
    }

    #[test]
    fn test_invalid_toml_is_validation_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "max_workers = [").unwrap();
        let err = PipelineConfig::from_toml_file(&path).unwrap_err();
        assert!(matches!(err, PagewrightError::Validation { .. }));
    }

    #[test]
    fn test_missing_file_is_validation_error() {
        let err = PipelineConfig::from_toml_file("/nonexistent/pagewright.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_discover_from_parent_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "max_workers = 2\n").unwrap();
        let nested = dir.path().join("scans").join("batch-1");
        fs::create_dir_all(&nested).unwrap();

        let config = PipelineConfig::discover_from(&nested).unwrap();
        assert_eq!(config.unwrap().max_workers, 2);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = PipelineConfig::default();
        config.reconciler.acceptance_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.reading_order.line_threshold = 0.0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.layout.class_thresholds.insert("Paragraph".to_string(), 0.5);
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.max_workers = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.key_values = Some(KeyValueConfig {
            prompt: "Return JSON for this page.".to_string(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_key_value_prompt_rendering() {
        let config = toml::from_str::<PipelineConfig>("[key_values]\n").unwrap();
        let key_values = config.key_values.unwrap();
        assert!(key_values.prompt.contains(KEY_VALUE_PLACEHOLDER));

        let rendered = key_values.render_prompt("Roll No: 42");
        assert!(rendered.ends_with("Text:\nRoll No: 42\n"));
        assert!(!rendered.contains(KEY_VALUE_PLACEHOLDER));
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let mut config = PipelineConfig::default();
        config.vision = Some(VisionConfig::default());
        config.key_values = Some(KeyValueConfig::default());
        let serialized = toml::to_string(&config).unwrap();
        let parsed: PipelineConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, config);
    }
}
