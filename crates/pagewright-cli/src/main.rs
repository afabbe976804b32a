//! Pagewright command-line interface.
//!
//! Runs the model-free stages of the page pipeline over JSON or text inputs: layout
//! filtering, reading-order assembly, table export and form field extraction. Model
//! capabilities are library-only, so page images are not processed here.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use pagewright::layout::{assemble_reading_order, filter_regions};
use pagewright::{BoundingBox, Detection, FormProfile, LayoutClass, PipelineConfig, TableGrid};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pagewright")]
#[command(about = "Document page layout filtering, reading order, table export and form fields", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON). Defaults to the nearest pagewright.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop low-confidence, duplicate and nested layout detections
    Filter {
        /// JSON array of detections
        input: PathBuf,

        /// Override the configured overlap (IoU) threshold
        #[arg(long)]
        overlap: Option<f64>,
    },

    /// Filter detections and emit them in reading order
    Order {
        /// JSON array of detections
        input: PathBuf,

        /// Use fixed-threshold line grouping instead of adaptive row grouping
        #[arg(long)]
        lines: bool,
    },

    /// Render a table given as a JSON array of rows
    Table {
        /// JSON array of string arrays
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = TableFormat::Markdown)]
        format: TableFormat,
    },

    /// Extract named fields from a page transcript with a built-in form profile
    Extract {
        /// Plain-text transcript
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = Profile::EvaluationForm)]
        profile: Profile,
    },

    /// Print the effective configuration
    Config {
        #[arg(short, long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TableFormat {
    Markdown,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    EvaluationForm,
    SurveyForm,
}

impl From<Profile> for FormProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::EvaluationForm => FormProfile::EvaluationForm,
            Profile::SurveyForm => FormProfile::SurveyForm,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ConfigFormat {
    Toml,
    Json,
}

/// Detection as accepted on the command line: the class may be a name or the
/// detector's numeric id.
#[derive(Deserialize)]
struct InputDetection {
    bbox: BoundingBox,
    class: ClassRef,
    confidence: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClassRef {
    Id(u32),
    Name(String),
}

impl TryFrom<InputDetection> for Detection {
    type Error = anyhow::Error;

    fn try_from(input: InputDetection) -> Result<Self> {
        let class = match input.class {
            ClassRef::Id(id) => LayoutClass::from_id(id).with_context(|| format!("Unknown layout class id: {}", id))?,
            ClassRef::Name(name) => name.parse()?,
        };
        Ok(Detection::new(input.bbox, class, input.confidence))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Filter { input, overlap } => {
            let detections = read_detections(&input)?;
            let thresholds = config.layout.class_thresholds()?;
            let overlap = overlap.unwrap_or(config.layout.overlap_threshold);
            if !(0.0..=1.0).contains(&overlap) {
                bail!("overlap must be within [0, 1], got {}", overlap);
            }

            let kept = filter_regions(detections, &thresholds, overlap);
            println!("{}", serde_json::to_string_pretty(&kept)?);
        }
        Commands::Order { input, lines } => {
            let detections = read_detections(&input)?;
            let thresholds = config.layout.class_thresholds()?;
            let kept = filter_regions(detections, &thresholds, config.layout.overlap_threshold);

            let grouping = if lines {
                config.reading_order.line_grouping()
            } else {
                config.reading_order.region_grouping()
            };
            let ordered = assemble_reading_order(kept, grouping);
            println!("{}", serde_json::to_string_pretty(&ordered)?);
        }
        Commands::Table { input, format } => {
            let content = fs::read_to_string(&input).with_context(|| format!("Failed to read {}", input.display()))?;
            let rows: Vec<Vec<String>> =
                serde_json::from_str(&content).with_context(|| format!("Invalid table rows in {}", input.display()))?;
            let grid = TableGrid::from_rows(rows);

            match format {
                TableFormat::Markdown => print!("{}", grid.to_markdown()),
                TableFormat::Json => println!("{}", serde_json::to_string_pretty(&grid)?),
            }
        }
        Commands::Extract { input, profile } => {
            let text = fs::read_to_string(&input).with_context(|| format!("Failed to read {}", input.display()))?;
            let fields = FormProfile::from(profile).extractor().extract(&text);
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }
        Commands::Config { format } => match format {
            ConfigFormat::Toml => print!("{}", toml::to_string_pretty(&config)?),
            ConfigFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        },
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => {
            PipelineConfig::from_file(path).with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => PipelineConfig::discover()?.unwrap_or_default(),
    };
    config.validate()?;
    tracing::debug!(?config, "effective configuration");
    Ok(config)
}

fn read_detections(path: &Path) -> Result<Vec<Detection>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let inputs: Vec<InputDetection> =
        serde_json::from_str(&content).with_context(|| format!("Invalid detections in {}", path.display()))?;
    inputs.into_iter().map(Detection::try_from).collect()
}
