//! yoloprep: dataset preparation passes for YOLO-style detection datasets.
//!
//! Two independent, idempotent passes work over a dataset root holding an
//! `images/` tree and a parallel `labels/` tree:
//!
//! - [`normalize`]: re-encode AVIF/WEBP images to JPEG, keeping each image
//!   paired with its label file.
//! - [`reclassify`]: rewrite the class index of label files selected by a
//!   filename heuristic.
//!
//! # Modules
//!
//! - [`layout`]: dataset layout discovery and file scanning
//! - [`sample`]: transactional image/label moves and atomic writes
//! - [`config`]: pass options and the YAML reclassify config
//! - [`error`]: Error types for yoloprep operations

pub mod config;
pub mod error;
pub mod layout;
pub mod normalize;
pub mod reclassify;
pub mod report;
pub mod sample;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::PrepError;

use config::{NormalizeOptions, ReclassifyConfig, DEFAULT_JPEG_QUALITY};
use report::{render, ReportFormat};

/// The yoloprep CLI application.
#[derive(Parser)]
#[command(name = "yoloprep")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Re-encode AVIF/WEBP images to JPEG and keep labels paired.
    Normalize(NormalizeArgs),
    /// Rewrite class indices in label files selected by filename keywords.
    Reclassify(ReclassifyArgs),
}

/// Options shared by every pass.
#[derive(clap::Args)]
struct CommonArgs {
    /// Dataset root (defaults to datasets/lixo_praia next to the executable).
    #[arg(long, env = "YOLOPREP_DATASET")]
    root: Option<PathBuf>,

    /// Report what would change without touching the dataset.
    #[arg(long)]
    dry_run: bool,

    /// Exit non-zero if any file failed.
    #[arg(long)]
    strict: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    output: ReportFormat,
}

impl CommonArgs {
    fn dataset_root(&self) -> PathBuf {
        self.root
            .clone()
            .unwrap_or_else(layout::default_dataset_root)
    }
}

/// Arguments for the normalize subcommand.
#[derive(clap::Args)]
struct NormalizeArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// JPEG quality for re-encoded images (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
    quality: u8,
}

/// Arguments for the reclassify subcommand.
#[derive(clap::Args)]
struct ReclassifyArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Labels directory to scan (defaults to <root>/labels/train).
    #[arg(long)]
    labels_dir: Option<PathBuf>,

    /// YAML file with keywords, source_class and target_class.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Filename keyword selecting the category (repeatable; replaces the
    /// configured set).
    #[arg(long = "keyword")]
    keywords: Vec<String>,

    /// Class index to replace.
    #[arg(long)]
    source_class: Option<u32>,

    /// Class index to write instead.
    #[arg(long)]
    target_class: Option<u32>,
}

impl ReclassifyArgs {
    fn resolve_config(&self) -> Result<ReclassifyConfig, PrepError> {
        let mut config = match &self.config {
            Some(path) => ReclassifyConfig::from_yaml_file(path)?,
            None => ReclassifyConfig::default(),
        };
        if !self.keywords.is_empty() {
            config.keywords = self.keywords.clone();
        }
        if let Some(source) = self.source_class {
            config.source_class = source;
        }
        if let Some(target) = self.target_class {
            config.target_class = target;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Run the yoloprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PrepError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Normalize(args)) => run_normalize(args),
        Some(Commands::Reclassify(args)) => run_reclassify(args),
        None => {
            println!("yoloprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Dataset preparation for YOLO training.");
            println!();
            println!("Run 'yoloprep --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the normalize subcommand.
fn run_normalize(args: NormalizeArgs) -> Result<(), PrepError> {
    let root = args.common.dataset_root();
    let opts = NormalizeOptions {
        jpeg_quality: args.quality,
        dry_run: args.common.dry_run,
    };

    tracing::info!("Normalizing images in {}", root.display());
    let report = normalize::normalize_dataset(&root, &opts)?;
    print!("{}", render(&report, args.common.output)?);

    finish(args.common.strict, report.errors)
}

/// Execute the reclassify subcommand.
fn run_reclassify(args: ReclassifyArgs) -> Result<(), PrepError> {
    let config = args.resolve_config()?;
    let root = args.common.dataset_root();
    let labels_dir = args
        .labels_dir
        .clone()
        .unwrap_or_else(|| root.join(layout::DEFAULT_LABELS_SPLIT));

    tracing::info!("Reclassifying labels in {}", labels_dir.display());
    let mut report = reclassify::reclassify_labels(&labels_dir, &config, args.common.dry_run)?;
    report.target_class_name = target_class_name(&root, config.target_class);
    print!("{}", render(&report, args.common.output)?);

    finish(args.common.strict, report.errors)
}

/// Name of `class` from the dataset's class map. A broken class map only
/// costs the label in the summary, so it is logged and ignored.
fn target_class_name(root: &std::path::Path, class: u32) -> Option<String> {
    match layout::read_class_names(root) {
        Ok(names) => names.and_then(|names| names.get(&(class as usize)).cloned()),
        Err(err) => {
            tracing::warn!("Ignoring class names: {err}");
            None
        }
    }
}

fn finish(strict: bool, errors: usize) -> Result<(), PrepError> {
    if strict && errors > 0 {
        Err(PrepError::PassFailed { errors })
    } else {
        Ok(())
    }
}
