//! `patchprep` CLI - cut a directory of images into train/test patch sets.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use patchprep::{Config, Pipeline};

/// Resize, center-crop and cut images into random non-overlapping patches,
/// then split all patches into train and test sets.
#[derive(Parser, Debug)]
#[command(name = "patchprep")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory scanned recursively for input images.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Directory receiving the `train/` and `test/` subdirectories.
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Patches cut from every image.
    #[arg(short = 'n', long, value_name = "INT")]
    samples: Option<usize>,

    /// Fraction of patches assigned to the training set (0.0-1.0).
    #[arg(long, value_name = "FLOAT")]
    train_ratio: Option<f64>,

    /// Random seed for reproducibility.
    #[arg(long, value_name = "INT")]
    seed: Option<u64>,

    /// Hide progress bars.
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("patchprep={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    if !args.input.is_dir() {
        anyhow::bail!("Input directory does not exist: {}", args.input.display());
    }

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => Config::default(),
    };

    // Command-line values take precedence over the file
    if let Some(samples) = args.samples {
        config.samples_per_image = samples;
    }
    if let Some(ratio) = args.train_ratio {
        config.train_ratio = ratio;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    let mut pipeline = Pipeline::new(config)
        .context("Failed to initialize pipeline")?
        .with_progress(!args.quiet);

    let summary = pipeline
        .run(&args.input, &args.output)
        .context("Failed to build patch dataset")?;

    println!(
        "Successfully processed {} -> {}: {summary}",
        args.input.display(),
        args.output.display()
    );

    Ok(())
}
