//! signaug CLI Tool
//!
//! Command-line interface for augmenting sign-language video datasets.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use signaug_batch::{BatchDriver, RunSummary};
use signaug_codec::FfmpegCodec;
use signaug_core::config::DEFAULT_FPS;
use signaug_core::{AugmentConfig, TransformSpec};
use signaug_transform::{augment_video_chain, LiftOptions};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "signaug")]
#[command(about = "Deterministic video augmentation for sign-language datasets")]
#[command(version)]
struct Cli {
    /// Increase log detail (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Augment every video of a dataset tree (root/<category>/<video>)
    Augment {
        /// Dataset root
        input: Option<PathBuf>,

        /// Output root, mirrored from the dataset root
        output: Option<PathBuf>,

        /// JSON configuration file; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Transform to apply, e.g. flip, rotate:10, translate:25,0, resize:-0.2, blur:5
        /// (repeatable; defaults to the built-in set)
        #[arg(short, long = "transform", value_name = "SPEC")]
        transforms: Vec<TransformSpec>,

        /// Output frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Units processed concurrently [default: number of CPUs]
        #[arg(short, long)]
        workers: Option<usize>,

        /// Do not create empty category directories up front
        #[arg(long)]
        no_mirror: bool,

        /// Copy each source video into the output tree as well
        #[arg(long)]
        copy_originals: bool,

        /// Accepted input extension (repeatable; default accepts any file)
        #[arg(long = "ext", value_name = "EXT")]
        extensions: Vec<String>,

        /// Per-unit time limit in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Write the run summary as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Apply transforms to a single video, in order
    Apply {
        /// Input video file path
        input: PathBuf,

        /// Output video file path
        #[arg(short, long)]
        output: PathBuf,

        /// Transform to apply (repeatable, applied in the given order)
        #[arg(short, long = "transform", value_name = "SPEC", required = true)]
        transforms: Vec<TransformSpec>,

        /// Output frame rate
        #[arg(long, default_value_t = DEFAULT_FPS)]
        fps: u32,

        /// Time limit in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Show stream information of a video
    Probe {
        /// Input video file path
        input: PathBuf,

        /// Decode the whole video and count its frames
        #[arg(long)]
        count: bool,
    },

    /// Rename the videos of one category to word-<word>-<NNN>.<ext>
    Rename {
        /// Category directory
        dir: PathBuf,

        /// Word used in the new names
        #[arg(short, long)]
        word: String,

        /// First number
        #[arg(long, default_value_t = 1)]
        start: u32,

        /// Print the renames without performing them
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Augment {
            input,
            output,
            config,
            transforms,
            fps,
            workers,
            no_mirror,
            copy_originals,
            extensions,
            timeout,
            report,
        } => {
            let mut config = match config {
                Some(path) => AugmentConfig::from_json_file(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => AugmentConfig {
                    workers: num_cpus::get(),
                    ..AugmentConfig::default()
                },
            };
            if let Some(input) = input {
                config.input_root = input;
            }
            if let Some(output) = output {
                config.output_root = output;
            }
            if !transforms.is_empty() {
                config.transforms = transforms;
            }
            if let Some(fps) = fps {
                config.fps = fps;
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if no_mirror {
                config.mirror = false;
            }
            if copy_originals {
                config.copy_originals = true;
            }
            if !extensions.is_empty() {
                config.extensions = extensions;
            }
            if timeout.is_some() {
                config.unit_timeout_secs = timeout;
            }

            augment_dataset(config, report)?
        }

        Commands::Apply {
            input,
            output,
            transforms,
            fps,
            timeout,
        } => apply(input, output, transforms, fps, timeout)?,

        Commands::Probe { input, count } => probe(input, count)?,

        Commands::Rename {
            dir,
            word,
            start,
            dry_run,
        } => rename(dir, word, start, dry_run)?,
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn augment_dataset(config: AugmentConfig, report: Option<PathBuf>) -> Result<()> {
    println!("Augmenting dataset: {}", config.input_root.display());
    println!("Output: {}", config.output_root.display());
    println!(
        "Transforms: {}",
        config
            .transforms
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    tracing::debug!(?config, "resolved configuration");
    let driver = BatchDriver::new(FfmpegCodec::new(), config).context("Invalid configuration")?;
    let summary = driver.run().context("Augmentation run failed")?;

    println!("\n{summary}");

    if let Some(path) = report {
        write_report(&path, &summary)?;
        println!("Report written to {}", path.display());
    }

    if !summary.is_clean() {
        bail!(
            "{} of {} units failed, {} original copies failed",
            summary.failed,
            summary.attempted,
            summary.copy_failures.len()
        );
    }

    Ok(())
}

fn write_report(path: &Path, summary: &RunSummary) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)
        .context("Failed to write report")?;
    Ok(())
}

fn apply(
    input: PathBuf,
    output: PathBuf,
    transforms: Vec<TransformSpec>,
    fps: u32,
    timeout: Option<u64>,
) -> Result<()> {
    println!("Augmenting video: {}", input.display());
    println!("Output: {}", output.display());

    if let Some(dir) = output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).context("Failed to create output directory")?;
    }

    let options = LiftOptions {
        fps,
        timeout: timeout.map(Duration::from_secs),
    };
    let stats = augment_video_chain(&FfmpegCodec::new(), &input, &output, &transforms, &options)
        .context("Failed to augment video")?;

    println!(
        "Wrote {} frames at {}x{} ({} fps) to {}",
        stats.frames,
        stats.width,
        stats.height,
        fps,
        output.display()
    );
    Ok(())
}

fn probe(input: PathBuf, count: bool) -> Result<()> {
    let info = signaug_codec::probe(&input, count)
        .with_context(|| format!("Failed to probe {}", input.display()))?;

    println!("=== {} ===", input.display());
    println!("{info}");
    Ok(())
}

fn rename(dir: PathBuf, word: String, start: u32, dry_run: bool) -> Result<()> {
    let renames = signaug_batch::rename(&dir, &word, start, dry_run)
        .with_context(|| format!("Failed to rename files in {}", dir.display()))?;

    for (from, to) in &renames {
        println!(
            "  {} -> {}",
            from.file_name().unwrap_or_default().to_string_lossy(),
            to.file_name().unwrap_or_default().to_string_lossy()
        );
    }
    if dry_run {
        println!("Dry run: {} files would be renamed", renames.len());
    } else {
        println!("Renamed {} files", renames.len());
    }
    Ok(())
}
