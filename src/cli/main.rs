//! Chroma-key matte CLI tool
//!
//! Command-line interface for stripping flat green backdrops from generated
//! sprites using the matte processor.

use super::config::CliConfigBuilder;
use crate::{
    config::OutputFormat,
    processor::MatteProcessor,
    services::{Base64Codec, ImageIOService, OutputFormatHandler},
    tracing_config::{events, init_cli_tracing, spans},
    types::MatteResult,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn, Instrument};

/// Chroma-key background removal for generated sprites
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "pixelforge-matte")]
pub struct Cli {
    /// Input image files or directories (use "-" for stdin)
    #[arg(value_name = "INPUT", required = true)]
    pub input: Vec<String>,

    /// Output file (single input) or directory (batch processing). Use "-" for stdout.
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<String>,

    /// Output format [default: png, or the config file's value]
    #[arg(short, long, value_enum)]
    pub format: Option<CliOutputFormat>,

    /// Backdrop color to key out, as #RRGGBB [default: #00FF00]
    #[arg(long, value_name = "HEX")]
    pub key_color: Option<String>,

    /// Distance to the key below which pixels are always cleared [default: 50]
    #[arg(long, value_name = "DISTANCE")]
    pub tight_tolerance: Option<f32>,

    /// Distance to the key below which border-connected pixels are cleared [default: 100]
    #[arg(long, value_name = "DISTANCE")]
    pub flood_tolerance: Option<f32>,

    /// Spacing of flood-fill seeds along the image border [default: 10]
    #[arg(long, value_name = "PIXELS")]
    pub seed_stride: Option<u32>,

    /// JSON file with matte settings; flags given on the command line win
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Read stdin and write stdout as base64 text (data URLs accepted)
    #[arg(long)]
    pub base64: bool,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Process directory recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Pattern for batch processing (e.g., "*.png")
    #[arg(long)]
    pub pattern: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Webp,
    Tiff,
    Rgba8,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(format: CliOutputFormat) -> Self {
        match format {
            CliOutputFormat::Png => OutputFormat::Png,
            CliOutputFormat::Webp => OutputFormat::WebP,
            CliOutputFormat::Tiff => OutputFormat::Tiff,
            CliOutputFormat::Rgba8 => OutputFormat::Rgba8,
        }
    }
}

/// Outcome of a batch run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_id = uuid::Uuid::new_v4().to_string();
    let _guard =
        init_cli_tracing(cli.verbose, &session_id).context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    let session = spans::session(&session_id, &config.key_color.to_hex());
    debug!(?config, "Resolved matte configuration");

    let processor = MatteProcessor::new(config).context("Failed to create matte processor")?;
    let summary = process_inputs(&cli, &processor).instrument(session).await?;

    if summary.failed > 0 {
        anyhow::bail!(
            "{} of {} file(s) failed to process",
            summary.failed,
            summary.processed + summary.failed
        );
    }
    Ok(())
}

/// Process every input and report how many succeeded and failed
async fn process_inputs(cli: &Cli, processor: &MatteProcessor) -> Result<BatchSummary> {
    if cli.input.len() == 1 && cli.input.first().is_some_and(|s| s == "-") {
        process_stdin(cli, processor).await?;
        return Ok(BatchSummary {
            processed: 1,
            failed: 0,
        });
    }

    let mut all_files = Vec::new();
    for input in &cli.input {
        let path = PathBuf::from(input);

        if path.is_file() {
            if ImageIOService::is_supported_format(&path) {
                all_files.push(path);
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            all_files.extend(find_image_files(&path, cli.recursive, cli.pattern.as_deref())?);
        } else {
            anyhow::bail!(
                "Input path does not exist or is not accessible: {}",
                path.display()
            );
        }
    }

    if all_files.is_empty() {
        events::warning_with_recommendation(
            "No supported image files found in the provided inputs",
            "check --pattern, or pass -r to search nested directories",
        );
        return Ok(BatchSummary::default());
    }

    // Sort files alphanumerically for consistent processing order
    all_files.sort();
    all_files.dedup();

    let file_count = all_files.len();
    let _batch = spans::batch_processing(file_count).entered();
    info!("Found {} image file(s) to process", file_count);

    let output_format = processor.config().output_format;
    let output_dir = if file_count > 1 {
        batch_output_dir(cli.output.as_deref())?
    } else {
        None
    };

    let progress = if file_count > 1 {
        let pb = ProgressBar::new(file_count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut summary = BatchSummary::default();
    let batch_start_time = Instant::now();

    for input_file in &all_files {
        if let Some(ref pb) = progress {
            pb.set_message(format!("Processing {}", input_file.display()));
        }

        let output_target = if file_count == 1 {
            match cli.output.as_deref() {
                Some(target) if Path::new(target).is_dir() => Some(
                    generate_output_path_with_dir(input_file, Path::new(target), output_format)
                        .display()
                        .to_string(),
                ),
                other => other.map(str::to_string),
            }
        } else {
            output_dir.as_ref().map(|dir| {
                generate_output_path_with_dir(input_file, dir, output_format)
                    .display()
                    .to_string()
            })
        };

        match process_single_file(processor, input_file, output_target.as_deref()) {
            Ok(()) => summary.processed += 1,
            Err(e) => {
                events::error_with_context(
                    &format!("{:#}", e),
                    &format!("processing {}", input_file.display()),
                );
                summary.failed += 1;
            },
        }

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "Completed! Processed: {}, Failed: {}",
            summary.processed, summary.failed
        ));
    }

    if file_count > 1 {
        let batch_total_time = batch_start_time.elapsed();
        info!(
            processed = summary.processed,
            failed = summary.failed,
            total_s = %format!("{:.2}", batch_total_time.as_secs_f64()),
            "Batch complete"
        );
    }

    Ok(summary)
}

/// Validate and create the output directory for a batch
fn batch_output_dir(output: Option<&str>) -> Result<Option<PathBuf>> {
    let Some(output) = output else {
        return Ok(None);
    };
    if output == "-" {
        anyhow::bail!("Cannot use stdout (-) as output when processing multiple files");
    }

    let output_path = PathBuf::from(output);
    if output_path.is_file() {
        anyhow::bail!(
            "Output path exists and is a file, not a directory: {}",
            output_path.display()
        );
    }
    std::fs::create_dir_all(&output_path).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;
    Ok(Some(output_path))
}

/// Matte one file and write the result
fn process_single_file(
    processor: &MatteProcessor,
    input_path: &Path,
    output_target: Option<&str>,
) -> Result<()> {
    let extension = input_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("unknown");
    let _span = spans::file_processing(input_path, extension).entered();

    let mut result = processor
        .process_file(input_path)
        .context("Failed to extract matte")?;
    let format = processor.config().output_format;

    match output_target {
        Some("-") => {
            let output_data = result.to_bytes(format)?;
            write_stdout(&output_data)?;
        },
        Some(target) => {
            result
                .save(target, format)
                .with_context(|| format!("Failed to save result to {}", target))?;
        },
        None => {
            let output_path = generate_output_path(input_path, format);
            result.save(&output_path, format).with_context(|| {
                format!("Failed to save result to {}", output_path.display())
            })?;
        },
    }

    log_result(input_path, &result);
    Ok(())
}

fn log_result(input_path: &Path, result: &MatteResult) {
    let stats = result.statistics();
    info!(
        "{}: {} of {} pixels transparent ({:.1}%)",
        input_path.display(),
        stats.transparent_pixels,
        stats.total_pixels,
        stats.transparency_ratio() * 100.0
    );
    debug!("{}", result.timing_summary());
}

/// Matte an image piped on stdin
async fn process_stdin(cli: &Cli, processor: &MatteProcessor) -> Result<()> {
    info!("Reading image from stdin");
    let start_time = Instant::now();
    let format = processor.config().output_format;

    let mut stdin = tokio::io::stdin();
    let (mut result, as_data_url) = if cli.base64 {
        let mut text = String::new();
        stdin
            .read_to_string(&mut text)
            .await
            .context("Failed to read base64 text from stdin")?;
        let result = processor
            .process_base64(&text)
            .context("Failed to extract matte from base64 input")?;
        (result, text.trim_start().starts_with("data:"))
    } else {
        let result = processor
            .process_reader(stdin)
            .await
            .context("Failed to extract matte from stdin. Supported formats: PNG, JPEG, WebP, TIFF")?;
        (result, false)
    };

    info!(
        "Processed stdin image in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    match cli.output.as_deref() {
        Some(target) if target != "-" => {
            result
                .save(target, format)
                .with_context(|| format!("Failed to save result to {}", target))?;
            info!("Image saved to: {}", target);
        },
        _ => {
            let bytes = result.to_bytes(format)?;
            if cli.base64 {
                let text = if as_data_url {
                    Base64Codec::to_data_url(&bytes, OutputFormatHandler::mime_type(format))
                } else {
                    Base64Codec::encode(&bytes)
                };
                write_stdout(text.as_bytes())?;
            } else {
                write_stdout(&bytes)?;
            }
            debug!("Image written to stdout");
        },
    }

    Ok(())
}

fn write_stdout(data: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(data)
        .context("Failed to write image data to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Find image files in a directory
fn find_image_files(dir: &Path, recursive: bool, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if recursive {
        for entry in walkdir::WalkDir::new(dir) {
            let entry = entry?;
            if entry.file_type().is_file() {
                let path = entry.path();
                if is_image_file(path) && matches_pattern(path, pattern) {
                    files.push(path.to_path_buf());
                }
            }
        }
    } else {
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if is_image_file(&path) && matches_pattern(&path, pattern) {
                    files.push(path);
                }
            }
        }
    }

    Ok(files)
}

/// Directory scans pick up supported images but not earlier `_matte` outputs
fn is_image_file(path: &Path) -> bool {
    let is_output = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.ends_with("_matte"));
    ImageIOService::is_supported_format(path) && !is_output
}

/// Check if file matches the given pattern
fn matches_pattern(path: &Path, pattern: Option<&str>) -> bool {
    match pattern {
        Some(pat) => path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|filename| {
                glob::Pattern::new(pat)
                    .map(|p| p.matches(filename))
                    .unwrap_or(false)
            }),
        None => true,
    }
}

/// Default output path next to the input: `<stem>_matte.<ext>`
fn generate_output_path(input_path: &Path, format: OutputFormat) -> PathBuf {
    let dir = input_path.parent().unwrap_or(Path::new("."));
    generate_output_path_with_dir(input_path, dir, format)
}

/// Output path inside `output_dir`
fn generate_output_path_with_dir(
    input_path: &Path,
    output_dir: &Path,
    format: OutputFormat,
) -> PathBuf {
    let stem = input_path.file_stem().unwrap_or_default();
    output_dir.join(format!(
        "{}_matte.{}",
        stem.to_string_lossy(),
        OutputFormatHandler::get_extension(format)
    ))
}
