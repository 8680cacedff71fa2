//! Batch command - submit many invoice images in sequence.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use gstx_core::{ExtractionId, ExtractionSubmitter, Transport, UploadFile, Validator};

use super::ConfigSource;

/// Image extensions picked up from the glob.
const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of invoice images (e.g. "invoices/*.jpg")
    #[arg(required = true)]
    input: String,

    /// Write a summary CSV
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome of one file.
struct SubmitResult {
    path: PathBuf,
    extraction_id: Option<ExtractionId>,
    error: Option<String>,
    submitted_at: DateTime<Utc>,
    elapsed_ms: u64,
}

pub async fn run(args: BatchArgs, source: ConfigSource<'_>) -> anyhow::Result<()> {
    let start = Instant::now();

    let (config, client) = source.client()?;
    let submitter = ExtractionSubmitter::new(client, Validator::new(config.upload));

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_image(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching image files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to submit",
        style("ℹ").blue(),
        files.len()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        pb.set_message(
            path.file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string(),
        );

        let submitted_at = Utc::now();
        let file_start = Instant::now();
        let outcome = submit_one(&submitter, &path).await;
        let elapsed_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(id) => results.push(SubmitResult {
                path,
                extraction_id: Some(id),
                error: None,
                submitted_at,
                elapsed_ms,
            }),
            Err(e) => {
                let message = e.to_string();
                if !args.continue_on_error {
                    pb.abandon();
                    error!("Failed to submit {}: {}", path.display(), message);
                    anyhow::bail!("Submission of {} failed: {}", path.display(), message);
                }
                warn!("Failed to submit {}: {}", path.display(), message);
                results.push(SubmitResult {
                    path,
                    extraction_id: None,
                    error: Some(message),
                    submitted_at,
                    elapsed_ms,
                });
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let (succeeded, failed): (Vec<_>, Vec<_>) =
        results.iter().partition(|r| r.extraction_id.is_some());

    println!();
    println!(
        "{} Submitted {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(succeeded.len()).green(),
        style(failed.len()).red()
    );

    for result in &succeeded {
        if let Some(id) = &result.extraction_id {
            println!("  {} {}", result.path.display(), style(id).dim());
        }
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

async fn submit_one<T: Transport>(
    submitter: &ExtractionSubmitter<T>,
    path: &Path,
) -> anyhow::Result<ExtractionId> {
    let file = UploadFile::from_path(path)?;
    Ok(submitter.submit_image(&file).await?)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn write_summary(path: &Path, results: &[SubmitResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "extraction_id",
        "submitted_at",
        "elapsed_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let submitted_at = result.submitted_at.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let elapsed = result.elapsed_ms.to_string();

        match &result.extraction_id {
            Some(id) => wtr.write_record([
                filename,
                "success",
                id.as_str(),
                submitted_at.as_str(),
                elapsed.as_str(),
                "",
            ])?,
            None => wtr.write_record([
                filename,
                "error",
                "",
                submitted_at.as_str(),
                elapsed.as_str(),
                result.error.as_deref().unwrap_or(""),
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
