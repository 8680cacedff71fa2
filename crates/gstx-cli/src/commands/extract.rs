//! Extract command - submit an invoice image or text.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Subcommand};
use console::style;
use tracing::{debug, info};

use gstx_core::{ExtractionId, ExtractionSubmitter, GstxError, UploadFile, Validator};

use super::show::{self, OutputFormat};
use super::{spinner, ConfigSource};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    #[command(subcommand)]
    command: ExtractCommand,
}

#[derive(Subcommand)]
enum ExtractCommand {
    /// Extract invoice data from an image (JPG, PNG, BMP, TIFF, WEBP)
    Image(ImageArgs),

    /// Extract invoice data from raw invoice text
    Text(TextArgs),
}

#[derive(Args)]
struct ImageArgs {
    /// Invoice image
    #[arg(required = true)]
    input: PathBuf,

    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Args)]
struct TextArgs {
    /// Invoice text, or "-" to read standard input
    #[arg(conflicts_with = "file")]
    text: Option<String>,

    /// Read the invoice text from a file
    #[arg(short, long)]
    file: Option<PathBuf>,

    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Args)]
struct ViewArgs {
    /// Show the extracted invoice once done
    #[arg(long)]
    show: bool,

    /// Output format used with --show
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub async fn run(args: ExtractArgs, source: ConfigSource<'_>) -> anyhow::Result<()> {
    let start = Instant::now();

    let (config, client) = source.client()?;
    let submitter = ExtractionSubmitter::new(client.clone(), Validator::new(config.upload));

    let (result, view) = match args.command {
        ExtractCommand::Image(image_args) => {
            if !image_args.input.exists() {
                anyhow::bail!("Input file not found: {}", image_args.input.display());
            }
            let file = UploadFile::from_path(&image_args.input)?;
            info!("Submitting image {}", image_args.input.display());

            let pb = spinner("Extracting invoice data from image...")?;
            let result = submitter.submit_image(&file).await;
            pb.finish_and_clear();
            (result, image_args.view)
        }
        ExtractCommand::Text(text_args) => {
            let text = read_text(&text_args)?;
            debug!("Submitting {} characters of text", text.len());

            let pb = spinner("Extracting invoice data from text...")?;
            let result = submitter.submit_text(&text).await;
            pb.finish_and_clear();
            (result, text_args.view)
        }
    };

    let id = report(result)?;
    debug!("Extraction finished in {:?}", start.elapsed());

    if view.show {
        let invoice = show::fetch_view(&client, &id).await?;
        println!();
        println!("{}", show::render(&invoice, view.format)?);
    } else {
        println!();
        println!("Run 'gstx show {}' to view the extracted invoice.", id);
    }

    Ok(())
}

fn read_text(args: &TextArgs) -> anyhow::Result<String> {
    if let Some(path) = &args.file {
        if !path.exists() {
            anyhow::bail!("Input file not found: {}", path.display());
        }
        return Ok(fs::read_to_string(path)?);
    }

    match args.text.as_deref() {
        Some("-") => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
        Some(text) => Ok(text.to_string()),
        None => anyhow::bail!("No invoice text given. Pass TEXT, --file PATH or '-' for stdin."),
    }
}

/// Print the outcome of a submission and pass the id on.
fn report(result: gstx_core::Result<ExtractionId>) -> anyhow::Result<ExtractionId> {
    match result {
        Ok(id) => {
            println!(
                "{} Invoice data extracted successfully",
                style("✓").green()
            );
            println!("   Extraction ID: {}", style(&id).bold());
            Ok(id)
        }
        Err(GstxError::Validation(e)) => anyhow::bail!("Cannot submit: {}", e),
        Err(e) => {
            eprintln!("{} Extraction failed", style("✗").red());
            Err(e.into())
        }
    }
}
