//! History command - list, delete and download past extractions.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::{style, Term};
use serde::Serialize;

use gstx_core::models::extraction::ExtractionSummary;
use gstx_core::normalize::{format_amount, PLACEHOLDER};
use gstx_core::{ExtractionId, HistoryStats, HistoryStore, Transport};

use super::{spinner, ConfigSource};

/// Arguments for the history command.
#[derive(Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    command: HistoryCommand,
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List past extractions, newest first
    List {
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: ListFormat,
    },

    /// Delete an extraction
    Delete {
        /// Extraction ID
        id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Download an extraction as JSON
    Download {
        /// Extraction ID
        id: String,

        /// Directory to save into (default: output.download_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ListFormat {
    /// Aligned table with totals
    Table,
    /// JSON document
    Json,
    /// CSV rows
    Csv,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    stats: HistoryStats,
    extractions: &'a [ExtractionSummary],
}

pub async fn run(args: HistoryArgs, source: ConfigSource<'_>) -> anyhow::Result<()> {
    let (config, client) = source.client()?;
    let mut store = HistoryStore::new(client);

    match args.command {
        HistoryCommand::List { format } => {
            load(&mut store).await?;
            print_list(&store, format)
        }
        HistoryCommand::Delete { id, yes } => {
            load(&mut store).await?;
            delete(&mut store, &ExtractionId::new(id), yes).await
        }
        HistoryCommand::Download { id, output_dir } => {
            let dir = output_dir.unwrap_or(config.output.download_dir);
            download(&store, &ExtractionId::new(id), dir).await
        }
    }
}

async fn load<T: Transport>(store: &mut HistoryStore<T>) -> anyhow::Result<()> {
    let pb = spinner("Loading extraction history...")?;
    let result = store.list().await;
    pb.finish_and_clear();

    if let Err(e) = result {
        eprintln!("{} Failed to load extraction history", style("✗").red());
        anyhow::bail!("{}. Run the command again to retry.", e);
    }
    Ok(())
}

fn print_list<T: Transport>(store: &HistoryStore<T>, format: ListFormat) -> anyhow::Result<()> {
    let records = store.records();
    let stats = store.stats();

    match format {
        ListFormat::Json => {
            let output = ListOutput {
                stats,
                extractions: records,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        ListFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.write_record([
                "extraction_id",
                "timestamp",
                "invoice_number",
                "supplier_name",
                "total_amount",
            ])?;
            for record in records {
                let amount = record.total_amount.to_string();
                wtr.write_record([
                    record.extraction_id.as_str(),
                    record.timestamp.as_str(),
                    record.invoice_number.as_deref().unwrap_or_default(),
                    record.supplier_name.as_deref().unwrap_or_default(),
                    amount.as_str(),
                ])?;
            }
            wtr.flush()?;
        }
        ListFormat::Table => {
            if records.is_empty() {
                println!(
                    "{} No extractions yet. Run 'gstx extract image <FILE>' to add one.",
                    style("ℹ").blue()
                );
                return Ok(());
            }

            println!(
                "{:<18} {:<20} {:<28} {:>14}  {}",
                "Date", "Invoice", "Supplier", "Amount", "ID"
            );
            for record in records {
                println!(
                    "{:<18} {:<20} {:<28} {:>14}  {}",
                    display_date(record),
                    record.invoice_number.as_deref().unwrap_or(PLACEHOLDER),
                    record.supplier_name.as_deref().unwrap_or(PLACEHOLDER),
                    format!("₹{}", format_amount(record.total_amount)),
                    record.extraction_id
                );
            }
            println!();
            print_stats(&stats);
        }
    }

    Ok(())
}

fn print_stats(stats: &HistoryStats) {
    println!(
        "{} {} extractions, {} unique suppliers, total ₹{}",
        style("ℹ").blue(),
        stats.count,
        stats.unique_suppliers,
        format_amount(stats.total_amount)
    );
}

async fn delete<T: Transport>(
    store: &mut HistoryStore<T>,
    id: &ExtractionId,
    yes: bool,
) -> anyhow::Result<()> {
    let confirmation = store.request_delete(id)?;

    if !yes {
        let prompt = match store.get(id) {
            Some(record) => format!(
                "Delete extraction {} (invoice {}, ₹{})? [y/N] ",
                id,
                record.invoice_number.as_deref().unwrap_or(PLACEHOLDER),
                format_amount(record.total_amount)
            ),
            None => format!("Delete extraction {}? [y/N] ", id),
        };

        let term = Term::stderr();
        term.write_str(&prompt)?;
        let answer = term.read_line()?;

        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("{} Delete cancelled", style("ℹ").blue());
            return Ok(());
        }
    }

    let pb = spinner("Deleting extraction...")?;
    let result = store.confirm_delete(confirmation).await;
    pb.finish_and_clear();
    result?;

    println!("{} Deleted extraction {}", style("✓").green(), id);
    print_stats(&store.stats());
    Ok(())
}

async fn download<T: Transport>(
    store: &HistoryStore<T>,
    id: &ExtractionId,
    dir: PathBuf,
) -> anyhow::Result<()> {
    let pb = spinner("Downloading extraction...")?;
    let result = store.download(id).await;
    pb.finish_and_clear();

    let download = result?;
    fs::create_dir_all(&dir)?;
    let path = download.save_into(&dir)?;

    println!(
        "{} Saved {} ({} bytes)",
        style("✓").green(),
        path.display(),
        download.bytes.len()
    );
    Ok(())
}

fn display_date(record: &ExtractionSummary) -> String {
    record
        .created_at()
        .map(|t| t.format("%d %b %Y %H:%M").to_string())
        .unwrap_or_else(|| record.timestamp.clone())
}
