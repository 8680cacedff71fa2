//! Stats and health commands - service-wide counters and liveness.

use clap::Args;
use console::style;

use gstx_core::models::extraction::parse_timestamp;
use gstx_core::normalize::format_amount;
use gstx_core::{ApiStatus, StatsReporter};

use super::{spinner, ConfigSource};

/// Arguments for the stats command.
#[derive(Args)]
pub struct StatsArgs {
    /// Print the counters as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the health command.
#[derive(Args)]
pub struct HealthArgs {}

pub async fn run(args: StatsArgs, source: ConfigSource<'_>) -> anyhow::Result<()> {
    let (config, client) = source.client()?;
    let mut reporter = StatsReporter::new(client);

    let pb = spinner("Fetching service stats...")?;
    let snapshot = reporter.fetch().await.clone();
    pb.finish_and_clear();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        let status = match snapshot.api_status {
            ApiStatus::Ok => style("active").green(),
            ApiStatus::Loading => style("loading").yellow(),
            ApiStatus::Error => style("unreachable").red(),
        };

        println!("GST Invoice Extractor");
        println!("  API status:        {}", status);
        println!("  Total extractions: {}", snapshot.total_extractions);
        println!("  Total amount:      ₹{}", format_amount(snapshot.total_invoice_amount));
        println!("  Unique suppliers:  {}", snapshot.unique_suppliers);
    }

    if snapshot.api_status == ApiStatus::Error {
        anyhow::bail!(
            "Could not fetch stats from {}. Check that the extraction service is running.",
            config.api.base_url
        );
    }

    Ok(())
}

pub async fn health(_args: HealthArgs, source: ConfigSource<'_>) -> anyhow::Result<()> {
    let (config, client) = source.client()?;
    let reporter = StatsReporter::new(client);

    let pb = spinner("Checking service health...")?;
    let result = reporter.health().await;
    pb.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            println!(
                "{} Service at {} is not healthy",
                style("✗").red(),
                config.api.base_url
            );
            return Err(e.into());
        }
    };

    println!(
        "{} Service at {} is up",
        style("✓").green(),
        config.api.base_url
    );
    if let Some(status) = &report.status {
        println!("  Status:      {}", status);
    }
    if let Some(engine) = &report.engine {
        println!("  Engine:      {}", engine);
    }
    if let Some(total) = report.total_extractions {
        println!("  Extractions: {}", total);
    }
    if let Some(timestamp) = &report.timestamp {
        let shown = parse_timestamp(timestamp)
            .map(|t| t.format("%d %b %Y %H:%M:%S").to_string())
            .unwrap_or_else(|| timestamp.clone());
        println!("  Checked at:  {}", shown);
    }

    Ok(())
}
