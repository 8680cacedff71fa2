//! Show command - render one extraction.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::debug;

use gstx_core::models::extraction::parse_timestamp;
use gstx_core::normalize::{format_amount, InvoiceView, TaxCell};
use gstx_core::{normalize, ApiClient, ApiError, ExtractionId, Transport};

use super::{spinner, ConfigSource};
use crate::clipboard::{self, ClipboardProvider, SystemClipboard};

/// Arguments for the show command.
#[derive(Args)]
pub struct ShowArgs {
    /// Extraction ID
    #[arg(required = true)]
    id: String,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Copy one field to the clipboard (e.g. "supplier.gstin", "invoice.number")
    #[arg(long, value_name = "FIELD")]
    copy: Option<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Sectioned report with an items table
    Text,
    /// JSON document
    Json,
    /// One CSV row per line item
    Csv,
}

pub async fn run(args: ShowArgs, source: ConfigSource<'_>) -> anyhow::Result<()> {
    let (_, client) = source.client()?;
    let id = ExtractionId::new(args.id);

    let view = fetch_view(&client, &id).await?;
    let output = render(&view, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if let Some(field) = &args.copy {
        copy_field(&view, field);
    }

    Ok(())
}

/// Fetch one extraction and normalize it for display.
pub async fn fetch_view<T: Transport>(
    client: &ApiClient<T>,
    id: &ExtractionId,
) -> anyhow::Result<InvoiceView> {
    let pb = spinner("Loading extraction...")?;
    let result = client.extraction(id).await;
    pb.finish_and_clear();

    let mut detail = match result {
        Ok(detail) => detail,
        Err(ApiError::NotFound { .. }) => anyhow::bail!("Extraction not found: {}", id),
        Err(e) => return Err(e.into()),
    };

    if detail.extraction_id.is_none() {
        detail.extraction_id = Some(id.clone());
    }
    if detail.data.is_none() {
        debug!("Extraction {} has no invoice data", id);
    }

    Ok(normalize(&detail))
}

/// Copy one field, reporting failure as a warning only.
fn copy_field(view: &InvoiceView, field: &str) {
    match copy_field_with(view, field, SystemClipboard::open) {
        Ok(()) => eprintln!("{} Copied {} to clipboard", style("✓").green(), field),
        Err(e) => eprintln!(
            "{} Could not copy {} to clipboard: {}",
            style("⚠").yellow(),
            field,
            e
        ),
    }
}

/// Look up `field` and copy it into the provider built by `open`.
///
/// The clipboard is only opened once the field is known to exist.
fn copy_field_with<P, F>(view: &InvoiceView, field: &str, open: F) -> anyhow::Result<()>
where
    P: ClipboardProvider,
    F: FnOnce() -> anyhow::Result<P>,
{
    let value = view
        .field(field)
        .ok_or_else(|| anyhow::anyhow!("field '{}' is not part of this invoice", field))?;
    let mut provider = open()?;
    clipboard::copy_text(&mut provider, &value)
}

pub fn render(view: &InvoiceView, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(format_text(view)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(view)?),
        OutputFormat::Csv => format_csv(view),
    }
}

fn format_text(view: &InvoiceView) -> String {
    let mut output = String::new();

    output.push_str(&format!("GST Invoice {}\n", view.extraction_id));
    output.push_str(&format!("Extracted: {}\n", display_timestamp(&view.timestamp)));
    output.push('\n');

    for (title, party) in [("Supplier", &view.supplier), ("Recipient", &view.recipient)] {
        output.push_str(&format!("{}:\n", title));
        output.push_str(&format!("  Name:    {}\n", party.name));
        output.push_str(&format!("  GSTIN:   {}\n", party.gstin));
        output.push_str(&format!("  Address: {}\n", party.address));
        output.push('\n');
    }

    output.push_str("Invoice:\n");
    output.push_str(&format!("  Number:          {}\n", view.invoice.number));
    output.push_str(&format!("  Date:            {}\n", view.invoice.date));
    output.push_str(&format!("  Place of supply: {}\n", view.invoice.place_of_supply));
    output.push_str(&format!("  Terms:           {}\n", view.invoice.terms));
    output.push('\n');

    output.push_str(&format!("Items ({}):\n", view.items.len()));
    if view.items.is_empty() {
        output.push_str("  No line items extracted\n");
    } else {
        let mut header = format!(
            "  {:>3}  {:<28} {:<10} {:>8} {:>10} {:>12} {:>16} {:>16}",
            "#", "Description", "HSN/SAC", "Qty", "Rate", "Taxable", "CGST", "SGST"
        );
        if view.show_igst {
            header.push_str(&format!(" {:>16}", "IGST"));
        }
        output.push_str(&header);
        output.push('\n');

        for item in &view.items {
            let mut row = format!(
                "  {:>3}  {:<28} {:<10} {:>8} {:>10} {:>12} {:>16} {:>16}",
                item.line,
                truncate(&item.description, 28),
                truncate(&item.hsn_sac_code, 10),
                item.quantity.normalize().to_string(),
                format_amount(item.rate),
                format_amount(item.taxable_value),
                tax_cell(&item.cgst),
                tax_cell(&item.sgst),
            );
            if let Some(igst) = &item.igst {
                row.push_str(&format!(" {:>16}", tax_cell(igst)));
            }
            output.push_str(&row);
            output.push('\n');
        }
    }
    output.push('\n');

    output.push_str("Totals:\n");
    output.push_str(&format!("  Subtotal: ₹{}\n", format_amount(view.totals.subtotal)));
    output.push_str(&format!("  CGST:     ₹{}\n", format_amount(view.totals.cgst_total)));
    output.push_str(&format!("  SGST:     ₹{}\n", format_amount(view.totals.sgst_total)));
    if let Some(igst) = view.totals.igst_total {
        output.push_str(&format!("  IGST:     ₹{}\n", format_amount(igst)));
    }
    output.push_str(&format!("  Total:    ₹{}\n", format_amount(view.totals.grand_total)));
    output.push_str(&format!("  In words: {}\n", view.totals.amount_in_words));

    if let Some(notes) = &view.notes {
        output.push('\n');
        output.push_str("Notes:\n");
        output.push_str(&format!("  Signature:    {}\n", notes.signature));
        output.push_str(&format!("  Bank details: {}\n", notes.bank_details));
        output.push_str(&format!("  Other:        {}\n", notes.other_notes));
    }

    output
}

fn format_csv(view: &InvoiceView) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "extraction_id",
        "invoice_number",
        "invoice_date",
        "supplier_name",
        "supplier_gstin",
        "recipient_name",
        "recipient_gstin",
        "line",
        "description",
        "hsn_sac_code",
        "quantity",
        "rate",
        "taxable_value",
        "cgst_rate",
        "cgst_amount",
        "sgst_rate",
        "sgst_amount",
        "igst_rate",
        "igst_amount",
        "invoice_total",
    ])?;

    let invoice_fields = [
        view.extraction_id.clone(),
        view.invoice.number.clone(),
        view.invoice.date.clone(),
        view.supplier.name.clone(),
        view.supplier.gstin.clone(),
        view.recipient.name.clone(),
        view.recipient.gstin.clone(),
    ];
    let total = view.totals.grand_total.to_string();

    if view.items.is_empty() {
        let mut record: Vec<String> = invoice_fields.to_vec();
        record.extend(std::iter::repeat_n(String::new(), 12));
        record.push(total.clone());
        wtr.write_record(&record)?;
    }

    for item in &view.items {
        let mut record: Vec<String> = invoice_fields.to_vec();
        let (igst_rate, igst_amount) = match &item.igst {
            Some(igst) => (igst.rate.to_string(), igst.amount.to_string()),
            None => (String::new(), String::new()),
        };
        record.extend([
            item.line.to_string(),
            item.description.clone(),
            item.hsn_sac_code.clone(),
            item.quantity.to_string(),
            item.rate.to_string(),
            item.taxable_value.to_string(),
            item.cgst.rate.to_string(),
            item.cgst.amount.to_string(),
            item.sgst.rate.to_string(),
            item.sgst.amount.to_string(),
            igst_rate,
            igst_amount,
            total.clone(),
        ]);
        wtr.write_record(&record)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn tax_cell(cell: &TaxCell) -> String {
    if cell.is_zero() {
        cell.rate_label()
    } else {
        format!("{} {}", cell.rate_label(), cell.amount_label())
    }
}

fn display_timestamp(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|t| t.format("%d %b %Y, %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
