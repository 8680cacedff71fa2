//! Fixed-shape display record for one extraction.
//!
//! [`InvoiceView`] is the only place where display defaults are applied:
//! absent text becomes [`PLACEHOLDER`], absent numbers become zero and an
//! absent item list becomes empty. Renderers never need to check for
//! missing data.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::models::extraction::ExtractionDetail;
use crate::models::invoice::{
    AdditionalNotes, InvoiceData, InvoiceDetails, LineItem, PartyDetails, TotalValues,
};

/// Shown in place of missing text.
pub const PLACEHOLDER: &str = "N/A";

/// Shown in a tax cell whose rate is zero.
pub const ZERO_TAX_PLACEHOLDER: &str = "-";

/// Normalized invoice ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceView {
    pub extraction_id: String,
    pub timestamp: String,
    pub supplier: PartyView,
    pub recipient: PartyView,
    pub invoice: HeaderView,
    /// Whether the IGST column is rendered. Decided once over all items.
    pub show_igst: bool,
    pub items: Vec<ItemView>,
    pub totals: TotalsView,
    /// `None` when signature, bank details and other notes are all empty.
    pub notes: Option<NotesView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyView {
    pub name: String,
    pub gstin: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderView {
    pub number: String,
    pub date: String,
    pub place_of_supply: String,
    pub terms: String,
}

/// One row of the items table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    /// 1-based position in invoice order.
    pub line: usize,
    pub description: String,
    pub hsn_sac_code: String,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub taxable_value: Decimal,
    pub cgst: TaxCell,
    pub sgst: TaxCell,
    /// Present on every row iff [`InvoiceView::show_igst`].
    pub igst: Option<TaxCell>,
}

/// Rate and amount of one tax component on one row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaxCell {
    pub rate: Decimal,
    pub amount: Decimal,
}

impl TaxCell {
    fn from_parts(rate: Option<Decimal>, amount: Option<Decimal>) -> Self {
        Self {
            rate: rate.unwrap_or_default(),
            amount: amount.unwrap_or_default(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.rate.is_zero()
    }

    /// `"18%"`, or `-` for a zero rate.
    pub fn rate_label(&self) -> String {
        if self.is_zero() {
            ZERO_TAX_PLACEHOLDER.to_string()
        } else {
            format!("{}%", self.rate.normalize())
        }
    }

    /// Amount with two decimals, or `-` for a zero rate.
    pub fn amount_label(&self) -> String {
        if self.is_zero() {
            ZERO_TAX_PLACEHOLDER.to_string()
        } else {
            format_amount(self.amount)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalsView {
    pub subtotal: Decimal,
    pub cgst_total: Decimal,
    pub sgst_total: Decimal,
    /// Only set when greater than zero.
    pub igst_total: Option<Decimal>,
    pub grand_total: Decimal,
    pub amount_in_words: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotesView {
    pub signature: String,
    pub bank_details: String,
    pub other_notes: String,
}

/// Normalize a fetched record.
pub fn normalize(detail: &ExtractionDetail) -> InvoiceView {
    InvoiceView::from_detail(detail)
}

impl InvoiceView {
    pub fn from_detail(detail: &ExtractionDetail) -> Self {
        let empty = InvoiceData::default();
        let data = detail.data.as_ref().unwrap_or(&empty);

        let mut view = Self::from_data(data);
        view.extraction_id = text(detail.extraction_id.as_ref().map(|id| id.as_str()));
        view.timestamp = text(detail.timestamp.as_deref());
        view
    }

    /// Normalize bare invoice data; id and timestamp become placeholders.
    pub fn from_data(data: &InvoiceData) -> Self {
        let show_igst = data.items.iter().any(LineItem::has_igst);

        Self {
            extraction_id: PLACEHOLDER.to_string(),
            timestamp: PLACEHOLDER.to_string(),
            supplier: PartyView::from(&data.supplier_details),
            recipient: PartyView::from(&data.recipient_details),
            invoice: HeaderView::from(&data.invoice_details),
            show_igst,
            items: data
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| ItemView::new(i + 1, item, show_igst))
                .collect(),
            totals: TotalsView::from(&data.total_values),
            notes: NotesView::from_notes(&data.additional_notes),
        }
    }

    /// Look up one field by dotted path, e.g. `supplier.gstin` or
    /// `items.0.description`.
    ///
    /// Returns `None` for unknown paths and for fields that are not shown
    /// (an absent IGST cell, an omitted notes block).
    pub fn field(&self, path: &str) -> Option<String> {
        let root = serde_json::to_value(self).ok()?;

        let mut current = &root;
        for key in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(key)?,
                Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        match current {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl From<&PartyDetails> for PartyView {
    fn from(party: &PartyDetails) -> Self {
        Self {
            name: text(party.name.as_deref()),
            gstin: text(party.gstin.as_deref()),
            address: text(party.address.as_deref()),
        }
    }
}

impl From<&InvoiceDetails> for HeaderView {
    fn from(details: &InvoiceDetails) -> Self {
        Self {
            number: text(details.invoice_number.as_deref()),
            date: text(details.date.as_deref()),
            place_of_supply: text(details.place_of_supply.as_deref()),
            terms: text(details.terms.as_deref()),
        }
    }
}

impl ItemView {
    fn new(line: usize, item: &LineItem, show_igst: bool) -> Self {
        Self {
            line,
            description: text(item.description.as_deref()),
            hsn_sac_code: text(item.hsn_sac_code.as_deref()),
            quantity: item.quantity.unwrap_or_default(),
            rate: item.rate.unwrap_or_default(),
            taxable_value: item.taxable_value.unwrap_or_default(),
            cgst: TaxCell::from_parts(item.cgst_rate, item.cgst_amount),
            sgst: TaxCell::from_parts(item.sgst_rate, item.sgst_amount),
            igst: show_igst.then(|| TaxCell::from_parts(item.igst_rate, item.igst_amount)),
        }
    }
}

impl From<&TotalValues> for TotalsView {
    fn from(totals: &TotalValues) -> Self {
        Self {
            subtotal: totals.subtotal,
            cgst_total: totals.cgst_total,
            sgst_total: totals.sgst_total,
            igst_total: (totals.igst_total > Decimal::ZERO).then_some(totals.igst_total),
            grand_total: totals.total_invoice_value_numbers,
            amount_in_words: text(totals.total_invoice_value_words.as_deref()),
        }
    }
}

impl NotesView {
    fn from_notes(notes: &AdditionalNotes) -> Option<Self> {
        if notes.is_empty() {
            return None;
        }
        Some(Self {
            signature: text(notes.signature.as_deref()),
            bank_details: text(notes.bank_details.as_deref()),
            other_notes: text(notes.other_notes.as_deref()),
        })
    }
}

/// Format a money amount with exactly two decimals.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

fn text(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(PLACEHOLDER)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::extraction::ExtractionId;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn detail(data: serde_json::Value) -> ExtractionDetail {
        serde_json::from_value(json!({
            "extraction_id": "extract_5e6f7a8b_1710001234",
            "timestamp": "2024-03-09T21:20:34.512345",
            "data": data
        }))
        .unwrap()
    }

    fn item(description: &str, igst_rate: f64) -> serde_json::Value {
        json!({
            "description": description,
            "hsn_sac_code": "8471",
            "quantity": 2,
            "rate": 500,
            "taxable_value": 1000,
            "cgst_rate": 9, "cgst_amount": 90,
            "sgst_rate": 9, "sgst_amount": 90,
            "igst_rate": igst_rate, "igst_amount": 0
        })
    }

    #[test]
    fn test_missing_data_becomes_placeholders() {
        let view = normalize(&ExtractionDetail::default());

        assert_eq!(view.extraction_id, PLACEHOLDER);
        assert_eq!(view.timestamp, PLACEHOLDER);
        assert_eq!(
            view.supplier,
            PartyView {
                name: "N/A".to_string(),
                gstin: "N/A".to_string(),
                address: "N/A".to_string(),
            }
        );
        assert_eq!(view.invoice.number, PLACEHOLDER);
        assert!(view.items.is_empty());
        assert!(!view.show_igst);
        assert_eq!(view.totals.subtotal, Decimal::ZERO);
        assert_eq!(view.totals.grand_total, Decimal::ZERO);
        assert_eq!(view.totals.igst_total, None);
        assert_eq!(view.totals.amount_in_words, PLACEHOLDER);
        assert_eq!(view.notes, None);
    }

    #[test]
    fn test_partial_party_details() {
        let view = normalize(&detail(json!({
            "supplier_details": {"name": "Shree Traders", "gstin": null},
            "recipient_details": null
        })));

        assert_eq!(view.extraction_id, "extract_5e6f7a8b_1710001234");
        assert_eq!(view.supplier.name, "Shree Traders");
        assert_eq!(view.supplier.gstin, PLACEHOLDER);
        assert_eq!(view.recipient.name, PLACEHOLDER);
    }

    #[test]
    fn test_no_igst_column_when_all_rates_zero() {
        let view = normalize(&detail(json!({
            "items": [item("Keyboard", 0.0), item("Mouse", 0.0)]
        })));

        assert!(!view.show_igst);
        assert!(view.items.iter().all(|row| row.igst.is_none()));
    }

    #[test]
    fn test_igst_column_on_every_row_when_any_rate_positive() {
        let view = normalize(&detail(json!({
            "items": [item("Keyboard", 0.0), item("Monitor", 18.0), item("Cable", 0.0)]
        })));

        assert!(view.show_igst);
        assert!(view.items.iter().all(|row| row.igst.is_some()));

        let first = view.items[0].igst.unwrap();
        assert_eq!(first.rate_label(), ZERO_TAX_PLACEHOLDER);
        assert_eq!(first.amount_label(), ZERO_TAX_PLACEHOLDER);
        assert_eq!(view.items[1].igst.unwrap().rate_label(), "18%");
    }

    #[test]
    fn test_items_keep_invoice_order() {
        let view = normalize(&detail(json!({
            "items": [item("Zinc sheet", 0.0), item("Aluminium bar", 0.0), item("Brass rod", 0.0)]
        })));

        let lines: Vec<(usize, &str)> = view
            .items
            .iter()
            .map(|row| (row.line, row.description.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![(1, "Zinc sheet"), (2, "Aluminium bar"), (3, "Brass rod")]
        );
    }

    #[test]
    fn test_igst_total_shown_only_when_positive() {
        let zero = normalize(&detail(json!({"total_values": {"igst_total": 0}})));
        assert_eq!(zero.totals.igst_total, None);

        let positive = normalize(&detail(json!({"total_values": {"igst_total": "180"}})));
        assert_eq!(positive.totals.igst_total, Some(Decimal::from(180)));
    }

    #[test]
    fn test_notes_block() {
        let view = normalize(&detail(json!({
            "additional_notes": {"signature": "", "bank_details": null, "other_notes": "   "}
        })));
        assert_eq!(view.notes, None);

        let view = normalize(&detail(json!({
            "additional_notes": {"bank_details": "A/C 001234, IFSC HDFC0000123"}
        })));
        assert_eq!(
            view.notes,
            Some(NotesView {
                signature: "N/A".to_string(),
                bank_details: "A/C 001234, IFSC HDFC0000123".to_string(),
                other_notes: "N/A".to_string(),
            })
        );
    }

    #[test]
    fn test_field_lookup() {
        let view = normalize(&detail(json!({
            "supplier_details": {"gstin": "27AAPFU0939F1ZV"},
            "invoice_details": {"invoice_number": "INV-42"},
            "items": [item("Keyboard", 0.0)]
        })));

        assert_eq!(view.field("supplier.gstin").as_deref(), Some("27AAPFU0939F1ZV"));
        assert_eq!(view.field("invoice.number").as_deref(), Some("INV-42"));
        assert_eq!(view.field("items.0.description").as_deref(), Some("Keyboard"));
        assert_eq!(view.field("items.0.igst"), None);
        assert_eq!(view.field("items.7.description"), None);
        assert_eq!(view.field("supplier.phone"), None);
        assert_eq!(view.field("notes.signature"), None);
    }

    #[test]
    fn test_from_data_uses_placeholders_for_identity() {
        let view = InvoiceView::from_data(&InvoiceData::default());
        assert_eq!(view.extraction_id, PLACEHOLDER);

        let view = InvoiceView::from_detail(&ExtractionDetail {
            extraction_id: Some(ExtractionId::new("extract_x")),
            ..ExtractionDetail::default()
        });
        assert_eq!(view.extraction_id, "extract_x");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::from(6490)), "6490.00");
        assert_eq!(format_amount(Decimal::new(12346, 3)), "12.35");
    }
}
