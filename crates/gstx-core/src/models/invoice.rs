//! GST invoice payload as returned by the extraction engine.
//!
//! Every leaf is optional on the wire. Placeholders for display are applied
//! later in [`crate::normalize`], not here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::deserializers::{decimal_or_zero, lenient_decimal, lenient_string, null_as_default};

/// Full structured invoice extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceData {
    /// Seller details.
    #[serde(default, deserialize_with = "null_as_default")]
    pub supplier_details: PartyDetails,

    /// Buyer details.
    #[serde(default, deserialize_with = "null_as_default")]
    pub recipient_details: PartyDetails,

    /// Invoice header.
    #[serde(default, deserialize_with = "null_as_default")]
    pub invoice_details: InvoiceDetails,

    /// Line items in invoice order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<LineItem>,

    /// Invoice totals.
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_values: TotalValues,

    /// Signature, bank details and free-form notes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub additional_notes: AdditionalNotes,
}

/// A party (supplier or recipient) on the invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyDetails {
    /// Business or person name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    /// 15-character GST identification number.
    #[serde(default, deserialize_with = "lenient_string")]
    pub gstin: Option<String>,

    /// Full address including state and PIN code.
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
}

/// Invoice header information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDetails {
    #[serde(default, deserialize_with = "lenient_string")]
    pub invoice_number: Option<String>,

    /// Invoice date as printed (DD/MM/YYYY or DD-MM-YYYY).
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,

    /// State name or state code.
    #[serde(default, deserialize_with = "lenient_string")]
    pub place_of_supply: Option<String>,

    /// Payment terms.
    #[serde(default, deserialize_with = "lenient_string")]
    pub terms: Option<String>,
}

/// A single line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,

    /// HSN (goods) or SAC (services) classification code.
    #[serde(default, deserialize_with = "lenient_string")]
    pub hsn_sac_code: Option<String>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub quantity: Option<Decimal>,

    /// Unit price.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub rate: Option<Decimal>,

    /// Amount before tax; upstream guarantees roughly `quantity * rate`.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub taxable_value: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub cgst_rate: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub cgst_amount: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub sgst_rate: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub sgst_amount: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub igst_rate: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub igst_amount: Option<Decimal>,
}

impl LineItem {
    /// Whether this line carries integrated (inter-state) tax.
    pub fn has_igst(&self) -> bool {
        self.igst_rate.is_some_and(|rate| rate > Decimal::ZERO)
    }
}

/// Invoice totals. Numeric fields default to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalValues {
    /// Sum of taxable values.
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub subtotal: Decimal,

    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub cgst_total: Decimal,

    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub sgst_total: Decimal,

    /// Zero on intra-state invoices.
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub igst_total: Decimal,

    /// Final invoice value.
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub total_invoice_value_numbers: Decimal,

    /// Final invoice value spelled out.
    #[serde(default, deserialize_with = "lenient_string")]
    pub total_invoice_value_words: Option<String>,
}

/// Additional notes block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalNotes {
    #[serde(default, deserialize_with = "lenient_string")]
    pub signature: Option<String>,

    /// Account number, IFSC and similar.
    #[serde(default, deserialize_with = "lenient_string")]
    pub bank_details: Option<String>,

    /// Terms and conditions or anything else.
    #[serde(default, deserialize_with = "lenient_string")]
    pub other_notes: Option<String>,
}

impl AdditionalNotes {
    /// Check if no note is present.
    pub fn is_empty(&self) -> bool {
        self.signature.is_none() && self.bank_details.is_none() && self.other_notes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INTRA_STATE: &str = r#"{
        "supplier_details": {"name": "Shree Traders", "gstin": "27AAPFU0939F1ZV", "address": "Pune, Maharashtra 411001"},
        "recipient_details": {"name": "Kiran Stores", "gstin": null, "address": ""},
        "invoice_details": {"invoice_number": "ST/2024/118", "date": "12/03/2024", "place_of_supply": "Maharashtra", "terms": null},
        "items": [
            {"description": "Steel rods", "hsn_sac_code": 7214, "quantity": 10, "rate": 550.0, "taxable_value": 5500.0,
             "cgst_rate": 9, "cgst_amount": 495.0, "sgst_rate": 9, "sgst_amount": 495.0, "igst_rate": 0, "igst_amount": 0}
        ],
        "total_values": {"subtotal": 5500.0, "cgst_total": 495.0, "sgst_total": 495.0, "igst_total": 0,
                         "total_invoice_value_numbers": 6490.0, "total_invoice_value_words": "Six Thousand Four Hundred Ninety Only"},
        "additional_notes": {"signature": null, "bank_details": null, "other_notes": null}
    }"#;

    #[test]
    fn test_parse_intra_state_invoice() {
        let data: InvoiceData = serde_json::from_str(INTRA_STATE).unwrap();

        assert_eq!(data.supplier_details.name.as_deref(), Some("Shree Traders"));
        assert_eq!(data.recipient_details.gstin, None);
        assert_eq!(data.recipient_details.address, None);
        assert_eq!(data.items.len(), 1);
        assert_eq!(data.items[0].hsn_sac_code.as_deref(), Some("7214"));
        assert!(!data.items[0].has_igst());
        assert_eq!(data.total_values.total_invoice_value_numbers, Decimal::from(6490));
        assert!(data.additional_notes.is_empty());
    }

    #[test]
    fn test_null_sections_default() {
        let data: InvoiceData =
            serde_json::from_str(r#"{"supplier_details": null, "items": null}"#).unwrap();
        assert_eq!(data, InvoiceData::default());
    }

    #[test]
    fn test_item_order_preserved() {
        let data: InvoiceData = serde_json::from_str(
            r#"{"items": [{"description": "b"}, {"description": "a"}, {"description": "c"}]}"#,
        )
        .unwrap();
        let order: Vec<_> = data
            .items
            .iter()
            .map(|i| i.description.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }
}
