//! Extraction records and the response envelopes of the extraction API.

use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::deserializers::{decimal_or_zero, lenient_string, string_or_empty};
use super::invoice::InvoiceData;

/// Opaque identifier assigned by the service to one extraction.
///
/// Carried verbatim: never trimmed, re-cased or otherwise rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionId(String);

impl ExtractionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ExtractionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ExtractionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for ExtractionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Summary row of the history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub extraction_id: ExtractionId,

    /// Server-assigned creation instant, kept as sent.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub timestamp: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub invoice_number: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub supplier_name: Option<String>,

    /// Final invoice value, denormalized by the server.
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub total_amount: Decimal,
}

impl ExtractionSummary {
    /// Creation instant parsed from the server timestamp.
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }
}

/// Body of `GET /extraction/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_id: Option<ExtractionId>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,

    /// Full payload; absent on malformed records.
    #[serde(default)]
    pub data: Option<InvoiceData>,
}

impl ExtractionDetail {
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

/// Body of `GET /extractions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionList {
    #[serde(default)]
    pub total_extractions: Option<u64>,

    #[serde(default)]
    pub extractions: Vec<ExtractionSummary>,
}

/// Request body of `POST /extract/text`.
#[derive(Debug, Clone, Serialize)]
pub struct TextExtractionRequest<'a> {
    pub invoice_text: &'a str,
}

/// Body of `POST /extract/image` and `POST /extract/text`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,

    #[serde(default)]
    pub extraction_id: Option<ExtractionId>,
}

/// Body of `GET /stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceStats {
    #[serde(default)]
    pub total_extractions: u64,

    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub total_invoice_amount: Decimal,

    #[serde(default)]
    pub unique_suppliers: u64,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,

    /// Connectivity of the model behind the service.
    #[serde(default, alias = "gemini_api", deserialize_with = "lenient_string")]
    pub engine: Option<String>,

    #[serde(default)]
    pub total_extractions: Option<u64>,
}

/// Parse a server timestamp, with or without offset.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}
