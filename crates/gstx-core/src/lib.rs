//! Core library for the GST invoice extraction client.
//!
//! This crate provides:
//! - Upload validation (image type, size, empty text)
//! - A transport abstraction over the extraction service HTTP API
//! - The submission workflow with a single-in-flight busy gate
//! - Normalization of extracted invoices into a fixed display shape
//! - History listing, two-step deletion, download and aggregates
//! - Service counters and the liveness probe

pub mod error;
pub mod history;
pub mod models;
pub mod normalize;
pub mod stats;
pub mod submit;
pub mod transport;
pub mod validate;

pub use error::{ApiError, GstxError, Result, ValidationError};
pub use history::{DeleteConfirmation, Download, HistoryStats, HistoryStore, LoadState};
pub use models::config::GstxConfig;
pub use models::extraction::{ExtractionDetail, ExtractionId, ExtractionSummary};
pub use models::invoice::{InvoiceData, LineItem};
pub use normalize::{normalize, InvoiceView};
pub use stats::{ApiStatus, StatsReporter, StatsSnapshot};
pub use submit::{ExtractionSubmitter, SubmissionState};
pub use transport::{ApiClient, HttpTransport, Transport};
pub use validate::{UploadFile, Validator};
