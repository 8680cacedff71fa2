//! History of past extractions.
//!
//! [`HistoryStore`] owns the in-memory collection fetched from the service.
//! Deletion is a two-step protocol: [`HistoryStore::request_delete`] hands
//! out a [`DeleteConfirmation`] and only [`HistoryStore::confirm_delete`]
//! touches the service. Dropping the confirmation cancels.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{ApiError, GstxError, Result};
use crate::models::extraction::{ExtractionDetail, ExtractionId, ExtractionSummary};
use crate::models::invoice::InvoiceData;
use crate::transport::{ApiClient, HttpTransport, Transport};

lazy_static! {
    static ref FILENAME_PATTERN: Regex =
        Regex::new(r#"(?i)filename\s*=\s*"([^"]+)""#).unwrap();
    static ref BARE_FILENAME_PATTERN: Regex =
        Regex::new(r#"(?i)filename\s*=\s*([^;\s"]+)"#).unwrap();
}

/// Load state of the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loaded,
    /// The last fetch failed; calling [`HistoryStore::list`] again retries.
    Failed(String),
}

/// Aggregates over the loaded collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub count: usize,
    pub total_amount: Decimal,
    pub unique_suppliers: usize,
}

/// Permission to delete one record, obtained from
/// [`HistoryStore::request_delete`].
#[derive(Debug)]
#[must_use = "a delete only happens when the confirmation is passed to confirm_delete"]
pub struct DeleteConfirmation {
    id: ExtractionId,
}

impl DeleteConfirmation {
    pub fn id(&self) -> &ExtractionId {
        &self.id
    }
}

/// Downloaded export of one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub extraction_id: ExtractionId,
    /// Suggested file name, from the response header or the default.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Download {
    /// File name reduced to its final path component.
    pub fn safe_file_name(&self) -> String {
        let name = self
            .filename
            .rsplit(['/', '\\'])
            .next()
            .map(str::trim)
            .unwrap_or_default();

        match name {
            "" | "." | ".." => default_filename(&self.extraction_id),
            name => name.to_string(),
        }
    }

    /// Write the payload into `dir` and return the final path.
    ///
    /// The bytes go to a temporary file in `dir` first, which is then
    /// renamed over the target. The temporary file is removed on failure.
    pub fn save_into(&self, dir: &Path) -> Result<PathBuf> {
        let target = dir.join(self.safe_file_name());

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&self.bytes)?;
        file.flush()?;
        file.persist(&target).map_err(|e| e.error)?;

        debug!("Saved {} bytes to {}", self.bytes.len(), target.display());
        Ok(target)
    }

    /// Parse the payload back into a record.
    ///
    /// Accepts either a full record or bare invoice data; in both cases a
    /// missing id is filled in with the requested one.
    pub fn parse_record(&self) -> Result<ExtractionDetail> {
        let value: serde_json::Value = serde_json::from_slice(&self.bytes)
            .map_err(|e| ApiError::Decode(format!("download is not JSON: {}", e)))?;

        let is_record = value.get("extraction_id").is_some() || value.get("data").is_some();

        let mut record = if is_record {
            serde_json::from_value::<ExtractionDetail>(value)
        } else {
            serde_json::from_value::<InvoiceData>(value).map(|data| ExtractionDetail {
                data: Some(data),
                ..ExtractionDetail::default()
            })
        }
        .map_err(|e| ApiError::Decode(e.to_string()))?;

        if record.extraction_id.is_none() {
            record.extraction_id = Some(self.extraction_id.clone());
        }
        Ok(record)
    }
}

/// File name used when the service does not suggest one.
pub fn default_filename(id: &ExtractionId) -> String {
    format!("gst_invoice_{}.json", id)
}

/// Extract the file name from a `content-disposition` header value.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    FILENAME_PATTERN
        .captures(header)
        .or_else(|| BARE_FILENAME_PATTERN.captures(header))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

/// In-memory collection of past extractions.
#[derive(Debug)]
pub struct HistoryStore<T = HttpTransport> {
    client: ApiClient<T>,
    records: Vec<ExtractionSummary>,
    state: LoadState,
}

impl<T: Transport> HistoryStore<T> {
    pub fn new(client: ApiClient<T>) -> Self {
        Self {
            client,
            records: Vec::new(),
            state: LoadState::NotLoaded,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Records in the order the service returned them.
    pub fn records(&self) -> &[ExtractionSummary] {
        &self.records
    }

    pub fn contains(&self, id: &ExtractionId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &ExtractionId) -> Option<&ExtractionSummary> {
        self.records.iter().find(|r| &r.extraction_id == id)
    }

    /// Fetch the full collection, replacing the loaded one.
    ///
    /// On failure the previously loaded records are kept and the state
    /// becomes [`LoadState::Failed`].
    pub async fn list(&mut self) -> Result<&[ExtractionSummary]> {
        match self.client.extractions().await {
            Ok(list) => {
                if let Some(total) = list.total_extractions {
                    if total != list.extractions.len() as u64 {
                        debug!(
                            "Service reports {} extractions but listed {}",
                            total,
                            list.extractions.len()
                        );
                    }
                }
                self.records = list.extractions;
                self.state = LoadState::Loaded;
                info!("Loaded {} extractions", self.records.len());
                Ok(&self.records)
            }
            Err(e) => {
                warn!("Failed to load extraction history: {}", e);
                self.state = LoadState::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    /// First step of a delete. No network call is made.
    pub fn request_delete(&self, id: &ExtractionId) -> Result<DeleteConfirmation> {
        if !self.contains(id) {
            return Err(GstxError::NotFound(id.to_string()));
        }
        Ok(DeleteConfirmation { id: id.clone() })
    }

    /// Second step of a delete: remove the record on the service, then
    /// locally. On failure the collection is left as it was.
    pub async fn confirm_delete(&mut self, confirmation: DeleteConfirmation) -> Result<()> {
        let id = confirmation.id;

        if let Err(e) = self.client.delete_extraction(&id).await {
            warn!("Failed to delete extraction {}: {}", id, e);
            return Err(e.into());
        }

        self.records.retain(|r| r.extraction_id != id);
        info!("Deleted extraction {}", id);
        Ok(())
    }

    /// Fetch the export of one extraction.
    pub async fn download(&self, id: &ExtractionId) -> Result<Download> {
        let response = self.client.download_extraction(id).await?;

        let filename = response
            .content_disposition
            .as_deref()
            .and_then(filename_from_content_disposition)
            .unwrap_or_else(|| default_filename(id));

        info!("Downloaded extraction {} as {}", id, filename);
        Ok(Download {
            extraction_id: id.clone(),
            filename,
            bytes: response.body,
        })
    }

    /// Aggregates over the loaded collection, recomputed on every call.
    pub fn stats(&self) -> HistoryStats {
        let suppliers: HashSet<Option<&str>> = self
            .records
            .iter()
            .map(|r| r.supplier_name.as_deref())
            .collect();

        // Amounts come from the service unchecked; clamp instead of overflowing.
        let total_amount = self
            .records
            .iter()
            .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(r.total_amount))
            .unwrap_or_else(|| {
                warn!("History total exceeds the decimal range, showing the maximum");
                Decimal::MAX
            });

        HistoryStats {
            count: self.records.len(),
            total_amount,
            unique_suppliers: suppliers.len(),
        }
    }
}
