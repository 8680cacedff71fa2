//! Extraction submission workflow.
//!
//! Each [`ExtractionSubmitter`] owns one [`SubmissionState`]:
//!
//! ```text
//! Idle -> Submitting -> Succeeded | Failed
//! ```
//!
//! A submit while `Submitting` is refused with [`GstxError::Busy`] and sends
//! nothing. Input that fails validation is refused before the state changes.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::error::{ApiError, GstxError, Result};
use crate::models::extraction::{ExtractResponse, ExtractionId};
use crate::transport::{ApiClient, HttpTransport, Transport};
use crate::validate::{UploadFile, Validator};

/// State of a submitter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded { extraction_id: ExtractionId },
    Failed { message: String },
}

impl SubmissionState {
    pub fn is_busy(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }
}

/// Input kind of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Image,
    Text,
}

impl SubmissionKind {
    /// Message used when the service gives no reason for a failure.
    pub fn generic_failure(&self) -> &'static str {
        match self {
            SubmissionKind::Image => "Failed to extract data from image",
            SubmissionKind::Text => "Failed to extract data from text",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionKind::Image => write!(f, "image"),
            SubmissionKind::Text => write!(f, "text"),
        }
    }
}

/// Drives image and text submissions with at most one in flight.
#[derive(Debug)]
pub struct ExtractionSubmitter<T = HttpTransport> {
    client: ApiClient<T>,
    validator: Validator,
    state: Mutex<SubmissionState>,
}

impl<T: Transport> ExtractionSubmitter<T> {
    pub fn new(client: ApiClient<T>, validator: Validator) -> Self {
        Self {
            client,
            validator,
            state: Mutex::new(SubmissionState::Idle),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SubmissionState {
        self.lock_state().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.lock_state().is_busy()
    }

    /// Submit an image. Returns the new extraction id, untransformed.
    pub async fn submit_image(&self, file: &UploadFile) -> Result<ExtractionId> {
        self.validator.validate_file(file)?;
        self.begin()?;

        let outcome = self.client.extract_image(file).await;
        self.finish(SubmissionKind::Image, outcome)
    }

    /// Submit raw invoice text. The text is sent as given, untrimmed.
    pub async fn submit_text(&self, text: &str) -> Result<ExtractionId> {
        self.validator.validate_text(text)?;
        self.begin()?;

        let outcome = self.client.extract_text(text).await;
        self.finish(SubmissionKind::Text, outcome)
    }

    fn lock_state(&self) -> MutexGuard<'_, SubmissionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> Result<()> {
        let mut state = self.lock_state();
        if state.is_busy() {
            return Err(GstxError::Busy);
        }
        *state = SubmissionState::Submitting;
        Ok(())
    }

    fn finish(
        &self,
        kind: SubmissionKind,
        outcome: std::result::Result<ExtractResponse, ApiError>,
    ) -> Result<ExtractionId> {
        let result = match outcome {
            Ok(response) if response.success => response.extraction_id.ok_or_else(|| {
                GstxError::Extraction {
                    message: kind.generic_failure().to_string(),
                }
            }),
            Ok(response) => Err(GstxError::Extraction {
                message: response
                    .message
                    .unwrap_or_else(|| kind.generic_failure().to_string()),
            }),
            Err(e) => Err(GstxError::Api(e)),
        };

        let next = match &result {
            Ok(id) => {
                info!("Extraction {} created from {}", id, kind);
                SubmissionState::Succeeded {
                    extraction_id: id.clone(),
                }
            }
            Err(GstxError::Extraction { message }) => {
                warn!("{} extraction rejected: {}", kind, message);
                SubmissionState::Failed {
                    message: message.clone(),
                }
            }
            Err(e) => {
                warn!("{} extraction failed: {}", kind, e);
                SubmissionState::Failed {
                    message: e.to_string(),
                }
            }
        };
        *self.lock_state() = next;

        result
    }
}
