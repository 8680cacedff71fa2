//! Service-wide counters and the liveness probe.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::extraction::{HealthReport, ServiceStats};
use crate::transport::{ApiClient, HttpTransport, Transport};

/// Reachability of the service as last observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    /// No fetch has completed since creation or the last refresh.
    #[default]
    Loading,
    Ok,
    Error,
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiStatus::Loading => write!(f, "loading"),
            ApiStatus::Ok => write!(f, "ok"),
            ApiStatus::Error => write!(f, "error"),
        }
    }
}

/// Counters shown on the landing view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total_extractions: u64,
    pub total_invoice_amount: Decimal,
    pub unique_suppliers: u64,
    pub api_status: ApiStatus,
}

/// Fetches the service counters and remembers the last good values.
#[derive(Debug)]
pub struct StatsReporter<T = HttpTransport> {
    client: ApiClient<T>,
    snapshot: StatsSnapshot,
}

impl<T: Transport> StatsReporter<T> {
    pub fn new(client: ApiClient<T>) -> Self {
        Self {
            client,
            snapshot: StatsSnapshot::default(),
        }
    }

    pub fn snapshot(&self) -> &StatsSnapshot {
        &self.snapshot
    }

    pub fn status(&self) -> ApiStatus {
        self.snapshot.api_status
    }

    /// Fetch `GET /stats`.
    ///
    /// A failure keeps the previous counters and sets the status to
    /// [`ApiStatus::Error`]; the snapshot is returned either way.
    pub async fn fetch(&mut self) -> &StatsSnapshot {
        match self.client.stats().await {
            Ok(stats) => self.apply(stats),
            Err(e) => {
                warn!("Failed to fetch service stats: {}", e);
                self.snapshot.api_status = ApiStatus::Error;
            }
        }
        &self.snapshot
    }

    /// Reset the status to [`ApiStatus::Loading`] and fetch again.
    pub async fn refresh(&mut self) -> &StatsSnapshot {
        self.snapshot.api_status = ApiStatus::Loading;
        self.fetch().await
    }

    /// Probe `GET /health`. Any 2xx counts as healthy.
    pub async fn health(&self) -> Result<HealthReport> {
        let report = self.client.health().await?;
        info!(
            "Service healthy (status: {})",
            report.status.as_deref().unwrap_or("unknown")
        );
        Ok(report)
    }

    fn apply(&mut self, stats: ServiceStats) {
        info!(
            "Service reports {} extractions from {} suppliers",
            stats.total_extractions, stats.unique_suppliers
        );
        self.snapshot = StatsSnapshot {
            total_extractions: stats.total_extractions,
            total_invoice_amount: stats.total_invoice_amount,
            unique_suppliers: stats.unique_suppliers,
            api_status: ApiStatus::Ok,
        };
    }
}
