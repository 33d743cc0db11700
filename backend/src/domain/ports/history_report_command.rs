//! Driving port for CSV history exports.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{Error, HistoryPeriod, UserId};

/// Path prefix under which generated reports are served.
pub const REPORTS_ROUTE_PREFIX: &str = "reports";

/// A stored history report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    /// Plain file name, e.g. `report_1_2025_1.csv`.
    pub file_name: String,
    /// Number of history rows exported.
    pub rows: usize,
}

impl HistoryReport {
    /// Relative location of the artifact, e.g. `reports/report_1_2025_1.csv`.
    pub fn location(&self) -> String {
        format!("{REPORTS_ROUTE_PREFIX}/{}", self.file_name)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryReportCommand: Send + Sync {
    /// Export the user's history for `period` as a CSV artifact.
    async fn generate(&self, user_id: UserId, period: HistoryPeriod)
    -> Result<HistoryReport, Error>;

    /// Read a previously generated artifact; `not_found` when missing.
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>, Error>;
}
