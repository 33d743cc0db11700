//! Port for storing generated history reports.
use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by report storage adapters.
    pub enum HistoryReportWriterError {
        /// The artifact name is not a plain file name.
        InvalidName { name: String } => "invalid report name {name:?}",
        /// The underlying storage failed.
        Io { message: String } => "report storage failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryReportWriter: Send + Sync {
    /// Store `contents` under `name`, replacing any previous artifact.
    async fn write(&self, name: &str, contents: Vec<u8>) -> Result<(), HistoryReportWriterError>;

    /// Read a stored artifact; `None` when it does not exist.
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, HistoryReportWriterError>;
}
