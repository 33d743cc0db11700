//! HTTP server configuration object.

use std::net::SocketAddr;

use segments_backend::domain::ExpiryPolicy;
use segments_backend::outbound::persistence::DbPool;
use segments_backend::outbound::reports::CsvReportDirectory;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) reports: CsvReportDirectory,
    pub(crate) expiry: ExpiryPolicy,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(bind_addr: SocketAddr, reports: CsvReportDirectory) -> Self {
        Self {
            bind_addr,
            reports,
            expiry: ExpiryPolicy::default(),
            db_pool: None,
        }
    }

    /// Attach a database pool; without one the in-memory store is used.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_expiry_policy(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }
}
