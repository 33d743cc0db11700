//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on driving ports and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    HistoryReportCommand, SegmentAssignmentCommand, SegmentAssignmentQuery, SegmentCatalogue,
    UserDirectory,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<dyn UserDirectory>,
    pub segments: Arc<dyn SegmentCatalogue>,
    pub memberships: Arc<dyn SegmentAssignmentCommand>,
    pub memberships_query: Arc<dyn SegmentAssignmentQuery>,
    pub reports: Arc<dyn HistoryReportCommand>,
}
