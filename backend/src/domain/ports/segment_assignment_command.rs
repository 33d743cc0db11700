//! Driving port for membership mutations.
//!
//! Inbound adapters submit a [`MembershipUpdateRequest`] for one user; the
//! implementation validates it, resolves default expiries and applies it
//! atomically through the storage port.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Error, MembershipUpdateRequest};

/// Summary of a committed membership update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipUpdateOutcome {
    /// Rows deleted by the removal step.
    pub removed: usize,
    /// Rows inserted or refreshed by the addition step.
    pub added: usize,
    /// History events appended.
    pub recorded: usize,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentAssignmentCommand: Send + Sync {
    /// Apply removals then additions for one user, all or nothing.
    ///
    /// # Errors
    ///
    /// - `invalid_request` when a slug is unknown (the message lists them).
    /// - `not_found` when the user does not exist.
    /// - `service_unavailable` or `internal_error` on storage failure.
    async fn update(
        &self,
        request: MembershipUpdateRequest,
    ) -> Result<MembershipUpdateOutcome, Error>;
}
