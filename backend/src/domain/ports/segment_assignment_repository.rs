//! Port abstraction for membership storage and the history ledger.
//!
//! Adapters apply a [`MembershipUpdate`] inside one transaction: either every
//! delete, upsert and history insert is committed, or none is.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    HistoryEvent, HistoryPeriod, HistoryRecord, Membership, MembershipUpdate, Segment, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by membership storage adapters.
    pub enum SegmentAssignmentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "segment assignment connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "segment assignment query failed: {message}",
        /// One or more slugs do not name a catalogued segment.
        UnknownSegments { slugs: Vec<String> } => "unknown segment slugs: {slugs:?}",
        /// The user referenced by the update does not exist.
        UnknownUser { user_id: i32 } => "user {user_id} does not exist",
    }
}

/// Rows touched by a committed update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedMembershipUpdate {
    /// Rows deleted by the removal step, as they were before deletion.
    pub removed: Vec<Membership>,
    /// Rows inserted or updated by the addition step.
    pub upserted: Vec<Membership>,
    /// History events actually appended; suppressed duplicates are absent.
    pub recorded: Vec<HistoryEvent>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentAssignmentRepository: Send + Sync {
    /// Atomically apply `update` and append the derived history events.
    async fn apply_update(
        &self,
        update: &MembershipUpdate,
    ) -> Result<AppliedMembershipUpdate, SegmentAssignmentRepositoryError>;

    /// Segments whose membership for `user_id` expires strictly after `at`,
    /// ordered by slug.
    async fn active_segments(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<Vec<Segment>, SegmentAssignmentRepositoryError>;

    /// History for `user_id` dated within `period`, oldest first.
    async fn history_for_period(
        &self,
        user_id: UserId,
        period: HistoryPeriod,
    ) -> Result<Vec<HistoryRecord>, SegmentAssignmentRepositoryError>;
}
