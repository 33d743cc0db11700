//! Segment assignment engine.
//!
//! Implements the membership driving ports on top of a
//! [`SegmentAssignmentRepository`]. The service resolves default expiries,
//! collapses duplicate slugs, and delegates the transactional write to the
//! storage adapter.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    MembershipUpdateOutcome, SegmentAssignmentCommand, SegmentAssignmentQuery,
    SegmentAssignmentRepository, SegmentAssignmentRepositoryError,
};
use crate::domain::{
    Error, ExpiryPolicy, HistoryPeriod, HistoryRecord, MembershipUpdate, MembershipUpdateRequest,
    Segment, UserId,
};

/// Membership command and query service.
#[derive(Clone)]
pub struct SegmentAssignmentService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    expiry: ExpiryPolicy,
}

impl<R> SegmentAssignmentService<R> {
    /// Create a service using the default [`ExpiryPolicy`].
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use mockable::DefaultClock;
    /// # use segments_backend::domain::SegmentAssignmentService;
    /// # use segments_backend::outbound::memory::InMemoryStore;
    /// let service = SegmentAssignmentService::new(
    ///     Arc::new(InMemoryStore::new()),
    ///     Arc::new(DefaultClock),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
            expiry: ExpiryPolicy::default(),
        }
    }

    /// Replace the expiry policy.
    #[must_use]
    pub fn with_expiry_policy(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }
}

fn map_repository_error(
    user_id: UserId,
    step: &str,
    error: SegmentAssignmentRepositoryError,
) -> Error {
    match error {
        SegmentAssignmentRepositoryError::Connection { message } => Error::service_unavailable(
            format!("{step} for user {user_id} failed: segment store unavailable: {message}"),
        ),
        SegmentAssignmentRepositoryError::Query { message } => {
            Error::internal(format!("{step} for user {user_id} failed: {message}"))
        }
        SegmentAssignmentRepositoryError::UnknownSegments { slugs } => Error::invalid_request(
            format!("unknown segment slugs: {}", slugs.join(", ")),
        )
        .with_details(json!({ "code": "unknown_segments", "slugs": slugs })),
        SegmentAssignmentRepositoryError::UnknownUser { user_id } => {
            Error::not_found(format!("user {user_id} not found"))
        }
    }
}

#[async_trait]
impl<R> SegmentAssignmentCommand for SegmentAssignmentService<R>
where
    R: SegmentAssignmentRepository,
{
    async fn update(
        &self,
        request: MembershipUpdateRequest,
    ) -> Result<MembershipUpdateOutcome, Error> {
        let user_id = request.user_id;
        let update = MembershipUpdate::resolve(request, &self.expiry, self.clock.utc());
        if update.is_empty() {
            debug!(%user_id, "empty membership update ignored");
            return Ok(MembershipUpdateOutcome::default());
        }

        let applied = self
            .repo
            .apply_update(&update)
            .await
            .map_err(|err| map_repository_error(user_id, "updating segments", err))?;

        let outcome = MembershipUpdateOutcome {
            removed: applied.removed.len(),
            added: applied.upserted.len(),
            recorded: applied.recorded.len(),
        };
        info!(
            %user_id,
            removed = outcome.removed,
            added = outcome.added,
            recorded = outcome.recorded,
            "membership update applied"
        );
        Ok(outcome)
    }
}

#[async_trait]
impl<R> SegmentAssignmentQuery for SegmentAssignmentService<R>
where
    R: SegmentAssignmentRepository,
{
    async fn active_segments(&self, user_id: UserId) -> Result<Vec<Segment>, Error> {
        self.repo
            .active_segments(user_id, self.clock.utc())
            .await
            .map_err(|err| map_repository_error(user_id, "listing active segments", err))
    }

    async fn history(
        &self,
        user_id: UserId,
        period: HistoryPeriod,
    ) -> Result<Vec<HistoryRecord>, Error> {
        self.repo
            .history_for_period(user_id, period)
            .await
            .map_err(|err| map_repository_error(user_id, "reading history", err))
    }
}

#[cfg(test)]
#[path = "segment_assignment_service_tests.rs"]
mod tests;
