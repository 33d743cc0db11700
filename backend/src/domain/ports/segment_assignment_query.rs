//! Driving port for membership reads.

use async_trait::async_trait;

use crate::domain::{Error, HistoryPeriod, HistoryRecord, Segment, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentAssignmentQuery: Send + Sync {
    /// Segments currently active for `user_id`.
    async fn active_segments(&self, user_id: UserId) -> Result<Vec<Segment>, Error>;

    /// History events for `user_id` within `period`, oldest first.
    async fn history(
        &self,
        user_id: UserId,
        period: HistoryPeriod,
    ) -> Result<Vec<HistoryRecord>, Error>;
}
