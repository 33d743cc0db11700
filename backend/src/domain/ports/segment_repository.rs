//! Port abstraction for the segment catalogue store.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Segment, SegmentDescription, SegmentSlug};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by segment repository adapters.
    pub enum SegmentPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "segment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "segment repository query failed: {message}",
        /// A segment with the slug already exists.
        DuplicateSlug { slug: String } => "segment {slug:?} already exists",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentRepository: Send + Sync {
    /// Insert a segment; the slug must be unused.
    async fn create(
        &self,
        slug: &SegmentSlug,
        description: &SegmentDescription,
        created_at: DateTime<Utc>,
    ) -> Result<Segment, SegmentPersistenceError>;

    /// Replace a segment's description; `None` when the slug is unknown.
    async fn update_description(
        &self,
        slug: &SegmentSlug,
        description: &SegmentDescription,
    ) -> Result<Option<Segment>, SegmentPersistenceError>;

    /// Delete a segment together with its memberships and history.
    ///
    /// Returns `false` when the slug is unknown.
    async fn delete(&self, slug: &SegmentSlug) -> Result<bool, SegmentPersistenceError>;

    /// Fetch a segment by slug.
    async fn find_by_slug(
        &self,
        slug: &SegmentSlug,
    ) -> Result<Option<Segment>, SegmentPersistenceError>;

    /// Every segment, ordered by slug.
    async fn list(&self) -> Result<Vec<Segment>, SegmentPersistenceError>;
}
