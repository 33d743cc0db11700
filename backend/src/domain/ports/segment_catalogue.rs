//! Driving port for the segment catalogue.

use async_trait::async_trait;

use crate::domain::{Error, Segment, SegmentDescription, SegmentSlug};

/// Use-case port for managing segment definitions.
///
/// Unknown slugs surface as `not_found`; reusing a slug is a `conflict`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentCatalogue: Send + Sync {
    async fn create_segment(
        &self,
        slug: SegmentSlug,
        description: SegmentDescription,
    ) -> Result<Segment, Error>;

    async fn update_segment(
        &self,
        slug: SegmentSlug,
        description: SegmentDescription,
    ) -> Result<Segment, Error>;

    async fn delete_segment(&self, slug: SegmentSlug) -> Result<(), Error>;

    async fn get_segment(&self, slug: SegmentSlug) -> Result<Segment, Error>;

    async fn list_segments(&self) -> Result<Vec<Segment>, Error>;
}
