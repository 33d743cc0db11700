//! Segment catalogue service implementing [`SegmentCatalogue`].

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{SegmentCatalogue, SegmentPersistenceError, SegmentRepository};
use crate::domain::{Error, Segment, SegmentDescription, SegmentSlug};

/// Plain CRUD over a [`SegmentRepository`], keyed by slug.
#[derive(Clone)]
pub struct SegmentCatalogueService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> SegmentCatalogueService<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

fn map_persistence_error(error: SegmentPersistenceError) -> Error {
    match error {
        SegmentPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("segment repository unavailable: {message}"))
        }
        SegmentPersistenceError::Query { message } => {
            Error::internal(format!("segment repository error: {message}"))
        }
        SegmentPersistenceError::DuplicateSlug { slug } => {
            Error::conflict(format!("segment {slug} already exists"))
                .with_details(json!({ "code": "duplicate_slug", "slug": slug }))
        }
    }
}

fn segment_not_found(slug: &SegmentSlug) -> Error {
    Error::not_found(format!("segment {slug} not found"))
}

#[async_trait]
impl<R> SegmentCatalogue for SegmentCatalogueService<R>
where
    R: SegmentRepository,
{
    async fn create_segment(
        &self,
        slug: SegmentSlug,
        description: SegmentDescription,
    ) -> Result<Segment, Error> {
        let segment = self
            .repo
            .create(&slug, &description, self.clock.utc())
            .await
            .map_err(map_persistence_error)?;
        info!(slug = %segment.slug, "segment created");
        Ok(segment)
    }

    async fn update_segment(
        &self,
        slug: SegmentSlug,
        description: SegmentDescription,
    ) -> Result<Segment, Error> {
        self.repo
            .update_description(&slug, &description)
            .await
            .map_err(map_persistence_error)?
            .ok_or_else(|| segment_not_found(&slug))
    }

    async fn delete_segment(&self, slug: SegmentSlug) -> Result<(), Error> {
        let deleted = self
            .repo
            .delete(&slug)
            .await
            .map_err(map_persistence_error)?;
        if !deleted {
            return Err(segment_not_found(&slug));
        }
        info!(%slug, "segment deleted");
        Ok(())
    }

    async fn get_segment(&self, slug: SegmentSlug) -> Result<Segment, Error> {
        self.repo
            .find_by_slug(&slug)
            .await
            .map_err(map_persistence_error)?
            .ok_or_else(|| segment_not_found(&slug))
    }

    async fn list_segments(&self) -> Result<Vec<Segment>, Error> {
        self.repo.list().await.map_err(map_persistence_error)
    }
}
