//! PostgreSQL-backed `SegmentRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{SegmentPersistenceError, SegmentRepository};
use crate::domain::{Segment, SegmentDescription, SegmentSlug};

use super::diesel_helpers::{
    DieselFailure, classify_diesel_error, collect_rows, map_pool_error_message,
};
use super::models::{NewSegmentRow, SegmentRow};
use super::pool::{DbPool, PoolError};
use super::schema::segments;

/// Diesel-backed implementation of the segment repository port.
#[derive(Clone)]
pub struct DieselSegmentRepository {
    pool: DbPool,
}

impl DieselSegmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SegmentPersistenceError {
    SegmentPersistenceError::connection(map_pool_error_message(error))
}

fn map_failure(failure: DieselFailure) -> SegmentPersistenceError {
    match failure {
        DieselFailure::Connection(message) => SegmentPersistenceError::connection(message),
        DieselFailure::UniqueViolation { .. } => SegmentPersistenceError::query("unique violation"),
        DieselFailure::ForeignKey { .. } => {
            SegmentPersistenceError::query("foreign key violation")
        }
        DieselFailure::Query(message) => SegmentPersistenceError::query(message),
    }
}

/// Unique violations on a slug-keyed statement can only be the slug index.
fn map_diesel_error(slug: &SegmentSlug, error: diesel::result::Error) -> SegmentPersistenceError {
    match classify_diesel_error(error) {
        DieselFailure::UniqueViolation { .. } => {
            SegmentPersistenceError::duplicate_slug(slug.as_str())
        }
        other => map_failure(other),
    }
}

fn to_segment(row: SegmentRow) -> Result<Segment, SegmentPersistenceError> {
    Segment::try_from(row).map_err(SegmentPersistenceError::query)
}

#[async_trait]
impl SegmentRepository for DieselSegmentRepository {
    async fn create(
        &self,
        slug: &SegmentSlug,
        description: &SegmentDescription,
        created_at: DateTime<Utc>,
    ) -> Result<Segment, SegmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: SegmentRow = diesel::insert_into(segments::table)
            .values(&NewSegmentRow {
                slug: slug.as_str(),
                description: description.as_str(),
                created_at,
            })
            .returning(SegmentRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(slug, err))?;
        to_segment(row)
    }

    async fn update_description(
        &self,
        slug: &SegmentSlug,
        description: &SegmentDescription,
    ) -> Result<Option<Segment>, SegmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SegmentRow> =
            diesel::update(segments::table.filter(segments::slug.eq(slug.as_str())))
                .set(segments::description.eq(description.as_str()))
                .returning(SegmentRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(|err| map_diesel_error(slug, err))?;
        row.map(to_segment).transpose()
    }

    async fn delete(&self, slug: &SegmentSlug) -> Result<bool, SegmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(segments::table.filter(segments::slug.eq(slug.as_str())))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(slug, err))?;
        Ok(deleted > 0)
    }

    async fn find_by_slug(
        &self,
        slug: &SegmentSlug,
    ) -> Result<Option<Segment>, SegmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SegmentRow> = segments::table
            .filter(segments::slug.eq(slug.as_str()))
            .select(SegmentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(slug, err))?;
        row.map(to_segment).transpose()
    }

    async fn list(&self) -> Result<Vec<Segment>, SegmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<SegmentRow> = segments::table
            .select(SegmentRow::as_select())
            .order_by(segments::slug.asc())
            .load(&mut conn)
            .await
            .map_err(|err| map_failure(classify_diesel_error(err)))?;
        collect_rows(rows.into_iter().map(Segment::try_from), |message| {
            SegmentPersistenceError::query(message)
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind};
    use rstest::rstest;

    #[derive(Debug)]
    struct UniqueSlug;

    impl DatabaseErrorInformation for UniqueSlug {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint \"segments_slug_key\""
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("segments")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some("segments_slug_key")
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    #[rstest]
    fn unique_violation_maps_to_duplicate_slug() {
        let slug = SegmentSlug::new("vip").expect("valid slug");
        let err = map_diesel_error(
            &slug,
            diesel::result::Error::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                Box::new(UniqueSlug),
            ),
        );
        assert_eq!(err, SegmentPersistenceError::duplicate_slug("vip"));
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::build("bad url"));
        assert!(matches!(err, SegmentPersistenceError::Connection { .. }));
    }
}
