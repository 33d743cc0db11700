//! PostgreSQL-backed membership store and history ledger.
//!
//! `apply_update` runs in one transaction:
//! 1. key-share lock the user row (missing user aborts);
//! 2. resolve slugs to segment ids;
//! 3. lock the user's affected membership rows `FOR UPDATE`;
//! 4. plan with [`MembershipPlan`] (unknown slugs abort);
//! 5. `DELETE ... RETURNING`, then upsert `... RETURNING`;
//! 6. append history derived from the returned rows, ignoring exact
//!    duplicates via the unique event index.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{
    AppliedMembershipUpdate, SegmentAssignmentRepository, SegmentAssignmentRepositoryError,
};
use crate::domain::{
    HistoryAction, HistoryEvent, HistoryPeriod, HistoryRecord, Membership, MembershipPlan,
    MembershipUpdate, Segment, SegmentId, SegmentSlug, UnknownSegments, UserId, UserName,
};

use super::diesel_helpers::{
    DieselFailure, classify_diesel_error, collect_rows, map_pool_error_message,
};
use super::models::{HistoryReportRow, MembershipRow, NewHistoryRow, SegmentRow};
use super::pool::{DbPool, PoolError};
use super::schema::{segments, user_segment_history, user_segments, users};

/// Diesel-backed implementation of [`SegmentAssignmentRepository`].
#[derive(Clone)]
pub struct DieselSegmentAssignmentRepository {
    pool: DbPool,
}

impl DieselSegmentAssignmentRepository {
    /// Create a repository with the given connection pool.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use segments_backend::outbound::persistence::{
    ///     DbPool, DieselSegmentAssignmentRepository, PoolConfig,
    /// };
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let pool = DbPool::new(PoolConfig::new("postgres://localhost/segments")).await?;
    /// let repository = DieselSegmentAssignmentRepository::new(pool);
    /// # let _ = repository;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside the update transaction.
#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    Rejected(SegmentAssignmentRepositoryError),
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> SegmentAssignmentRepositoryError {
    SegmentAssignmentRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(user_id: UserId, error: diesel::result::Error) -> SegmentAssignmentRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => SegmentAssignmentRepositoryError::connection(message),
        DieselFailure::ForeignKey { constraint }
            if constraint
                .as_deref()
                .is_some_and(|name| name.contains("user_id")) =>
        {
            SegmentAssignmentRepositoryError::unknown_user(user_id.get())
        }
        DieselFailure::ForeignKey { .. } => {
            SegmentAssignmentRepositoryError::query("foreign key violation")
        }
        DieselFailure::UniqueViolation { constraint } => SegmentAssignmentRepositoryError::query(
            format!("unique violation on {}", constraint.as_deref().unwrap_or("unknown constraint")),
        ),
        DieselFailure::Query(message) => SegmentAssignmentRepositoryError::query(message),
    }
}

fn map_tx_error(user_id: UserId, error: TxError) -> SegmentAssignmentRepositoryError {
    match error {
        TxError::Diesel(error) => map_diesel_error(user_id, error),
        TxError::Rejected(error) => error,
    }
}

fn corrupt_row(message: String) -> TxError {
    TxError::Rejected(SegmentAssignmentRepositoryError::query(message))
}

fn to_memberships(rows: Vec<MembershipRow>) -> Result<Vec<Membership>, TxError> {
    collect_rows(rows.into_iter().map(Membership::try_from), corrupt_row)
}

fn history_row(event: &HistoryEvent) -> NewHistoryRow {
    NewHistoryRow {
        user_id: event.user_id.get(),
        segment_id: event.segment_id.get(),
        action: event.action.as_str(),
        created_at: event.created_at,
    }
}

fn recorded_event(
    (user_id, segment_id, action, created_at): (i32, i32, String, DateTime<Utc>),
) -> Result<HistoryEvent, String> {
    Ok(HistoryEvent {
        user_id: UserId::new(user_id).map_err(|err| format!("stored user id: {err}"))?,
        segment_id: SegmentId::new(segment_id).map_err(|err| format!("stored segment id: {err}"))?,
        action: action
            .parse::<HistoryAction>()
            .map_err(|err| format!("stored action: {err}"))?,
        created_at,
    })
}

fn history_record(row: HistoryReportRow) -> Result<HistoryRecord, String> {
    let action = row.action()?;
    Ok(HistoryRecord {
        user_id: UserId::new(row.user_id).map_err(|err| format!("stored user id: {err}"))?,
        user_name: UserName::new(row.user_name).map_err(|err| format!("stored user name: {err}"))?,
        segment_slug: SegmentSlug::new(row.segment_slug)
            .map_err(|err| format!("stored slug: {err}"))?,
        segment_description: row.segment_description,
        action,
        created_at: row.created_at,
    })
}

async fn apply_in_transaction(
    conn: &mut AsyncPgConnection,
    update: &MembershipUpdate,
) -> Result<AppliedMembershipUpdate, TxError> {
    let user_id = update.user_id;
    let raw_user_id = user_id.get();

    let user_exists = users::table
        .find(raw_user_id)
        .select(users::id)
        .for_key_share()
        .first::<i32>(conn)
        .await
        .optional()?
        .is_some();
    if !user_exists {
        return Err(TxError::Rejected(
            SegmentAssignmentRepositoryError::unknown_user(raw_user_id),
        ));
    }

    let slugs: Vec<String> = update
        .referenced_slugs()
        .into_iter()
        .map(String::from)
        .collect();
    let resolved: Vec<(String, i32)> = segments::table
        .filter(segments::slug.eq_any(&slugs))
        .select((segments::slug, segments::id))
        .load(conn)
        .await?;
    let segment_ids = resolved
        .into_iter()
        .map(|(slug, id)| {
            let slug = SegmentSlug::new(slug).map_err(|err| format!("stored slug: {err}"))?;
            let id = SegmentId::new(id).map_err(|err| format!("stored segment id: {err}"))?;
            Ok((slug, id))
        })
        .collect::<Result<BTreeMap<_, _>, String>>()
        .map_err(corrupt_row)?;

    let raw_segment_ids: Vec<i32> = segment_ids.values().map(|id| id.get()).collect();
    let locked: Vec<MembershipRow> = user_segments::table
        .filter(user_segments::user_id.eq(raw_user_id))
        .filter(user_segments::segment_id.eq_any(&raw_segment_ids))
        .select(MembershipRow::as_select())
        .for_update()
        .load(conn)
        .await?;
    let existing = to_memberships(locked)?;

    let plan = MembershipPlan::build(update, &segment_ids, &existing).map_err(
        |UnknownSegments(slugs)| {
            TxError::Rejected(SegmentAssignmentRepositoryError::unknown_segments(
                slugs.into_iter().map(String::from).collect::<Vec<_>>(),
            ))
        },
    )?;

    let mut applied = AppliedMembershipUpdate::default();

    if !plan.deletions.is_empty() {
        let deletion_ids: Vec<i32> = plan.deletions.iter().map(|id| id.get()).collect();
        let deleted: Vec<MembershipRow> = diesel::delete(
            user_segments::table
                .filter(user_segments::user_id.eq(raw_user_id))
                .filter(user_segments::segment_id.eq_any(&deletion_ids)),
        )
        .returning(MembershipRow::as_returning())
        .get_results(conn)
        .await?;
        applied.removed = to_memberships(deleted)?;
    }

    if !plan.upserts.is_empty() {
        for upsert in &plan.upserts {
            debug!(
                %user_id,
                segment_id = %upsert.segment_id,
                kind = ?upsert.kind,
                "upserting membership"
            );
        }
        let rows: Vec<MembershipRow> = plan
            .upserts
            .iter()
            .map(|upsert| MembershipRow {
                user_id: raw_user_id,
                segment_id: upsert.segment_id.get(),
                expiration_time: upsert.expires_at,
                created_at: upsert.created_at,
            })
            .collect();
        let upserted: Vec<MembershipRow> = diesel::insert_into(user_segments::table)
            .values(&rows)
            .on_conflict((user_segments::user_id, user_segments::segment_id))
            .do_update()
            .set((
                user_segments::expiration_time.eq(excluded(user_segments::expiration_time)),
                user_segments::created_at.eq(excluded(user_segments::created_at)),
            ))
            .returning(MembershipRow::as_returning())
            .get_results(conn)
            .await?;
        applied.upserted = to_memberships(upserted)?;
    }

    let history: Vec<NewHistoryRow> = applied
        .removed
        .iter()
        .map(HistoryEvent::removed)
        .chain(applied.upserted.iter().map(HistoryEvent::added))
        .map(|event| history_row(&event))
        .collect();
    if !history.is_empty() {
        let inserted: Vec<(i32, i32, String, DateTime<Utc>)> =
            diesel::insert_into(user_segment_history::table)
                .values(&history)
                .on_conflict_do_nothing()
                .returning((
                    user_segment_history::user_id,
                    user_segment_history::segment_id,
                    user_segment_history::action,
                    user_segment_history::created_at,
                ))
                .get_results(conn)
                .await?;
        applied.recorded = collect_rows(inserted.into_iter().map(recorded_event), corrupt_row)?;
    }

    Ok(applied)
}

#[async_trait]
impl SegmentAssignmentRepository for DieselSegmentAssignmentRepository {
    async fn apply_update(
        &self,
        update: &MembershipUpdate,
    ) -> Result<AppliedMembershipUpdate, SegmentAssignmentRepositoryError> {
        let user_id = update.user_id;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let applied = conn
            .transaction(|conn| async move { apply_in_transaction(conn, update).await }.scope_boxed())
            .await
            .map_err(|err| map_tx_error(user_id, err))?;

        debug!(
            %user_id,
            removed = applied.removed.len(),
            upserted = applied.upserted.len(),
            recorded = applied.recorded.len(),
            "membership transaction committed"
        );
        Ok(applied)
    }

    async fn active_segments(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<Vec<Segment>, SegmentAssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<SegmentRow> = segments::table
            .inner_join(user_segments::table)
            .filter(user_segments::user_id.eq(user_id.get()))
            .filter(user_segments::expiration_time.gt(at))
            .select(SegmentRow::as_select())
            .order_by(segments::slug.asc())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(user_id, err))?;

        collect_rows(
            rows.into_iter().map(Segment::try_from),
            |message| SegmentAssignmentRepositoryError::query(message),
        )
    }

    async fn history_for_period(
        &self,
        user_id: UserId,
        period: HistoryPeriod,
    ) -> Result<Vec<HistoryRecord>, SegmentAssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<HistoryReportRow> = user_segment_history::table
            .inner_join(users::table)
            .inner_join(segments::table)
            .filter(user_segment_history::user_id.eq(user_id.get()))
            .filter(user_segment_history::created_at.ge(period.start()))
            .filter(user_segment_history::created_at.lt(period.end()))
            .order_by((
                user_segment_history::created_at.asc(),
                user_segment_history::id.asc(),
            ))
            .select((
                user_segment_history::user_id,
                users::name,
                segments::slug,
                segments::description,
                user_segment_history::action,
                user_segment_history::created_at,
            ))
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(user_id, err))?;

        collect_rows(
            rows.into_iter().map(history_record),
            |message| SegmentAssignmentRepositoryError::query(message),
        )
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for error mapping; queries run against PostgreSQL
    //! in deployment only.
    use super::*;
    use rstest::rstest;

    fn user() -> UserId {
        UserId::new(1).expect("valid user id")
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));
        assert_eq!(
            err,
            SegmentAssignmentRepositoryError::connection("connection refused")
        );
    }

    #[rstest]
    fn rejected_errors_pass_through() {
        let rejected = SegmentAssignmentRepositoryError::unknown_segments(vec!["ghost".to_owned()]);
        let mapped = map_tx_error(user(), TxError::Rejected(rejected.clone()));
        assert_eq!(mapped, rejected);
    }

    #[rstest]
    fn not_found_maps_to_query_error() {
        let mapped = map_tx_error(user(), TxError::Diesel(diesel::result::Error::NotFound));
        assert!(matches!(mapped, SegmentAssignmentRepositoryError::Query { .. }));
    }

    #[rstest]
    fn history_rows_convert_to_records() {
        let row = HistoryReportRow {
            user_id: 1,
            user_name: "Ada".to_owned(),
            segment_slug: "vip".to_owned(),
            segment_description: String::new(),
            action: "REMOVE".to_owned(),
            created_at: Utc::now(),
        };
        let record = history_record(row).expect("valid row");
        assert_eq!(record.action, HistoryAction::Remove);
        assert_eq!(record.segment_slug.as_str(), "vip");
    }

    #[rstest]
    fn corrupt_history_action_is_reported() {
        let row = HistoryReportRow {
            user_id: 1,
            user_name: "Ada".to_owned(),
            segment_slug: "vip".to_owned(),
            segment_description: String::new(),
            action: "MOVE".to_owned(),
            created_at: Utc::now(),
        };
        let err = history_record(row).expect_err("corrupt action");
        assert!(err.contains("MOVE"));
    }
}
