//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types validate
//! the stored values and report corrupt rows as query errors.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{
    HistoryAction, Membership, Segment, SegmentDescription, SegmentId, SegmentSlug, User, UserId,
    UserName,
};

use super::schema::{segments, user_segment_history, user_segments, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub name: &'a str,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(row.id).map_err(|err| format!("stored user id: {err}"))?,
            name: UserName::new(row.name).map_err(|err| format!("stored user name: {err}"))?,
            created_at: row.created_at,
        })
    }
}

/// Row struct for reading from the segments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = segments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SegmentRow {
    pub id: i32,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating segment records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = segments)]
pub(crate) struct NewSegmentRow<'a> {
    pub slug: &'a str,
    pub description: &'a str,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SegmentRow> for Segment {
    type Error = String;

    fn try_from(row: SegmentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SegmentId::new(row.id).map_err(|err| format!("stored segment id: {err}"))?,
            slug: SegmentSlug::new(row.slug).map_err(|err| format!("stored slug: {err}"))?,
            description: SegmentDescription::new(row.description)
                .map_err(|err| format!("stored description: {err}"))?,
            created_at: row.created_at,
        })
    }
}

/// Row struct for reading and upserting memberships.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = user_segments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MembershipRow {
    pub user_id: i32,
    pub segment_id: i32,
    pub expiration_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = String;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::new(row.user_id).map_err(|err| format!("stored user id: {err}"))?,
            segment_id: SegmentId::new(row.segment_id)
                .map_err(|err| format!("stored segment id: {err}"))?,
            expires_at: row.expiration_time,
            created_at: row.created_at,
        })
    }
}

/// Insertable struct for appending history events.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_segment_history)]
pub(crate) struct NewHistoryRow {
    pub user_id: i32,
    pub segment_id: i32,
    pub action: &'static str,
    pub created_at: DateTime<Utc>,
}

/// History row joined with its user and segment for reporting.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct HistoryReportRow {
    pub user_id: i32,
    pub user_name: String,
    pub segment_slug: String,
    pub segment_description: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryReportRow {
    pub fn action(&self) -> Result<HistoryAction, String> {
        self.action.parse().map_err(|err| format!("stored action: {err}"))
    }
}
