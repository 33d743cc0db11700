//! Append-only membership audit trail.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Membership, SegmentId, SegmentSlug, UserId, UserName};

/// Kind of membership change recorded in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    Add,
    Remove,
}

impl HistoryAction {
    /// Stored and exported representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Remove => "REMOVE",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored action string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown history action {0:?}")]
pub struct ParseHistoryActionError(pub String);

impl FromStr for HistoryAction {
    type Err = ParseHistoryActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADD" => Ok(Self::Add),
            "REMOVE" => Ok(Self::Remove),
            other => Err(ParseHistoryActionError(other.to_owned())),
        }
    }
}

/// Event written alongside a membership change.
///
/// `created_at` is the affected row's `created_at`, so a REMOVE is dated by
/// when the link was established rather than when it was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEvent {
    pub user_id: UserId,
    pub segment_id: SegmentId,
    pub action: HistoryAction,
    pub created_at: DateTime<Utc>,
}

impl HistoryEvent {
    /// ADD event for a row that was inserted or updated.
    pub fn added(row: &Membership) -> Self {
        Self::for_row(row, HistoryAction::Add)
    }

    /// REMOVE event for a row that was deleted.
    pub fn removed(row: &Membership) -> Self {
        Self::for_row(row, HistoryAction::Remove)
    }

    fn for_row(row: &Membership, action: HistoryAction) -> Self {
        Self {
            user_id: row.user_id,
            segment_id: row.segment_id,
            action,
            created_at: row.created_at,
        }
    }
}

/// History entry enriched for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    #[schema(value_type = i32, example = 1)]
    pub user_id: UserId,
    #[schema(value_type = String, example = "Ada Lovelace")]
    pub user_name: UserName,
    #[schema(value_type = String, example = "vip")]
    pub segment_slug: SegmentSlug,
    pub segment_description: String,
    pub action: HistoryAction,
    pub created_at: DateTime<Utc>,
}

/// Validation errors for [`HistoryPeriod`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryPeriodError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("year must be between 1 and 9999, got {0}")]
    InvalidYear(i32),
}

/// Calendar month in UTC, used to filter history.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use segments_backend::domain::HistoryPeriod;
///
/// let period = HistoryPeriod::new(2025, 12).expect("valid period");
/// assert_eq!(period.start(), Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
/// assert_eq!(period.end(), Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryPeriod {
    year: i32,
    month: u32,
}

impl HistoryPeriod {
    /// Validate and construct a period.
    pub fn new(year: i32, month: u32) -> Result<Self, HistoryPeriodError> {
        if !(1..=12).contains(&month) {
            return Err(HistoryPeriodError::InvalidMonth(month));
        }
        if !(1..=9999).contains(&year) {
            return Err(HistoryPeriodError::InvalidYear(year));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First instant of the month (inclusive).
    pub fn start(&self) -> DateTime<Utc> {
        month_start(self.year, self.month)
    }

    /// First instant of the following month (exclusive).
    pub fn end(&self) -> DateTime<Utc> {
        if self.month == 12 {
            month_start(self.year + 1, 1)
        } else {
            month_start(self.year, self.month + 1)
        }
    }

    /// `true` when `at` falls within `[start, end)`.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at.year() == self.year && at.month() == self.month
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

fn month_start(year: i32, month: u32) -> DateTime<Utc> {
    // Fields are validated on construction so the date always exists.
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HistoryAction::Add, "ADD")]
    #[case(HistoryAction::Remove, "REMOVE")]
    fn action_text_round_trips(#[case] action: HistoryAction, #[case] text: &str) {
        assert_eq!(action.as_str(), text);
        assert_eq!(text.parse::<HistoryAction>(), Ok(action));
        assert_eq!(
            serde_json::to_value(action).expect("serialise"),
            serde_json::json!(text)
        );
    }

    #[rstest]
    fn unknown_action_is_rejected() {
        assert_eq!(
            "add".parse::<HistoryAction>(),
            Err(ParseHistoryActionError("add".to_owned()))
        );
    }

    #[rstest]
    #[case(2025, 0, HistoryPeriodError::InvalidMonth(0))]
    #[case(2025, 13, HistoryPeriodError::InvalidMonth(13))]
    #[case(0, 5, HistoryPeriodError::InvalidYear(0))]
    #[case(10_000, 5, HistoryPeriodError::InvalidYear(10_000))]
    fn rejects_out_of_range_periods(
        #[case] year: i32,
        #[case] month: u32,
        #[case] expected: HistoryPeriodError,
    ) {
        assert_eq!(HistoryPeriod::new(year, month), Err(expected));
    }

    #[rstest]
    fn period_bounds_are_half_open() {
        let period = HistoryPeriod::new(2024, 2).expect("valid period");
        let start = period.start();
        let end = period.end();

        assert!(period.contains(start));
        assert!(!period.contains(end));
        assert!(period.contains(end - chrono::TimeDelta::nanoseconds(1)));
        assert_eq!(period.to_string(), "2024-02");
    }
}
