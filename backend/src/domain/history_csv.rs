//! CSV rendering of history records.
//!
//! Rows are `;` delimited with timestamps in RFC 3339 (UTC, whole seconds).
//! Fields containing the delimiter, a quote or a line break are quoted with
//! inner quotes doubled.

use chrono::SecondsFormat;

use super::{HistoryPeriod, HistoryRecord, UserId};

/// Field delimiter.
pub const CSV_DELIMITER: char = ';';

/// Header row, without the trailing newline.
pub const CSV_HEADER: &str = "user_id;user_name;segment_slug;segment_description;action;created_at";

/// File name of the report for `user_id` and `period`.
///
/// # Examples
/// ```
/// use segments_backend::domain::{HistoryPeriod, UserId, report_file_name};
///
/// let user = UserId::new(1).unwrap();
/// let period = HistoryPeriod::new(2025, 1).unwrap();
/// assert_eq!(report_file_name(user, period), "report_1_2025_1.csv");
/// ```
pub fn report_file_name(user_id: UserId, period: HistoryPeriod) -> String {
    format!(
        "report_{user_id}_{}_{}.csv",
        period.year(),
        period.month()
    )
}

/// Render `records` as a CSV document including the header.
pub fn render_history_csv(records: &[HistoryRecord]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 96);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for record in records {
        let user_id = record.user_id.to_string();
        let created_at = record
            .created_at
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let fields = [
            user_id.as_str(),
            record.user_name.as_str(),
            record.segment_slug.as_str(),
            record.segment_description.as_str(),
            record.action.as_str(),
            created_at.as_str(),
        ];
        for (index, field) in fields.iter().enumerate() {
            if index > 0 {
                out.push(CSV_DELIMITER);
            }
            push_field(&mut out, field);
        }
        out.push('\n');
    }
    out
}

fn push_field(out: &mut String, field: &str) {
    let needs_quotes = field
        .chars()
        .any(|ch| ch == CSV_DELIMITER || ch == '"' || ch == '\n' || ch == '\r');
    if !needs_quotes {
        out.push_str(field);
        return;
    }
    out.push('"');
    out.push_str(&field.replace('"', "\"\""));
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HistoryAction, SegmentSlug, UserName};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn record(description: &str, action: HistoryAction) -> HistoryRecord {
        HistoryRecord {
            user_id: UserId::new(1).expect("valid user id"),
            user_name: UserName::new("Ada Lovelace").expect("valid name"),
            segment_slug: SegmentSlug::new("vip").expect("valid slug"),
            segment_description: description.to_owned(),
            action,
            created_at: Utc
                .with_ymd_and_hms(2025, 1, 15, 9, 30, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    #[rstest]
    fn empty_history_renders_header_only() {
        assert_eq!(render_history_csv(&[]), format!("{CSV_HEADER}\n"));
    }

    #[rstest]
    fn rows_use_semicolons_and_rfc3339() {
        let csv = render_history_csv(&[
            record("Top customers", HistoryAction::Add),
            record("Top customers", HistoryAction::Remove),
        ]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                CSV_HEADER,
                "1;Ada Lovelace;vip;Top customers;ADD;2025-01-15T09:30:00Z",
                "1;Ada Lovelace;vip;Top customers;REMOVE;2025-01-15T09:30:00Z",
            ]
        );
    }

    #[rstest]
    #[case("a;b", "\"a;b\"")]
    #[case("say \"hi\"", "\"say \"\"hi\"\"\"")]
    #[case("two\nlines", "\"two\nlines\"")]
    fn special_characters_are_quoted(#[case] description: &str, #[case] expected: &str) {
        let csv = render_history_csv(&[record(description, HistoryAction::Add)]);
        assert!(
            csv.contains(&format!(";vip;{expected};ADD;")),
            "unexpected CSV: {csv}"
        );
    }
}
