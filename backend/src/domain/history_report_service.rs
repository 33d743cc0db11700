//! History report export service implementing [`HistoryReportCommand`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{
    HistoryReport, HistoryReportCommand, HistoryReportWriter, HistoryReportWriterError,
    SegmentAssignmentQuery,
};
use crate::domain::{Error, HistoryPeriod, UserId, render_history_csv, report_file_name};

/// Renders a user's monthly history to CSV and stores it via a writer.
#[derive(Clone)]
pub struct HistoryReportService<W> {
    history: Arc<dyn SegmentAssignmentQuery>,
    writer: Arc<W>,
}

impl<W> HistoryReportService<W> {
    pub fn new(history: Arc<dyn SegmentAssignmentQuery>, writer: Arc<W>) -> Self {
        Self { history, writer }
    }
}

fn map_writer_error(error: HistoryReportWriterError) -> Error {
    match error {
        HistoryReportWriterError::InvalidName { name } => {
            Error::invalid_request(format!("invalid report name {name:?}"))
        }
        HistoryReportWriterError::Io { message } => {
            Error::internal(format!("report storage failed: {message}"))
        }
    }
}

#[async_trait]
impl<W> HistoryReportCommand for HistoryReportService<W>
where
    W: HistoryReportWriter,
{
    async fn generate(
        &self,
        user_id: UserId,
        period: HistoryPeriod,
    ) -> Result<HistoryReport, Error> {
        let records = self.history.history(user_id, period).await?;
        let file_name = report_file_name(user_id, period);
        let csv = render_history_csv(&records);

        self.writer
            .write(&file_name, csv.into_bytes())
            .await
            .map_err(map_writer_error)?;

        info!(%user_id, %period, rows = records.len(), file = %file_name, "history report written");
        Ok(HistoryReport {
            file_name,
            rows: records.len(),
        })
    }

    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>, Error> {
        self.writer
            .read(file_name)
            .await
            .map_err(map_writer_error)?
            .ok_or_else(|| Error::not_found(format!("report {file_name} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockHistoryReportWriter, MockSegmentAssignmentQuery};
    use crate::domain::{ErrorCode, HistoryAction, HistoryRecord, SegmentSlug, UserName};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn user_id() -> UserId {
        UserId::new(1).expect("valid user id")
    }

    fn january() -> HistoryPeriod {
        HistoryPeriod::new(2025, 1).expect("valid period")
    }

    fn record() -> HistoryRecord {
        HistoryRecord {
            user_id: user_id(),
            user_name: UserName::new("Ada").expect("valid name"),
            segment_slug: SegmentSlug::new("vip").expect("valid slug"),
            segment_description: "Top customers".to_owned(),
            action: HistoryAction::Add,
            created_at: Utc
                .with_ymd_and_hms(2025, 1, 2, 3, 4, 5)
                .single()
                .expect("valid timestamp"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn generate_writes_csv_and_returns_location() {
        let mut query = MockSegmentAssignmentQuery::new();
        query
            .expect_history()
            .times(1)
            .returning(|_, _| Ok(vec![record()]));
        let mut writer = MockHistoryReportWriter::new();
        writer
            .expect_write()
            .withf(|name, contents| {
                name == "report_1_2025_1.csv"
                    && String::from_utf8_lossy(contents)
                        .ends_with("1;Ada;vip;Top customers;ADD;2025-01-02T03:04:05Z\n")
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let service = HistoryReportService::new(Arc::new(query), Arc::new(writer));

        let report = service
            .generate(user_id(), january())
            .await
            .expect("report generated");
        assert_eq!(report.rows, 1);
        assert_eq!(report.location(), "reports/report_1_2025_1.csv");
    }

    #[rstest]
    #[tokio::test]
    async fn history_failure_skips_writer() {
        let mut query = MockSegmentAssignmentQuery::new();
        query
            .expect_history()
            .times(1)
            .returning(|_, _| Err(Error::service_unavailable("down")));
        let service =
            HistoryReportService::new(Arc::new(query), Arc::new(MockHistoryReportWriter::new()));

        let error = service
            .generate(user_id(), january())
            .await
            .expect_err("history unavailable");
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }

    #[rstest]
    #[tokio::test]
    async fn fetching_missing_report_is_not_found() {
        let mut writer = MockHistoryReportWriter::new();
        writer.expect_read().times(1).returning(|_| Ok(None));
        let service = HistoryReportService::new(
            Arc::new(MockSegmentAssignmentQuery::new()),
            Arc::new(writer),
        );

        let error = service
            .fetch("report_9_2025_1.csv")
            .await
            .expect_err("missing report");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }
}
