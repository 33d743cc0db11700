//! Test helpers wiring handlers to the in-memory store.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use tempfile::TempDir;

use crate::domain::ports::SegmentAssignmentQuery;
use crate::domain::{
    HistoryReportService, SegmentAssignmentService, SegmentCatalogueService, UserDirectoryService,
};
use crate::inbound::http::configure;
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::InMemoryStore;
use crate::outbound::reports::CsvReportDirectory;

/// Clock pinned to 2025-03-10T08:00:00Z.
pub(crate) struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Handler state over one shared in-memory store.
pub(crate) struct TestHarness {
    pub state: HttpState,
    /// Keeps the report directory alive for the duration of the test.
    pub reports_dir: TempDir,
}

pub(crate) fn harness() -> TestHarness {
    let store = Arc::new(InMemoryStore::new());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(fixed_now()));
    let reports_dir = tempfile::tempdir().expect("temporary report directory");
    let writer = Arc::new(CsvReportDirectory::open(reports_dir.path()).expect("open reports"));

    let assignments = Arc::new(SegmentAssignmentService::new(store.clone(), clock.clone()));
    let query: Arc<dyn SegmentAssignmentQuery> = assignments.clone();
    let state = HttpState {
        users: Arc::new(UserDirectoryService::new(store.clone(), clock.clone())),
        segments: Arc::new(SegmentCatalogueService::new(store, clock)),
        memberships: assignments,
        memberships_query: query.clone(),
        reports: Arc::new(HistoryReportService::new(query, writer)),
    };
    TestHarness { state, reports_dir }
}

pub(crate) fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .configure(configure)
}
