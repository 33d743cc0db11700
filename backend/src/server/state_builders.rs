//! Builders wiring repositories into the HTTP state.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use segments_backend::domain::ports::{
    SegmentAssignmentQuery, SegmentAssignmentRepository, SegmentRepository, UserRepository,
};
use segments_backend::domain::{
    HistoryReportService, SegmentAssignmentService, SegmentCatalogueService, UserDirectoryService,
};
use segments_backend::inbound::http::state::HttpState;
use segments_backend::outbound::memory::InMemoryStore;
use segments_backend::outbound::persistence::{
    DieselSegmentAssignmentRepository, DieselSegmentRepository, DieselUserRepository,
};

use super::ServerConfig;

struct Repositories<U, S, A> {
    users: Arc<U>,
    segments: Arc<S>,
    assignments: Arc<A>,
}

fn build_from<U, S, A>(repos: Repositories<U, S, A>, config: &ServerConfig) -> HttpState
where
    U: UserRepository + 'static,
    S: SegmentRepository + 'static,
    A: SegmentAssignmentRepository + 'static,
{
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let assignments = Arc::new(
        SegmentAssignmentService::new(repos.assignments, clock.clone())
            .with_expiry_policy(config.expiry),
    );
    let query: Arc<dyn SegmentAssignmentQuery> = assignments.clone();
    HttpState {
        users: Arc::new(UserDirectoryService::new(repos.users, clock.clone())),
        segments: Arc::new(SegmentCatalogueService::new(repos.segments, clock)),
        memberships: assignments,
        memberships_query: query.clone(),
        reports: Arc::new(HistoryReportService::new(
            query,
            Arc::new(config.reports.clone()),
        )),
    }
}

/// Diesel repositories when a pool is configured, otherwise one shared
/// in-memory store.
pub(crate) fn build_http_state(config: &ServerConfig) -> HttpState {
    match &config.db_pool {
        Some(pool) => build_from(
            Repositories {
                users: Arc::new(DieselUserRepository::new(pool.clone())),
                segments: Arc::new(DieselSegmentRepository::new(pool.clone())),
                assignments: Arc::new(DieselSegmentAssignmentRepository::new(pool.clone())),
            },
            config,
        ),
        None => {
            let store = Arc::new(InMemoryStore::new());
            build_from(
                Repositories {
                    users: store.clone(),
                    segments: store.clone(),
                    assignments: store,
                },
                config,
            )
        }
    }
}
