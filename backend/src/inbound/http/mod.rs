//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod health;
pub mod reports;
pub mod segments;
pub mod state;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod user_segments;
pub mod users;
pub(crate) mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register the `/api/v1` scope, the report download route and the
/// extractor error handlers. Health probes and docs are wired separately.
pub fn configure(cfg: &mut web::ServiceConfig) {
    error::configure_extractors(cfg);
    cfg.service(
        web::scope("/api/v1")
            .service(users::create_user)
            .service(users::list_users)
            .service(users::get_user)
            .service(users::rename_user)
            .service(users::delete_user)
            .service(segments::create_segment)
            .service(segments::list_segments)
            .service(segments::get_segment)
            .service(segments::update_segment)
            .service(segments::delete_segment)
            .service(user_segments::update_user_segments)
            .service(user_segments::active_segments)
            .service(user_segments::segment_history),
    )
    .service(reports::download_report);
}
