//! Membership handlers: change a user's segments, list active ones, and
//! export monthly history.
//!
//! ```text
//! PATCH /api/v1/users/{id}/segments {"add":[{"slug":"vip"}],"remove":["beta"]}
//! GET   /api/v1/users/{id}/segments
//! GET   /api/v1/users/{id}/segments/history?year=2025&month=3
//! ```

use actix_web::{HttpRequest, get, patch, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::MembershipUpdateOutcome;
use crate::domain::{Error, MembershipUpdateRequest, Segment, SegmentAddition};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_period, parse_slug_at, parse_user_id};

/// One segment to add; the expiry defaults to the configured TTL.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SegmentAdditionRequest {
    #[schema(example = "vip")]
    pub slug: String,
    #[serde(default, alias = "expiration_time")]
    pub expiration_time: Option<DateTime<Utc>>,
}

/// Removals are applied before additions.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserSegmentsRequest {
    #[serde(default)]
    pub add: Vec<SegmentAdditionRequest>,
    #[serde(default)]
    pub remove: Vec<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct HistoryQuery {
    /// Calendar year, 1..=9999.
    pub year: i32,
    /// Calendar month, 1..=12.
    pub month: u32,
}

/// Link to a generated CSV report.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct HistoryReportResponse {
    #[schema(example = "http://localhost:8080/reports/report_1_2025_3.csv")]
    pub url: String,
}

fn into_domain_request(
    user_id: i32,
    body: UpdateUserSegmentsRequest,
) -> Result<MembershipUpdateRequest, Error> {
    let user_id = parse_user_id(user_id)?;
    let additions = body
        .add
        .into_iter()
        .enumerate()
        .map(|(index, addition)| {
            let slug = parse_slug_at(FieldName::new("add"), index, addition.slug)?;
            Ok(SegmentAddition {
                slug,
                expires_at: addition.expiration_time,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    let removals = body
        .remove
        .into_iter()
        .enumerate()
        .map(|(index, slug)| parse_slug_at(FieldName::new("remove"), index, slug))
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(MembershipUpdateRequest {
        user_id,
        additions,
        removals,
    })
}

/// Apply removals then additions atomically.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}/segments",
    params(("id" = i32, Path, description = "User id")),
    request_body = UpdateUserSegmentsRequest,
    responses(
        (status = 200, description = "Update committed", body = MembershipUpdateOutcome),
        (status = 400, description = "Malformed or unknown slugs", body = Error),
        (status = 404, description = "No such user", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["memberships"],
    operation_id = "updateUserSegments"
)]
#[patch("/users/{id}/segments")]
pub async fn update_user_segments(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
    payload: web::Json<UpdateUserSegmentsRequest>,
) -> ApiResult<web::Json<MembershipUpdateOutcome>> {
    let request = into_domain_request(path.into_inner(), payload.into_inner())?;
    Ok(web::Json(state.memberships.update(request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/segments",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Active segments ordered by slug", body = [Segment]),
        (status = 400, description = "Invalid id", body = Error)
    ),
    tags = ["memberships"],
    operation_id = "listActiveSegments"
)]
#[get("/users/{id}/segments")]
pub async fn active_segments(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Vec<Segment>>> {
    let user_id = parse_user_id(path.into_inner())?;
    Ok(web::Json(
        state.memberships_query.active_segments(user_id).await?,
    ))
}

/// Export one month of history as CSV and return its URL.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/segments/history",
    params(("id" = i32, Path, description = "User id"), HistoryQuery),
    responses(
        (status = 200, description = "Report generated", body = HistoryReportResponse),
        (status = 400, description = "Invalid period", body = Error)
    ),
    tags = ["memberships"],
    operation_id = "exportSegmentHistory"
)]
#[get("/users/{id}/segments/history")]
pub async fn segment_history(
    req: HttpRequest,
    state: web::Data<HttpState>,
    path: web::Path<i32>,
    query: web::Query<HistoryQuery>,
) -> ApiResult<web::Json<HistoryReportResponse>> {
    let user_id = parse_user_id(path.into_inner())?;
    let HistoryQuery { year, month } = query.into_inner();
    let period = parse_period(year, month)?;
    let report = state.reports.generate(user_id, period).await?;
    let info = req.connection_info();
    let url = format!("{}://{}/{}", info.scheme(), info.host(), report.location());
    Ok(web::Json(HistoryReportResponse { url }))
}

#[cfg(test)]
#[path = "user_segments_tests.rs"]
mod tests;
