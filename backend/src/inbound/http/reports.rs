//! Serves generated CSV reports.

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, get, web};

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Download a report produced by the history export.
#[utoipa::path(
    get,
    path = "/reports/{file}",
    params(("file" = String, Path, description = "Report file name")),
    responses(
        (status = 200, description = "CSV report", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid file name", body = Error),
        (status = 404, description = "No such report", body = Error)
    ),
    tags = ["memberships"],
    operation_id = "downloadReport"
)]
#[get("/reports/{file}")]
pub async fn download_report(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let file = path.into_inner();
    let contents = state.reports.fetch(&file).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file)],
        })
        .body(contents))
}
