//! Segment catalogue handlers.
//!
//! ```text
//! POST   /api/v1/segments          {"slug":"vip","description":"Paying users"}
//! GET    /api/v1/segments
//! GET    /api/v1/segments/{slug}
//! PUT    /api/v1/segments/{slug}   {"description":"..."}
//! DELETE /api/v1/segments/{slug}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, Segment};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_description, parse_slug};

const SLUG: FieldName = FieldName::new("slug");

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSegmentRequest {
    #[schema(example = "avito_voice_messages")]
    pub slug: String,
    #[serde(default)]
    #[schema(example = "Voice messages beta")]
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSegmentRequest {
    pub description: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/segments",
    request_body = CreateSegmentRequest,
    responses(
        (status = 201, description = "Segment created", body = Segment),
        (status = 400, description = "Invalid slug or description", body = Error),
        (status = 409, description = "Slug already taken", body = Error)
    ),
    tags = ["segments"],
    operation_id = "createSegment"
)]
#[post("/segments")]
pub async fn create_segment(
    state: web::Data<HttpState>,
    payload: web::Json<CreateSegmentRequest>,
) -> ApiResult<HttpResponse> {
    let CreateSegmentRequest { slug, description } = payload.into_inner();
    let slug = parse_slug(SLUG, slug)?;
    let description = parse_description(description)?;
    let segment = state.segments.create_segment(slug, description).await?;
    Ok(HttpResponse::Created().json(segment))
}

#[utoipa::path(
    get,
    path = "/api/v1/segments",
    responses(
        (status = 200, description = "Segments ordered by slug", body = [Segment]),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["segments"],
    operation_id = "listSegments"
)]
#[get("/segments")]
pub async fn list_segments(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<Segment>>> {
    Ok(web::Json(state.segments.list_segments().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/segments/{slug}",
    params(("slug" = String, Path, description = "Segment slug")),
    responses(
        (status = 200, description = "Segment", body = Segment),
        (status = 404, description = "No such segment", body = Error)
    ),
    tags = ["segments"],
    operation_id = "getSegment"
)]
#[get("/segments/{slug}")]
pub async fn get_segment(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Segment>> {
    let slug = parse_slug(SLUG, path.into_inner())?;
    Ok(web::Json(state.segments.get_segment(slug).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/segments/{slug}",
    params(("slug" = String, Path, description = "Segment slug")),
    request_body = UpdateSegmentRequest,
    responses(
        (status = 200, description = "Updated segment", body = Segment),
        (status = 400, description = "Invalid description", body = Error),
        (status = 404, description = "No such segment", body = Error)
    ),
    tags = ["segments"],
    operation_id = "updateSegment"
)]
#[put("/segments/{slug}")]
pub async fn update_segment(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UpdateSegmentRequest>,
) -> ApiResult<web::Json<Segment>> {
    let slug = parse_slug(SLUG, path.into_inner())?;
    let description = parse_description(payload.into_inner().description)?;
    Ok(web::Json(
        state.segments.update_segment(slug, description).await?,
    ))
}

/// Delete a segment; every membership in it goes too.
#[utoipa::path(
    delete,
    path = "/api/v1/segments/{slug}",
    params(("slug" = String, Path, description = "Segment slug")),
    responses(
        (status = 204, description = "Segment deleted"),
        (status = 404, description = "No such segment", body = Error)
    ),
    tags = ["segments"],
    operation_id = "deleteSegment"
)]
#[delete("/segments/{slug}")]
pub async fn delete_segment(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let slug = parse_slug(SLUG, path.into_inner())?;
    state.segments.delete_segment(slug).await?;
    Ok(HttpResponse::NoContent().finish())
}
