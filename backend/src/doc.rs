//! OpenAPI documentation for the REST API.
//!
//! [`ApiDoc`] registers every handler in the inbound HTTP layer together
//! with the domain schemas they exchange. Swagger UI serves it at `/docs` in
//! debug builds.

use utoipa::OpenApi;

use crate::domain::ports::MembershipUpdateOutcome;
use crate::domain::{Error, ErrorCode, Segment, User};
use crate::inbound::http::segments::{CreateSegmentRequest, UpdateSegmentRequest};
use crate::inbound::http::user_segments::{
    HistoryReportResponse, SegmentAdditionRequest, UpdateUserSegmentsRequest,
};
use crate::inbound::http::users::UserRequest;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Segments backend API",
        description = "User segment membership with expiring assignments and a monthly audit history."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::rename_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::segments::create_segment,
        crate::inbound::http::segments::list_segments,
        crate::inbound::http::segments::get_segment,
        crate::inbound::http::segments::update_segment,
        crate::inbound::http::segments::delete_segment,
        crate::inbound::http::user_segments::update_user_segments,
        crate::inbound::http::user_segments::active_segments,
        crate::inbound::http::user_segments::segment_history,
        crate::inbound::http::reports::download_report,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        User,
        Segment,
        Error,
        ErrorCode,
        MembershipUpdateOutcome,
        UserRequest,
        CreateSegmentRequest,
        UpdateSegmentRequest,
        SegmentAdditionRequest,
        UpdateUserSegmentsRequest,
        HistoryReportResponse,
    )),
    tags(
        (name = "users", description = "User directory"),
        (name = "segments", description = "Segment catalogue"),
        (name = "memberships", description = "Segment assignment and history export"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn schema_has_field(doc: &utoipa::openapi::OpenApi, schema: &str, field: &str) -> bool {
        let schemas = &doc.components.as_ref().expect("components").schemas;
        match schemas.get(schema) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.contains_key(field),
            _ => false,
        }
    }

    #[rstest]
    #[case("/api/v1/users/{id}/segments")]
    #[case("/api/v1/users/{id}/segments/history")]
    #[case("/api/v1/segments/{slug}")]
    #[case("/reports/{file}")]
    #[case("/health/ready")]
    fn membership_routes_are_documented(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[rstest]
    #[case("Segment", "createdAt")]
    #[case("UpdateUserSegmentsRequest", "remove")]
    #[case("SegmentAdditionRequest", "expirationTime")]
    fn schemas_use_camel_case_fields(#[case] schema: &str, #[case] field: &str) {
        assert!(schema_has_field(&ApiDoc::openapi(), schema, field));
    }
}
