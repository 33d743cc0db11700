//! User directory handlers.
//!
//! ```text
//! POST   /api/v1/users        {"name":"Ada"}
//! GET    /api/v1/users
//! GET    /api/v1/users/{id}
//! PUT    /api/v1/users/{id}   {"name":"Ada Lovelace"}
//! DELETE /api/v1/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_user_id, parse_user_name};

/// Body for creating or renaming a user.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<UserRequest>,
) -> ApiResult<HttpResponse> {
    let name = parse_user_name(payload.into_inner().name)?;
    let user = state.users.create_user(name).await?;
    Ok(HttpResponse::Created().json(user))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Users ordered by id", body = [User]),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<User>>> {
    Ok(web::Json(state.users.list_users().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 400, description = "Invalid id", body = Error),
        (status = 404, description = "No such user", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<web::Json<User>> {
    let id = parse_user_id(path.into_inner())?;
    Ok(web::Json(state.users.get_user(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "Renamed user", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "No such user", body = Error)
    ),
    tags = ["users"],
    operation_id = "renameUser"
)]
#[put("/users/{id}")]
pub async fn rename_user(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
    payload: web::Json<UserRequest>,
) -> ApiResult<web::Json<User>> {
    let id = parse_user_id(path.into_inner())?;
    let name = parse_user_name(payload.into_inner().name)?;
    Ok(web::Json(state.users.rename_user(id, name).await?))
}

/// Delete a user together with their memberships and history.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "No such user", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(path.into_inner())?;
    state.users.delete_user(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    use crate::inbound::http::test_utils::{harness, test_app};

    #[actix_web::test]
    async fn create_then_fetch_round_trips_over_http() {
        let harness = harness();
        let app = actix_test::init_service(test_app(harness.state.clone())).await;

        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/users")
                .set_json(json!({ "name": "Ada" }))
                .to_request(),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let created: Value = actix_test::read_body_json(created).await;
        assert_eq!(created["id"], 1);
        assert_eq!(created["name"], "Ada");
        assert_eq!(created["createdAt"], "2025-03-10T08:00:00Z");

        let fetched: Value = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get().uri("/api/v1/users/1").to_request(),
        )
        .await;
        assert_eq!(fetched, created);
    }

    #[rstest]
    #[case(json!({ "name": "" }))]
    #[case(json!({ "name": " padded " }))]
    #[actix_web::test]
    async fn invalid_names_are_rejected(#[case] body: Value) {
        let app = actix_test::init_service(test_app(harness().state)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/users")
                .set_json(body)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], "name");
    }

    #[rstest]
    #[case(actix_test::TestRequest::get().uri("/api/v1/users/9"), StatusCode::NOT_FOUND)]
    #[case(actix_test::TestRequest::delete().uri("/api/v1/users/9"), StatusCode::NOT_FOUND)]
    #[case(actix_test::TestRequest::get().uri("/api/v1/users/0"), StatusCode::BAD_REQUEST)]
    #[case(actix_test::TestRequest::get().uri("/api/v1/users/abc"), StatusCode::BAD_REQUEST)]
    #[actix_web::test]
    async fn missing_and_malformed_ids(
        #[case] request: actix_test::TestRequest,
        #[case] expected: StatusCode,
    ) {
        let app = actix_test::init_service(test_app(harness().state)).await;
        let res = actix_test::call_service(&app, request.to_request()).await;
        assert_eq!(res.status(), expected);
    }

    #[actix_web::test]
    async fn rename_and_delete() {
        let harness = harness();
        let app = actix_test::init_service(test_app(harness.state.clone())).await;
        actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/users")
                .set_json(json!({ "name": "Ada" }))
                .to_request(),
        )
        .await;

        let renamed: Value = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::put()
                .uri("/api/v1/users/1")
                .set_json(json!({ "name": "Ada Lovelace" }))
                .to_request(),
        )
        .await;
        assert_eq!(renamed["name"], "Ada Lovelace");

        let deleted = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete().uri("/api/v1/users/1").to_request(),
        )
        .await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let listed: Value = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get().uri("/api/v1/users").to_request(),
        )
        .await;
        assert_eq!(listed, json!([]));
    }
}
