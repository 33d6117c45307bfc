use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use festflow_auth::SessionClaims;
use festflow_core::ClubId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/superadmin/clubs", get(list_clubs).post(create_club))
        .route("/superadmin/clubs/:id/approve", post(approve_club))
        .route(
            "/superadmin/coordinators",
            get(list_coordinators).post(create_coordinator),
        )
}

pub async fn list_clubs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<SessionClaims>,
) -> axum::response::Response {
    match services.registry.list_clubs(&claims).await {
        Ok(items) => (StatusCode::OK, Json(json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_club(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<SessionClaims>,
    dto::JsonBody(body): dto::JsonBody<dto::CreateClubRequest>,
) -> axum::response::Response {
    match services
        .registry
        .create_club(&claims, body.name, body.description)
        .await
    {
        Ok(club) => (StatusCode::CREATED, Json(club)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn approve_club(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ClubId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.registry.approve_club(&claims, id).await {
        Ok(club) => (StatusCode::OK, Json(club)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_coordinators(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<SessionClaims>,
) -> axum::response::Response {
    match services.registry.list_coordinators(&claims).await {
        Ok(items) => (StatusCode::OK, Json(json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// The temporary password appears in this response only.
pub async fn create_coordinator(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<SessionClaims>,
    dto::JsonBody(body): dto::JsonBody<dto::CreateCoordinatorRequest>,
) -> axum::response::Response {
    let club_id: ClubId = match dto::parse_id(&body.club_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .registry
        .create_coordinator(&claims, body.name, body.email, club_id)
        .await
    {
        Ok(created) => (
            StatusCode::CREATED,
            Json(json!({
                "coordinator": dto::identity_to_json(&created.identity),
                "club": created.club,
                "temporaryPassword": created.temporary_password,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
