use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;

use festflow_auth::SessionClaims;
use festflow_core::{EventId, UserId};
use festflow_events::EventDraft;
use festflow_infra::services::Visible;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn public_router() -> Router {
    Router::new()
        .route("/events", get(list_public))
        .route("/events/:id", get(get_public))
}

pub fn router() -> Router {
    Router::new()
        .route("/events", post(create_event))
        .route("/events/mine", get(list_mine))
        .route("/events/:id", put(edit_event))
        .route("/events/:id/register", post(register))
        .route("/events/:id/check-in", post(check_in))
        .route("/events/:id/registrations", get(registrants))
}

pub async fn list_public(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListEventsQuery>,
) -> axum::response::Response {
    let listing = match query.into_listing() {
        Ok(l) => l,
        Err(resp) => return resp,
    };
    match services.lifecycle.list_public(listing).await {
        Ok(items) => (StatusCode::OK, Json(json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_public(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: EventId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.lifecycle.get_public(id).await {
        Ok(event) => (StatusCode::OK, Json(event)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<SessionClaims>,
    dto::JsonBody(draft): dto::JsonBody<EventDraft>,
) -> axum::response::Response {
    match services.lifecycle.create(&claims, draft).await {
        Ok(event) => (StatusCode::CREATED, Json(event)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_mine(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<SessionClaims>,
) -> axum::response::Response {
    match services.lifecycle.list_visible(Some(&claims)).await {
        Ok(Visible::Managed(items)) => (StatusCode::OK, Json(json!({ "items": items }))).into_response(),
        Ok(Visible::Public(items)) => (StatusCode::OK, Json(json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn edit_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<String>,
    dto::JsonBody(draft): dto::JsonBody<EventDraft>,
) -> axum::response::Response {
    let id: EventId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.lifecycle.edit(&claims, id, draft).await {
        Ok(event) => (StatusCode::OK, Json(event)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: EventId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.lifecycle.register(&claims, id).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "registered": true, "eventId": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn check_in(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<String>,
    dto::JsonBody(body): dto::JsonBody<dto::CheckInRequest>,
) -> axum::response::Response {
    let id: EventId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let user_id: UserId = match dto::parse_id(&body.user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.lifecycle.check_in(&claims, id, user_id).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "checkedIn": true, "userId": user_id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn registrants(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<SessionClaims>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: EventId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.lifecycle.registrants(&claims, id).await {
        Ok(items) => (StatusCode::OK, Json(json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
