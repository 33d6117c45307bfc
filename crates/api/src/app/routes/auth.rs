use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use festflow_auth::SessionClaims;
use festflow_infra::services::Session;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware;

pub fn public_router() -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/change-password", post(change_password))
}

/// 200 with the session body and a fresh token cookie.
fn session_response(services: &AppServices, session: Session) -> axum::response::Response {
    let mut response = (
        StatusCode::OK,
        Json(json!({
            "claims": session.claims,
            "token": session.token,
        })),
    )
        .into_response();

    match middleware::session_cookie(&session.token, services.cookie.max_age, services.cookie.secure) {
        Some(cookie) => {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
        None => tracing::warn!("session token is not a valid cookie value; cookie not set"),
    }
    response
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    dto::JsonBody(body): dto::JsonBody<dto::RegisterRequest>,
) -> axum::response::Response {
    match services
        .authenticator
        .register(body.name, body.email, body.password)
        .await
    {
        Ok(identity) => (StatusCode::CREATED, Json(dto::identity_to_json(&identity))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    dto::JsonBody(body): dto::JsonBody<dto::LoginRequest>,
) -> axum::response::Response {
    match services.authenticator.login(body.email, body.password).await {
        Ok(session) => session_response(&services, session),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn logout() -> axum::response::Response {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, middleware::clear_session_cookie())],
        Json(json!({ "loggedOut": true })),
    )
        .into_response()
}

pub async fn me(Extension(claims): Extension<SessionClaims>) -> axum::response::Response {
    (StatusCode::OK, Json(claims)).into_response()
}

pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<SessionClaims>,
    dto::JsonBody(body): dto::JsonBody<dto::ChangePasswordRequest>,
) -> axum::response::Response {
    match services
        .authenticator
        .change_password(
            &claims,
            body.current_password,
            body.new_password,
            body.confirm_password,
        )
        .await
    {
        Ok(session) => session_response(&services, session),
        Err(e) => errors::service_error_to_response(e),
    }
}
