use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};

use festflow_auth::policy;
use festflow_infra::Authenticator;

use crate::app::errors;

pub const TOKEN_COOKIE: &str = "token";

/// Routes still reachable while the caller must replace a temporary password.
const PASSWORD_CHANGE_ALLOWED: &[&str] = &["/auth/me", "/auth/logout", "/auth/change-password"];

#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Authenticator,
}

/// Verify the session token and attach its claims to the request.
///
/// Handlers receive the claims as `Extension<SessionClaims>` and pass them on
/// explicitly.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_token(req.headers()) else {
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "authentication required",
        );
    };

    let claims = match state.authenticator.verify(token) {
        Ok(claims) => claims,
        Err(err) => return errors::service_error_to_response(err),
    };

    if policy::requires_password_change(&claims)
        && !PASSWORD_CHANGE_ALLOWED.contains(&req.uri().path())
    {
        return errors::service_error_to_response(festflow_infra::ServiceError::PasswordChangeRequired);
    }

    req.extensions_mut().insert(claims);
    next.run(req).await
}

/// Bearer header first, then the `token` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    extract_bearer(headers).or_else(|| extract_cookie(headers, TOKEN_COOKIE))
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(token: &str, max_age: chrono::Duration, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{TOKEN_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        max_age.num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// `Set-Cookie` value that removes the session token.
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("token=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}
