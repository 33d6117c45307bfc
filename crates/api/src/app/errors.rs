use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde_json::json;

use festflow_infra::ServiceError;

use crate::middleware;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        ServiceError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        ServiceError::DuplicateEmail => json_error(StatusCode::CONFLICT, "duplicate_email", message),
        ServiceError::DuplicateClubName => {
            json_error(StatusCode::CONFLICT, "duplicate_club_name", message)
        }
        ServiceError::SuperAdminExists => {
            json_error(StatusCode::CONFLICT, "super_admin_exists", message)
        }
        ServiceError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", message)
        }
        ServiceError::InvalidOrExpiredToken => {
            let mut response = json_error(StatusCode::UNAUTHORIZED, "invalid_token", message);
            response
                .headers_mut()
                .insert(header::SET_COOKIE, middleware::clear_session_cookie());
            response
        }
        ServiceError::Forbidden(_) => json_error(StatusCode::FORBIDDEN, "forbidden", message),
        ServiceError::PasswordChangeRequired => json_error(
            StatusCode::FORBIDDEN,
            "password_change_required",
            "change your temporary password first",
        ),
        ServiceError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        ServiceError::AlreadyRegistered => {
            json_error(StatusCode::CONFLICT, "already_registered", message)
        }
        ServiceError::AlreadyCheckedIn => {
            json_error(StatusCode::CONFLICT, "already_checked_in", message)
        }
        ServiceError::NotRegistered => json_error(StatusCode::BAD_REQUEST, "not_registered", message),
        ServiceError::DeadlinePassed => json_error(StatusCode::BAD_REQUEST, "deadline_passed", message),
        ServiceError::SeatsExhausted => json_error(StatusCode::CONFLICT, "seats_exhausted", message),
        ServiceError::ClubRequired => json_error(StatusCode::BAD_REQUEST, "club_required", message),
        ServiceError::WrongCurrentPassword => {
            json_error(StatusCode::BAD_REQUEST, "wrong_current_password", message)
        }
        ServiceError::PasswordMismatch => {
            json_error(StatusCode::BAD_REQUEST, "password_mismatch", message)
        }
        ServiceError::Server(detail) => {
            tracing::error!(error = %detail, "request failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "server_error", "Server error")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
