use axum::{
    Json, async_trait,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use festflow_auth::Identity;
use festflow_events::{FestType, ListingView, PublicListing};

use crate::app::errors;

// -------------------------
// Body extractor
// -------------------------

/// `Json<T>` whose rejections (bad syntax, wrong types, missing content type)
/// answer `400 validation_error` like every other input failure.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = axum::response::Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                rejection.body_text(),
            )),
        }
    }
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub user_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateClubRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCoordinatorRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub club_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    pub fest_type: Option<String>,
    pub club_name: Option<String>,
    pub view: Option<String>,
}

impl ListEventsQuery {
    pub fn into_listing(self) -> Result<PublicListing, axum::response::Response> {
        let fest_type = match self.fest_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<FestType>().map_err(|e| {
                errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
            })?),
        };

        Ok(PublicListing {
            fest_type,
            club_name: self.club_name,
            view: ListingView::parse_lenient(self.view.as_deref()),
        })
    }
}

// -------------------------
// Parsing / mapping helpers
// -------------------------

/// Parse a path or body identifier, answering 400 on failure.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: core::str::FromStr,
    T::Err: ToString,
{
    raw.parse::<T>()
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

pub fn identity_to_json(identity: &Identity) -> Value {
    json!({
        "id": identity.id.to_string(),
        "name": identity.name,
        "email": identity.email,
        "role": identity.role.as_str(),
        "clubId": identity.club_id.map(|c| c.to_string()),
        "mustChangePassword": identity.must_change_password,
        "createdAt": identity.created_at.to_rfc3339(),
    })
}
