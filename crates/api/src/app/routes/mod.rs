use axum::Router;

pub mod auth;
pub mod events;
pub mod superadmin;
pub mod system;

/// Endpoints reachable without a session.
pub fn public_router() -> Router {
    Router::new()
        .merge(auth::public_router())
        .merge(events::public_router())
}

/// Endpoints that require a verified session (claims in request extensions).
pub fn router() -> Router {
    Router::new()
        .merge(auth::router())
        .merge(events::router())
        .merge(superadmin::router())
}
