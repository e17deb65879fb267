//! API route modules.
//!
//! Organizes routes by resource type.

pub mod health;
pub mod mail;

use axum::{Router, middleware};

use crate::api::middleware::user_auth;
use crate::api::server::AppState;

/// Create the main API router with all routes.
///
/// Mail routes sit behind the user-identity middleware; the health probe
/// stays open.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/mail",
            mail::router().route_layer(middleware::from_fn(user_auth)),
        )
        .nest("/health", health::router())
        .with_state(state)
}
