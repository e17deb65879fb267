//! Request authentication.
//!
//! Login and session handling live in the gateway in front of this service;
//! requests arrive with the already-authenticated account id in a trusted
//! header. The middleware validates that header and injects an [`AuthUser`]
//! into request extensions, so every handler receives the principal as an
//! explicit value instead of digging through ambient request state.

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};

use crate::api::error::ApiError;

/// Header carrying the authenticated account id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated principal of the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i64);

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.0
    }
}

/// Rejects requests without a usable principal header.
pub async fn user_auth(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|id| *id > 0);

    match user_id {
        Some(id) => {
            request.extensions_mut().insert(AuthUser(id));
            Ok(next.run(request).await)
        }
        None => {
            tracing::warn!("Request rejected: missing or malformed {}", USER_ID_HEADER);
            Err(ApiError::unauthorized(format!(
                "missing or invalid {} header",
                USER_ID_HEADER
            )))
        }
    }
}
