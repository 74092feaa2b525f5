//! Caller identity supplied by the upstream authentication layer.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::warn;

use super::ApiError;
use crate::db::UserId;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller, read from [`USER_ID_HEADER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        value
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<UserId>().ok())
            .filter(|id| *id > 0)
            .map(AuthUser)
            .ok_or_else(|| {
                warn!(header = ?value, "Invalid user id header");
                ApiError::unauthorized("Invalid user identity")
            })
    }
}
