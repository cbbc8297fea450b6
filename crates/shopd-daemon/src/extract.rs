//! Bearer-credential extractors.
//!
//! One authorization capability, parameterized by required role: `AuthUser`
//! accepts any valid principal, `AdminUser` additionally requires the admin
//! role. Handlers that take one of these never run for rejected requests,
//! so there is exactly one copy of the gate logic in the codebase.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use shopd_auth::{AuthError, Principal};

use crate::{error::ApiError, state::AppState};

/// Any authenticated principal.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Principal);

/// An authenticated principal whose role is admin.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub Principal);

/// Pull `Bearer <token>` out of the Authorization header and verify it.
/// Header absent or not bearer-shaped is the "authentication required"
/// case; a present-but-bad token is "invalid credential".
fn principal_from_parts(parts: &Parts, state: &AppState) -> Result<Principal, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredential)?;

    state.keys.verify(token)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let principal = principal_from_parts(parts, state)?;
        Ok(AuthUser(principal))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let principal = principal_from_parts(parts, state)?;
        principal.require_admin()?;
        Ok(AdminUser(principal))
    }
}
