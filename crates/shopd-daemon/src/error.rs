//! API error taxonomy and its mapping onto HTTP responses.
//!
//! Every failure a handler can produce is one of these variants; the
//! `IntoResponse` impl renders the uniform `{"message": "..."}` JSON body.
//! Datastore faults are logged server-side and collapse to a generic 500
//! so internals never leak to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shopd_auth::AuthError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No bearer credential on a protected route.
    #[error("Authentication required")]
    AuthRequired,

    /// Malformed, tampered or expired credential.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Valid credential, insufficient role. Always 403, never 401.
    #[error("Admin access required")]
    Forbidden,

    /// Login failed. Email-not-found and wrong-password are deliberately
    /// indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// User-side order transition refused (status was not `pending`).
    #[error("Only pending orders can be cancelled")]
    InvalidTransition,

    #[error("Server error")]
    Db(#[from] sqlx::Error),

    #[error("Server error")]
    Hash(#[from] bcrypt::BcryptError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthRequired | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::InvalidCredentials
            | ApiError::DuplicateEmail
            | ApiError::Validation(_)
            | ApiError::InvalidTransition => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            ApiError::Db(_) | ApiError::Hash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingCredential => ApiError::AuthRequired,
            AuthError::InvalidCredential => ApiError::InvalidToken,
            AuthError::InsufficientRole => ApiError::Forbidden,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, detail = ?self, "request failed");
        }

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// Map an insert error onto the duplicate-email response when the unique
/// constraint on `users.email` fired; pass everything else through.
pub fn map_unique_email(e: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return ApiError::DuplicateEmail;
        }
    }
    ApiError::Db(e)
}
