//! Shared runtime state for shopd-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The state owns the
//! connection pool and the token keys; nothing here is request-scoped.

use shopd_auth::TokenKeys;
use sqlx::PgPool;

/// Static build metadata included in the health response.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub keys: TokenKeys,
    pub token_ttl_secs: i64,
    pub build: BuildInfo,
}

impl AppState {
    pub fn new(pool: PgPool, jwt_secret: &str, token_ttl_secs: i64) -> Self {
        Self {
            pool,
            keys: TokenKeys::new(jwt_secret.as_bytes()),
            token_ttl_secs,
            build: BuildInfo {
                service: "shopd-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }
}
