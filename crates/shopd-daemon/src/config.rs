//! Environment-driven daemon configuration.
//!
//! The database URL is read separately by `shopd_db::connect_from_env`;
//! everything else lives here. A missing signing secret is fatal at startup.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use shopd_auth::DEFAULT_TOKEN_TTL_SECS;

pub const ENV_ADDR: &str = "SHOPD_ADDR";
pub const ENV_JWT_SECRET: &str = "SHOPD_JWT_SECRET";
pub const ENV_TOKEN_TTL: &str = "SHOPD_TOKEN_TTL_SECS";
pub const ENV_CORS_ORIGIN: &str = "SHOPD_CORS_ORIGIN";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    /// Extra allowed CORS origin (the deployed frontend). Localhost dev
    /// origins are always allowed.
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bind_addr = match std::env::var(ENV_ADDR) {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("invalid {ENV_ADDR}: {raw}"))?,
            Err(_) => SocketAddr::from(([127, 0, 0, 1], 5000)),
        };

        let jwt_secret =
            std::env::var(ENV_JWT_SECRET).with_context(|| format!("missing env var {ENV_JWT_SECRET}"))?;

        let token_ttl_secs = match std::env::var(ENV_TOKEN_TTL) {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("invalid {ENV_TOKEN_TTL}: {raw}"))?,
            Err(_) => DEFAULT_TOKEN_TTL_SECS,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl_secs,
            cors_origin: std::env::var(ENV_CORS_ORIGIN).ok(),
        })
    }
}
