//! shopd-daemon entry point.
//!
//! This file is intentionally thin: it sets up tracing, loads config,
//! connects the pool and runs migrations, wires middleware, and starts the
//! HTTP server. All route handlers live in `routes.rs`; shared state lives
//! in `state.rs`.

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use shopd_daemon::{config::Config, routes, state::AppState};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist — production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let config = Config::from_env()?;

    // Failure to reach the datastore at startup is fatal; the process exits
    // with the connection error rather than serving requests it cannot handle.
    let pool = shopd_db::connect_from_env().await?;
    shopd_db::migrate(&pool).await?;

    let shared = Arc::new(AppState::new(pool, &config.jwt_secret, config.token_ttl_secs));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(config.cors_origin.as_deref()));

    info!("shopd-daemon listening on http://{}", config.bind_addr);

    axum::serve(
        tokio::net::TcpListener::bind(config.bind_addr).await?,
        app,
    )
    .await
    .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// CORS: localhost dev origins plus the configured frontend origin, with
/// the bearer header allowed on every verb the API uses.
fn cors_layer(extra_origin: Option<&str>) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ]
    .iter()
    .filter_map(|o| HeaderValue::from_str(o).ok())
    .collect();

    if let Some(origin) = extra_origin {
        if let Ok(value) = HeaderValue::from_str(origin) {
            origins.push(value);
        }
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
