use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use workshop::config::AppConfig;
use workshop::db;
use workshop::routes;
use workshop::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    anyhow::ensure!(!config.jwt_secret.is_empty(), "JWT_SECRET must be set");

    let conn = db::init_db(&config.database_url)?;
    tracing::info!(database = %config.database_url, "database ready");

    let cors = match &config.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(Any),
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::new(conn, config));

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
