// src/main.rs
use axum::{extract::Extension, middleware, routing::get, Json, Router};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::env;
use std::path::PathBuf;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod auth;
mod common;
mod cvs;
mod logging_middleware;
mod profile;
mod providers;
mod services;
mod settings;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use common::AppState;
use services::{
    ApiKeyService, CvRenderer, EncryptionService, LlmService, OptimizeQueue, Optimizer, PdfService,
};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://mycv_api.db".to_string());
    // One secret signs tokens and derives the credential encryption key
    let app_secret =
        env::var("APP_SECRET_KEY").unwrap_or_else(|_| "replace_with_strong_secret".to_string());
    let optimize_workers = env::var("OPTIMIZE_WORKERS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(2);
    let optimize_queue_capacity = env::var("OPTIMIZE_QUEUE_CAPACITY")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(32);

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    // Run database migrations
    common::migrations::run_migrations(&pool).await?;

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let encryption = EncryptionService::from_secret(&app_secret);
    let keys_service = Arc::new(ApiKeyService::new(pool.clone(), encryption));
    info!("ApiKeyService initialized");

    let renderer = Arc::new(CvRenderer::new());
    info!("CvRenderer initialized");

    let pdf_service = Arc::new(PdfService::new());
    info!("PdfService initialized");

    let optimizer = Arc::new(Optimizer::new(LlmService::new()));
    let optimize_queue = OptimizeQueue::start(
        pool.clone(),
        optimizer,
        optimize_workers,
        optimize_queue_capacity,
    );
    info!(
        workers = optimize_workers,
        capacity = optimize_queue_capacity,
        "Optimization queue started"
    );

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let app_state = AppState {
        db: pool,
        jwt_secret: app_secret,
        keys_service,
        renderer,
        pdf_service,
        optimize_queue,
    };

    let shared = Arc::new(RwLock::new(app_state));

    // ========================================================================
    // ROUTER COMPOSITION
    // ========================================================================

    let app = Router::new()
        // ====================================================================
        // AUTHENTICATION ROUTES
        // ====================================================================
        .merge(auth::auth_routes())
        // ====================================================================
        // PROFILE ROUTES (Personal data, base CV content, preview)
        // ====================================================================
        .merge(profile::profile_routes())
        // ====================================================================
        // CV ROUTES (Creation, status polling, PDF download)
        // ====================================================================
        .merge(cvs::cv_routes())
        // ====================================================================
        // SETTINGS AND PROVIDER ROUTES
        // ====================================================================
        .merge(settings::settings_routes())
        .merge(providers::provider_routes())
        // ====================================================================
        // HEALTH CHECK
        // ====================================================================
        .route("/health", get(health))
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(Extension(shared.clone()))
        .layer({
            let cors_origins = std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());

            let origins: Vec<axum::http::HeaderValue> = cors_origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::AUTHORIZATION,
                ])
                .allow_credentials(true)
        })
        .layer(TraceLayer::new_for_http());

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "myCv Backend API"
    }))
}
