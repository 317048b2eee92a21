//! League Admin Backend
//!
//! Cities, sports and leagues over SQLite, with a public landing view and a
//! role-gated admin dashboard.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod forms;
mod gateway;
mod models;
mod shell;
mod viewmodel;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::{IdentityClient, SessionKeys};
use config::Config;
use db::SqlGateway;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<SqlGateway>,
    pub identity: Arc<IdentityClient>,
    pub sessions: Arc<SessionKeys>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting League Admin Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let gateway = Arc::new(SqlGateway::new(pool));

    let identity = Arc::new(IdentityClient::new(
        config.identity_url.clone(),
        config.identity_secret_key.clone(),
    )?);
    let sessions = Arc::new(SessionKeys::new(config.session_secret.as_deref()));

    if !sessions.is_configured() {
        tracing::warn!(
            "No session secret configured (LEAGUES_SESSION_SECRET). Every session will be rejected!"
        );
    }
    if !identity.is_configured() {
        tracing::warn!(
            "No identity service configured (LEAGUES_IDENTITY_URL). The admin area is unreachable!"
        );
    }

    // Create application state
    let state = AppState {
        gateway,
        identity,
        sessions,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Public
        .route("/", get(api::landing))
        .route("/health", get(health_check))
        .route("/sign-in", get(api::sign_in))
        .route("/sign-up", get(api::sign_up))
        // Signed in
        .route("/api/leagues", get(api::list_leagues))
        // Admin
        .route("/admin", get(api::dashboard))
        .route("/admin/{tab}/new", post(api::submit_form))
        .route("/admin/api/{tab}", get(api::list_rows).post(api::create_row))
        .route(
            "/admin/api/{tab}/{id}",
            patch(api::update_row).delete(api::delete_row),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::access_gate,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
