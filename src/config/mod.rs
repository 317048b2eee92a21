//! Configuration module for the league admin backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// HMAC secret the identity provider signs session tokens with
    pub session_secret: Option<String>,
    /// Base URL of the identity provider's user API
    pub identity_url: Option<String>,
    /// Secret key sent as a bearer token to the identity provider
    pub identity_secret_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("LEAGUES_DB_PATH")
            .unwrap_or_else(|_| "./data/leagues.sqlite".to_string())
            .into();

        let bind_addr = env::var("LEAGUES_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid LEAGUES_BIND_ADDR: {}", e)))?;

        let log_level = env::var("LEAGUES_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let session_secret = env::var("LEAGUES_SESSION_SECRET").ok();
        let identity_url = env::var("LEAGUES_IDENTITY_URL")
            .ok()
            .map(|url| url.trim_end_matches('/').to_string());
        let identity_secret_key = env::var("LEAGUES_IDENTITY_SECRET_KEY").ok();

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            session_secret,
            identity_url,
            identity_secret_key,
        })
    }
}
