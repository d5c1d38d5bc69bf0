//! Configuration module for the Spoonful backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Placeholder cover used whenever the photo service cannot supply one.
pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/600x400";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Static client key expected from the mobile app (optional)
    pub app_key: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Directory holding ingredients.txt and categories.txt
    pub assets_dir: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
    /// Unsplash access key; photo lookups fall back to the placeholder without it
    pub unsplash_access_key: Option<String>,
    /// Unsplash API base URL
    pub unsplash_api_url: String,
    /// Cover image used when no photo could be found
    pub placeholder_image: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let app_key = env::var("SPOONFUL_APP_KEY").ok().filter(|k| !k.is_empty());

        let db_path = env::var("SPOONFUL_DB_PATH")
            .unwrap_or_else(|_| "./data/spoonful.sqlite".to_string())
            .into();

        let assets_dir = env::var("SPOONFUL_ASSETS_DIR")
            .unwrap_or_else(|_| "./assets".to_string())
            .into();

        let raw_bind_addr =
            env::var("SPOONFUL_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = raw_bind_addr.parse().map_err(|_| {
            AppError::Validation(format!(
                "Invalid SPOONFUL_BIND_ADDR format: {}",
                raw_bind_addr
            ))
        })?;

        let log_level = env::var("SPOONFUL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = env::var("SPOONFUL_LOG_JSON")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let unsplash_access_key = env::var("UNSPLASH_ACCESS_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        let unsplash_api_url = env::var("UNSPLASH_API_URL")
            .unwrap_or_else(|_| "https://api.unsplash.com".to_string());

        let placeholder_image = env::var("SPOONFUL_PLACEHOLDER_IMAGE")
            .unwrap_or_else(|_| DEFAULT_PLACEHOLDER_IMAGE.to_string());

        Ok(Self {
            app_key,
            db_path,
            assets_dir,
            bind_addr,
            log_level,
            log_json,
            unsplash_access_key,
            unsplash_api_url,
            placeholder_image,
        })
    }
}
