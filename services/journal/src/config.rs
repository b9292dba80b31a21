//! Service configuration
//!
//! Loaded once at startup from built-in defaults, an optional
//! `journal.toml` in the working directory, and environment variables
//! (`ACCESS_TOKEN_SECRET`, `PORT`, `STORAGE_BACKEND`, ...). Nothing is
//! re-read at runtime.

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::jwt::DEFAULT_TOKEN_TTL_HOURS;

/// Where users and entries are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HS256 signing secret for access tokens
    pub access_token_secret: String,
    pub host: String,
    pub port: u16,
    pub storage_backend: StorageBackend,
    /// Prefix of every image URL handed to clients
    pub public_base_url: String,
    pub upload_dir: PathBuf,
    pub assets_dir: PathBuf,
    /// Request body limit for image uploads
    pub max_upload_bytes: usize,
    pub token_ttl_hours: i64,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000)?
            .set_default("storage_backend", "postgres")?
            .set_default("public_base_url", "http://localhost:8000")?
            .set_default("upload_dir", "uploads")?
            .set_default("assets_dir", "assets")?
            .set_default("max_upload_bytes", 10 * 1024 * 1024)?
            .set_default("token_ttl_hours", DEFAULT_TOKEN_TTL_HOURS)?
            .add_source(
                File::with_name("journal.toml")
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::default())
            .build()?;

        let settings: AppConfig = config.try_deserialize()?;

        if settings.access_token_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "ACCESS_TOKEN_SECRET must not be empty".to_string(),
            ));
        }
        if settings.token_ttl_hours <= 0 {
            return Err(ConfigError::Message(
                "TOKEN_TTL_HOURS must be positive".to_string(),
            ));
        }

        Ok(settings)
    }

    /// Socket address to listen on
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 5] = [
        "ACCESS_TOKEN_SECRET",
        "PORT",
        "STORAGE_BACKEND",
        "PUBLIC_BASE_URL",
        "TOKEN_TTL_HOURS",
    ];

    fn clear_env() {
        for key in KEYS {
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults_with_secret() {
        clear_env();
        unsafe {
            std::env::set_var("ACCESS_TOKEN_SECRET", "s3cret");
        }

        let config = AppConfig::load().unwrap();
        assert_eq!(config.access_token_secret, "s3cret");
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.storage_backend, StorageBackend::Postgres);
        assert_eq!(config.public_base_url, "http://localhost:8000");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.token_ttl_hours, 72);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        clear_env();
        unsafe {
            std::env::set_var("ACCESS_TOKEN_SECRET", "s3cret");
            std::env::set_var("PORT", "9100");
            std::env::set_var("STORAGE_BACKEND", "memory");
            std::env::set_var("PUBLIC_BASE_URL", "https://journal.example.com");
        }

        let config = AppConfig::load().unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.public_base_url, "https://journal.example.com");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_or_empty_secret_is_an_error() {
        clear_env();
        assert!(AppConfig::load().is_err());

        unsafe {
            std::env::set_var("ACCESS_TOKEN_SECRET", "  ");
        }
        assert!(AppConfig::load().is_err());

        clear_env();
    }
}
