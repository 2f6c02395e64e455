//! Configuration Module
//!
//! Centralized configuration for the movie service: server, storage, token
//! signing, image host, cache and rate limiting settings, all read from the
//! environment.

use std::time::Duration;

use thiserror::Error;

/// Environment variable helpers
pub mod env {
    use std::env;

    /// Get environment variable as string with default
    pub fn get_string(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get environment variable as optional non-empty string
    pub fn get_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    /// Get environment variable as u32 with default
    pub fn get_u32(key: &str, default: u32) -> u32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u16 with default
    pub fn get_u16(key: &str, default: u16) -> u16 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u64 with default
    pub fn get_u64(key: &str, default: u64) -> u64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as usize with default
    pub fn get_usize(key: &str, default: usize) -> usize {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as i64 with default
    pub fn get_i64(key: &str, default: i64) -> i64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Check if environment variable is set
    pub fn is_set(key: &str) -> bool {
        env::var(key).is_ok()
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {value} - {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for crate::utils::error::AppError {
    fn from(err: ConfigError) -> Self {
        crate::utils::error::AppError::Configuration(err.to_string())
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    env::get_optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Application configuration combining all service configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageBackend,
    /// Present when `storage` is PostgreSQL
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    /// Present when Cloudinary credentials are configured
    pub cloudinary: Option<CloudinaryConfig>,
    pub upload: UploadConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_prefix: String,
    pub cors_origins: Vec<String>,
}

/// Where users and movies are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
}

/// Bearer token configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_hours: i64,
    pub bcrypt_cost: u32,
}

/// Cloudinary credentials and upload policy
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
    pub folder: String,
}

/// Poster upload limits
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

/// Result cache policy
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub movie_ttl: Duration,
    pub list_ttl: Duration,
    pub max_entries: usize,
}

/// Fixed-window request throttling
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

/// Default poster size cap (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Longest accepted token lifetime (one year)
pub const MAX_JWT_EXPIRES_HOURS: i64 = 24 * 365;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::get_string("SERVER_HOST", "0.0.0.0"),
            port: env::get_u16("SERVER_PORT", 8080),
            api_prefix: env::get_string("API_PREFIX", "/api"),
            cors_origins: env::get_string("CORS_ORIGINS", "http://localhost:3000")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: env::get_usize("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            movie_ttl: Duration::from_secs(env::get_u64("CACHE_MOVIE_TTL_SECONDS", 300)),
            list_ttl: Duration::from_secs(env::get_u64("CACHE_LIST_TTL_SECONDS", 120)),
            max_entries: env::get_usize("CACHE_MAX_ENTRIES", 1000),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: env::get_u32("RATE_LIMIT_MAX_REQUESTS", 100),
            window: Duration::from_secs(env::get_u64("RATE_LIMIT_WINDOW_SECONDS", 60)),
        }
    }
}

impl StorageBackend {
    pub fn from_env() -> Result<Self, ConfigError> {
        let value = env::get_string("STORAGE_BACKEND", "postgres");
        match value.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::InvalidValue {
                key: "STORAGE_BACKEND".to_string(),
                value,
                reason: "expected 'postgres' or 'memory'".to_string(),
            }),
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: required("DATABASE_URL")?,
            max_connections: env::get_u32("DB_MAX_CONNECTIONS", 10),
            min_connections: env::get_u32("DB_MIN_CONNECTIONS", 1),
            connect_timeout_seconds: env::get_u64("DB_CONNECT_TIMEOUT", 10),
            idle_timeout_seconds: env::get_u64("DB_IDLE_TIMEOUT", 600),
            max_lifetime_seconds: env::get_u64("DB_MAX_LIFETIME", 3600),
        })
    }
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: required("JWT_SECRET")?,
            expires_hours: env::get_i64("JWT_EXPIRES_HOURS", 24),
            bcrypt_cost: env::get_u32("BCRYPT_COST", crate::utils::DEFAULT_BCRYPT_COST),
        })
    }
}

impl CloudinaryConfig {
    /// Returns `None` when no cloud name is configured
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        if !env::is_set("CLOUDINARY_CLOUD_NAME") {
            return Ok(None);
        }

        Ok(Some(Self {
            cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
            api_key: required("CLOUDINARY_API_KEY")?,
            api_secret: required("CLOUDINARY_API_SECRET")?,
            api_base: env::get_string("CLOUDINARY_API_BASE", "https://api.cloudinary.com"),
            folder: env::get_string("CLOUDINARY_FOLDER", "movies"),
        }))
    }
}

impl AppConfig {
    /// Load complete application configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage = StorageBackend::from_env()?;
        let database = match storage {
            StorageBackend::Postgres => Some(DatabaseConfig::from_env()?),
            StorageBackend::Memory => None,
        };

        Ok(Self {
            server: ServerConfig::default(),
            storage,
            database,
            jwt: JwtConfig::from_env()?,
            cloudinary: CloudinaryConfig::from_env()?,
            upload: UploadConfig::default(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
        })
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".into(),
            ));
        }

        if !self.server.api_prefix.is_empty() && !self.server.api_prefix.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "API prefix must start with '/'".into(),
            ));
        }

        if let Some(database) = &self.database {
            if database.max_connections == 0 {
                return Err(ConfigError::ValidationError(
                    "Database max_connections must be greater than 0".into(),
                ));
            }

            if database.min_connections > database.max_connections {
                return Err(ConfigError::ValidationError(
                    "Database min_connections cannot be greater than max_connections".into(),
                ));
            }
        }

        if self.jwt.secret.len() < 16 {
            return Err(ConfigError::ValidationError(
                "JWT secret must be at least 16 characters".into(),
            ));
        }

        if !(1..=MAX_JWT_EXPIRES_HOURS).contains(&self.jwt.expires_hours) {
            return Err(ConfigError::ValidationError(format!(
                "JWT_EXPIRES_HOURS must be between 1 and {}",
                MAX_JWT_EXPIRES_HOURS
            )));
        }

        if !(4..=31).contains(&self.jwt.bcrypt_cost) {
            return Err(ConfigError::ValidationError(
                "BCRYPT_COST must be between 4 and 31".into(),
            ));
        }

        if self.upload.max_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_BYTES must be greater than 0".into(),
            ));
        }

        if self.cache.max_entries == 0 {
            return Err(ConfigError::ValidationError(
                "CACHE_MAX_ENTRIES must be greater than 0".into(),
            ));
        }

        if self.rate_limit.max_requests == 0 || self.rate_limit.window.is_zero() {
            return Err(ConfigError::ValidationError(
                "Rate limit requests and window must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                api_prefix: "/api".to_string(),
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
            storage: StorageBackend::Memory,
            database: None,
            jwt: JwtConfig {
                secret: "a-test-secret-of-some-length".to_string(),
                expires_hours: 24,
                bcrypt_cost: 10,
            },
            cloudinary: None,
            upload: UploadConfig {
                max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            cache: CacheConfig {
                movie_ttl: Duration::from_secs(300),
                list_ttl: Duration::from_secs(120),
                max_entries: 1000,
            },
            rate_limit: RateLimitConfig {
                max_requests: 100,
                window: Duration::from_secs(60),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = test_config();
        config.jwt.secret = "short".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_jwt_expiry_bounds() {
        let mut config = test_config();
        config.jwt.expires_hours = 0;
        assert!(config.validate().is_err());

        config.jwt.expires_hours = i64::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        config.jwt.expires_hours = MAX_JWT_EXPIRES_HOURS + 1;
        assert!(config.validate().is_err());

        config.jwt.expires_hours = MAX_JWT_EXPIRES_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_prefix_must_be_absolute() {
        let mut config = test_config();
        config.server.api_prefix = "api".to_string();
        assert!(config.validate().is_err());

        config.server.api_prefix = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_pool_bounds() {
        let mut config = test_config();
        config.database = Some(DatabaseConfig {
            url: "postgres://localhost/movies".to_string(),
            max_connections: 2,
            min_connections: 5,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600,
            max_lifetime_seconds: 3600,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_error_maps_to_server_error() {
        let err: crate::utils::error::AppError =
            ConfigError::MissingEnvVar("JWT_SECRET".to_string()).into();
        assert_eq!(
            err.status_code(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_env_helpers() {
        assert_eq!(env::get_u32("MOVIE_SERVICE_NONEXISTENT_U32", 42), 42);
        assert_eq!(
            env::get_string("MOVIE_SERVICE_NONEXISTENT_STRING", "default"),
            "default"
        );
        assert_eq!(env::get_optional("MOVIE_SERVICE_NONEXISTENT_OPTIONAL"), None);
        assert!(!env::is_set("MOVIE_SERVICE_NONEXISTENT_FLAG"));
    }
}
