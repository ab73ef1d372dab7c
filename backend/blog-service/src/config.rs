/// Configuration management for Blog Service
///
/// This module handles loading and managing configuration from environment variables.
/// Store-client settings (URL, database, pool sizes, timeouts) are owned by the
/// shared `db-pool` library.
use db_pool::DbConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const SERVICE_NAME: &str = "blog-service";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Request validation settings
    pub validation: ValidationConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Which document store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    MongoDb,
    /// Process-local, lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreBackend::MongoDb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown DATABASE_BACKEND '{}'", other)),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    /// MongoDB client settings
    pub db: DbConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Report only the first failing field
    pub abort_early: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let backend = match std::env::var("DATABASE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::MongoDb,
        };
        if production && backend == StoreBackend::Memory {
            return Err("DATABASE_BACKEND=memory is not allowed in production".to_string());
        }

        let db = DbConfig::for_service(SERVICE_NAME);
        db.validate().map_err(|e| e.to_string())?;

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("BLOG_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("BLOG_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig { backend, db },
            validation: ValidationConfig {
                abort_early: parse_bool_or_default("VALIDATION_ABORT_EARLY", true)?,
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}

fn parse_bool_or_default(key: &str, default: bool) -> Result<bool, String> {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(format!("Failed to parse {}='{}' as a boolean", key, val)),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "APP_ENV",
        "BLOG_SERVICE_HOST",
        "BLOG_SERVICE_PORT",
        "CORS_ALLOWED_ORIGINS",
        "DATABASE_BACKEND",
        "VALIDATION_ABORT_EARLY",
        "MONGODB_URL",
        "MONGODB_DATABASE",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_for_development() {
        clear_env();
        let config = Config::from_env().unwrap();

        assert_eq!(config.app.port, 8080);
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.database.backend, StoreBackend::MongoDb);
        assert_eq!(config.database.db.database_name, "blogdb");
        assert!(config.validation.abort_early);
        assert!(!config.is_production());
    }

    #[test]
    #[serial]
    fn production_requires_explicit_cors() {
        clear_env();
        std::env::set_var("APP_ENV", "production");
        assert!(Config::from_env().is_err());

        std::env::set_var("CORS_ALLOWED_ORIGINS", "*");
        assert!(Config::from_env().is_err());

        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://blog.example.com");
        assert!(Config::from_env().is_ok());
        clear_env();
    }

    #[test]
    #[serial]
    fn backend_and_validation_overrides() {
        clear_env();
        std::env::set_var("DATABASE_BACKEND", "memory");
        std::env::set_var("VALIDATION_ABORT_EARLY", "false");

        let config = Config::from_env().unwrap();
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert!(!config.validation.abort_early);

        std::env::set_var("DATABASE_BACKEND", "postgres");
        assert!(Config::from_env().is_err());
        clear_env();
    }
}
