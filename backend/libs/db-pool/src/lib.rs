//! Document database client management
//!
//! Provides unified MongoDB client creation and configuration for all services.
//! The client is created lazily on first use and then shared for the lifetime
//! of the process through [`LazyDatabase`].

mod env_utils;
mod metrics;

use env_utils::parse_env_with_default;

use metrics::{record_connect_attempt, ConnectOutcome};
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

/// Errors raised while building or reaching the database client
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("invalid database configuration: {0}")]
    Config(String),

    #[error("database connection failed: {0}")]
    Connect(#[from] mongodb::error::Error),

    #[error("database verification timed out after {0}s")]
    Timeout(u64),
}

/// Database client configuration
#[derive(Clone)]
pub struct DbConfig {
    /// Service name used as the driver app name and for metrics labeling
    pub service_name: String,
    /// MongoDB connection URL
    pub database_url: String,
    /// Database the service reads and writes
    pub database_name: String,
    /// Maximum number of pooled connections per server
    pub max_pool_size: u32,
    /// Minimum number of pooled connections per server
    pub min_pool_size: u32,
    /// Connection creation timeout
    pub connect_timeout_secs: u64,
    /// How long the driver waits for a suitable server
    pub server_selection_timeout_secs: u64,
    /// Close connections idle for longer than this
    pub max_idle_time_secs: u64,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("service_name", &self.service_name)
            .field("database_url", &"[REDACTED]")
            .field("database_name", &self.database_name)
            .field("max_pool_size", &self.max_pool_size)
            .field("min_pool_size", &self.min_pool_size)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field(
                "server_selection_timeout_secs",
                &self.server_selection_timeout_secs,
            )
            .field("max_idle_time_secs", &self.max_idle_time_secs)
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            service_name: String::from("unknown"),
            database_url: String::new(),
            database_name: String::from("blogdb"),
            max_pool_size: 20,
            min_pool_size: 2,
            connect_timeout_secs: 5,
            server_selection_timeout_secs: 10,
            max_idle_time_secs: 600,
        }
    }
}

impl DbConfig {
    /// Create a DbConfig for a service, falling back to the local compose URL
    pub fn for_service(service_name: &str) -> Self {
        let database_url = std::env::var("MONGODB_URL")
            .unwrap_or_else(|_| "mongodb://mongodb:27017".to_string());
        Self::with_url(service_name, database_url)
    }

    fn with_url(service_name: &str, database_url: String) -> Self {
        let defaults = Self::default();
        Self {
            service_name: service_name.to_string(),
            database_url,
            database_name: parse_env_with_default("MONGODB_DATABASE", defaults.database_name),
            max_pool_size: parse_env_with_default("DB_MAX_POOL_SIZE", defaults.max_pool_size),
            min_pool_size: parse_env_with_default("DB_MIN_POOL_SIZE", defaults.min_pool_size),
            connect_timeout_secs: parse_env_with_default(
                "DB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
            server_selection_timeout_secs: parse_env_with_default(
                "DB_SERVER_SELECTION_TIMEOUT_SECS",
                defaults.server_selection_timeout_secs,
            ),
            max_idle_time_secs: parse_env_with_default(
                "DB_MAX_IDLE_TIME_SECS",
                defaults.max_idle_time_secs,
            ),
        }
    }

    /// Reject configurations the driver would accept but behave badly with
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.database_url.trim().is_empty() {
            return Err(PoolError::Config("database_url is empty".to_string()));
        }
        if self.database_name.trim().is_empty() {
            return Err(PoolError::Config("database_name is empty".to_string()));
        }
        if self.min_pool_size > self.max_pool_size {
            return Err(PoolError::Config(format!(
                "min_pool_size ({}) exceeds max_pool_size ({})",
                self.min_pool_size, self.max_pool_size
            )));
        }
        Ok(())
    }

    /// Log client configuration details
    pub fn log_config(&self) {
        info!(
            "Database Client Configuration: \
             database={}, max_pool_size={}, min_pool_size={}, \
             connect_timeout={}s, server_selection_timeout={}s, max_idle_time={}s",
            self.database_name,
            self.max_pool_size,
            self.min_pool_size,
            self.connect_timeout_secs,
            self.server_selection_timeout_secs,
            self.max_idle_time_secs
        );
    }
}

/// Create a MongoDB client and verify it with a `ping`
pub async fn create_client(config: &DbConfig) -> Result<Client, PoolError> {
    config.validate()?;

    debug!(
        "Creating database client: service={}, max={}, min={}, connect_timeout={}s",
        config.service_name,
        config.max_pool_size,
        config.min_pool_size,
        config.connect_timeout_secs
    );

    let started = Instant::now();

    let mut options = ClientOptions::parse(&config.database_url).await?;
    options.app_name = Some(config.service_name.clone());
    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));
    options.max_idle_time = Some(Duration::from_secs(config.max_idle_time_secs));

    let client = Client::with_options(options)?;

    let database = client.database(&config.database_name);
    let ping = database.run_command(doc! { "ping": 1 }, None);

    match tokio::time::timeout(Duration::from_secs(config.connect_timeout_secs), ping).await {
        Ok(Ok(_)) => {
            record_connect_attempt(&config.service_name, ConnectOutcome::Success, started);
            info!(
                service = %config.service_name,
                "Database client created and verified successfully"
            );
            Ok(client)
        }
        Ok(Err(e)) => {
            record_connect_attempt(&config.service_name, ConnectOutcome::Error, started);
            error!(
                service = %config.service_name,
                error = %e,
                "Database connection verification failed"
            );
            Err(PoolError::Connect(e))
        }
        Err(_) => {
            record_connect_attempt(&config.service_name, ConnectOutcome::Timeout, started);
            error!(
                service = %config.service_name,
                timeout_secs = config.connect_timeout_secs,
                "Database connection verification timeout"
            );
            Err(PoolError::Timeout(config.connect_timeout_secs))
        }
    }
}

/// A database handle that connects on first use and is reused afterwards.
///
/// A failed connection attempt leaves the cell empty, so the next caller
/// retries the connection.
pub struct LazyDatabase {
    config: DbConfig,
    database: OnceCell<Database>,
}

impl LazyDatabase {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config,
            database: OnceCell::new(),
        }
    }

    /// Whether a connection has been established yet
    pub fn is_connected(&self) -> bool {
        self.database.initialized()
    }

    /// Get the database, connecting if this is the first call
    pub async fn get(&self) -> Result<&Database, PoolError> {
        self.database
            .get_or_try_init(|| async {
                let client = create_client(&self.config).await?;
                Ok::<_, PoolError>(client.database(&self.config.database_name))
            })
            .await
    }
}

impl fmt::Debug for LazyDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyDatabase")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}
