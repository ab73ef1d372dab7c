//! Shared request context.

use crate::db::{DocumentStore, InMemoryStore, MongoStore};
use crate::config::{Config, StoreBackend};
use crate::validation::ValidateOptions;
use std::sync::Arc;

/// Everything a handler needs, injected through `web::Data<AppState>`
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub validate: ValidateOptions,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, validate: ValidateOptions) -> Self {
        Self { store, validate }
    }

    /// Build the configured store. MongoDB connects lazily on first use.
    pub fn from_config(config: &Config) -> Self {
        let store: Arc<dyn DocumentStore> = match config.database.backend {
            StoreBackend::MongoDb => {
                config.database.db.log_config();
                Arc::new(MongoStore::new(config.database.db.clone()))
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                Arc::new(InMemoryStore::new())
            }
        };

        Self::new(
            store,
            ValidateOptions {
                abort_early: config.validation.abort_early,
            },
        )
    }

    /// In-memory state with default validation, for tests and local runs
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()), ValidateOptions::default())
    }
}
