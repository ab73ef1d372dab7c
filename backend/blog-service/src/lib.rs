/// Blog Service Library
///
/// REST backend for users, posts, comments and like/view counters stored in
/// a document database.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route registration
/// - `validation`: Schema-as-data request validation and format rules
/// - `services`: Business logic layer
/// - `db`: Document store abstraction, pagination engine and accessors
/// - `models`: Stored documents and request payloads
/// - `middleware`: Request metrics middleware
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod limits;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod validation;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
