/// HTTP handlers for blog endpoints
///
/// This module contains handlers for:
/// - Users: Registration, profile edits, lookups, username availability
/// - Posts: Authoring, listings, likes
/// - Comments: Comments on posts, likes
/// - Counters: View/rating facts
///
/// Every handler merges path params and body into one candidate, validates it
/// against the route schema, then delegates to the matching service.
pub mod comments;
pub mod counters;
pub mod health;
pub mod posts;
pub mod users;

use crate::error::{AppError, Result};
use crate::limits::MAX_PAGE;
use crate::state::AppState;
use crate::validation::{validate_into, Schema};
use actix_web::{web, HttpRequest};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

/// `?page=N`, zero-based
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u64,
}

impl PageQuery {
    /// The requested page, rejected when its skip offset would not fit the store
    pub fn checked(&self) -> Result<u64> {
        if self.page > MAX_PAGE {
            return Err(AppError::BadRequest(format!(
                "page must be at most {}",
                MAX_PAGE
            )));
        }
        Ok(self.page)
    }
}

/// Body fields overlaid with path params; path params win.
/// A non-object body is passed through so the schema rejects it.
fn candidate(req: &HttpRequest, body: Option<Value>) -> Value {
    let mut merged = match body {
        Some(Value::Object(fields)) => fields,
        Some(Value::Null) | None => Map::new(),
        Some(other) => return other,
    };

    for (name, value) in req.match_info().iter() {
        merged.insert(name.to_string(), Value::String(value.to_string()));
    }
    Value::Object(merged)
}

pub(crate) fn validated<T: DeserializeOwned>(
    state: &AppState,
    schema: &Schema,
    req: &HttpRequest,
    body: Option<Value>,
) -> Result<T> {
    validate_into(schema, &candidate(req, body), state.validate).map_err(|err| {
        if let AppError::Validation(schema_error) = &err {
            tracing::debug!(
                path = %req.path(),
                field = %schema_error.field,
                code = %schema_error.code,
                "request failed validation"
            );
        }
        err
    })
}

/// Register the operational routes and every `/api` route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .configure(health::configure)
        .service(
            web::scope("/api")
                .configure(users::configure)
                .configure(posts::configure)
                .configure(comments::configure)
                .configure(counters::configure),
        );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}
