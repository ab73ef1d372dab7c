/// Database access layer
///
/// This module provides:
/// - The [`DocumentStore`] seam every accessor talks to
/// - A MongoDB implementation backed by the shared `db-pool` client
/// - An in-memory implementation for tests and local development
/// - The pagination engine and the per-collection accessors
use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub mod comment_repo;
pub mod counter_repo;
pub mod memory;
pub mod mongo;
pub mod pagination;
pub mod post_repo;
pub mod user_repo;

pub use memory::InMemoryStore;
pub use mongo::MongoStore;

pub const USERS: &str = "users";
pub const POSTS: &str = "posts";
pub const COMMENTS: &str = "comments";
pub const COUNTERS: &str = "counters";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[from] db_pool::PoolError),

    #[error("driver error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// A write collided with a unique index
    #[error("duplicate value for {collection}.{field}")]
    DuplicateKey { collection: String, field: String },

    #[error("failed to decode document: {0}")]
    Decode(#[from] mongodb::bson::de::Error),

    #[error("failed to encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("malformed store request: {0}")]
    Malformed(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Minimal document-store surface used by the service.
///
/// Filters are equality documents, updates are `$set` field maps and
/// aggregation pipelines use the stages emitted by [`pagination`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document and return its `_id`
    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<Bson>;

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> StoreResult<Option<Document>>;

    /// Apply `$set: fields` to the first match. Returns the matched count.
    async fn update_one(&self, collection: &str, filter: Document, fields: Document)
        -> StoreResult<u64>;

    /// Returns the deleted count
    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<u64>;

    async fn aggregate(&self, collection: &str, pipeline: Vec<Document>)
        -> StoreResult<Vec<Document>>;

    async fn ping(&self) -> StoreResult<()>;

    /// Idempotently declare `field` unique within `collection`
    async fn ensure_unique_index(&self, collection: &str, field: &str) -> StoreResult<()>;
}

/// Index name used for the unique index on `field`
pub fn unique_index_name(field: &str) -> String {
    format!("{}_unique", field)
}

/// Build an inclusion projection from a field whitelist
pub fn field_projector(fields: &[&str]) -> Document {
    fields
        .iter()
        .map(|field| (field.to_string(), Bson::Int32(1)))
        .collect()
}

/// Find one document projected to `fields` and decode it
pub async fn find_one_as<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    filter: Document,
    fields: &[&str],
) -> StoreResult<Option<T>> {
    let found = store
        .find_one(collection, filter, Some(field_projector(fields)))
        .await?;
    Ok(found.map(mongodb::bson::from_document::<T>).transpose()?)
}

/// Create the unique indexes the user invariants rely on
pub async fn ensure_indexes(store: &dyn DocumentStore) -> StoreResult<()> {
    store.ensure_unique_index(USERS, "userName").await?;
    store.ensure_unique_index(USERS, "phoneNumber").await?;
    tracing::info!("unique indexes ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn projector_includes_every_field_in_order() {
        let projection = field_projector(&["userName", "displayName", "createdAt"]);
        assert_eq!(
            projection,
            doc! { "userName": 1, "displayName": 1, "createdAt": 1 }
        );
        let keys: Vec<_> = projection.keys().cloned().collect();
        assert_eq!(keys, vec!["userName", "displayName", "createdAt"]);
    }

    #[test]
    fn projector_of_nothing_is_empty() {
        assert!(field_projector(&[]).is_empty());
    }
}
