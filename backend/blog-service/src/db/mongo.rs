//! MongoDB-backed [`DocumentStore`].

use super::{unique_index_name, DocumentStore, StoreError, StoreResult};
use crate::metrics::record_store_operation;
use async_trait::async_trait;
use db_pool::{DbConfig, LazyDatabase};
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneOptions, IndexOptions};
use mongodb::{Collection, IndexModel};

const DUPLICATE_KEY_CODE: i32 = 11000;

pub struct MongoStore {
    database: LazyDatabase,
}

impl MongoStore {
    /// The client is not created until the first operation
    pub fn new(config: DbConfig) -> Self {
        Self {
            database: LazyDatabase::new(config),
        }
    }

    async fn collection(&self, name: &str) -> StoreResult<Collection<Document>> {
        Ok(self.database.get().await?.collection::<Document>(name))
    }
}

/// Recover the offending field from a duplicate-key write error.
///
/// The server reports the index name (`<field>_unique`) in the message.
fn duplicate_key(collection: &str, err: &mongodb::error::Error) -> Option<StoreError> {
    let message = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE => {
            write.message.as_str()
        }
        _ => return None,
    };

    let field = message
        .split("index: ")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|index| index.strip_suffix("_unique"))
        .unwrap_or("unknown");

    Some(StoreError::DuplicateKey {
        collection: collection.to_string(),
        field: field.to_string(),
    })
}

fn observe<T>(collection: &str, operation: &str, result: StoreResult<T>) -> StoreResult<T> {
    record_store_operation(collection, operation, result.is_ok());
    if let Err(err) = &result {
        tracing::warn!(collection, operation, error = %err, "store operation failed");
    }
    result
}

fn map_write_error(collection: &str, err: mongodb::error::Error) -> StoreError {
    duplicate_key(collection, &err).unwrap_or(StoreError::Driver(err))
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<Bson> {
        let result = async {
            let coll = self.collection(collection).await?;
            let inserted = coll
                .insert_one(document, None)
                .await
                .map_err(|err| map_write_error(collection, err))?;
            Ok::<_, StoreError>(inserted.inserted_id)
        }
        .await;
        observe(collection, "insert_one", result)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> StoreResult<Option<Document>> {
        let result = async {
            let coll = self.collection(collection).await?;
            let mut options = FindOneOptions::default();
            options.projection = projection;
            Ok::<_, StoreError>(coll.find_one(filter, options).await?)
        }
        .await;
        observe(collection, "find_one", result)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        fields: Document,
    ) -> StoreResult<u64> {
        let result = async {
            let coll = self.collection(collection).await?;
            let updated = coll
                .update_one(filter, doc! { "$set": fields }, None)
                .await
                .map_err(|err| map_write_error(collection, err))?;
            Ok::<_, StoreError>(updated.matched_count)
        }
        .await;
        observe(collection, "update_one", result)
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        let result = async {
            let coll = self.collection(collection).await?;
            Ok::<_, StoreError>(coll.delete_one(filter, None).await?.deleted_count)
        }
        .await;
        observe(collection, "delete_one", result)
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> StoreResult<Vec<Document>> {
        let result = async {
            let coll = self.collection(collection).await?;
            let cursor = coll.aggregate(pipeline, None).await?;
            Ok::<_, StoreError>(cursor.try_collect::<Vec<Document>>().await?)
        }
        .await;
        observe(collection, "aggregate", result)
    }

    async fn ping(&self) -> StoreResult<()> {
        let database = self.database.get().await?;
        database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    async fn ensure_unique_index(&self, collection: &str, field: &str) -> StoreResult<()> {
        let coll = self.collection(collection).await?;
        let options = IndexOptions::builder()
            .unique(true)
            .name(unique_index_name(field))
            .build();
        let model = IndexModel::builder()
            .keys(doc! { field: 1 })
            .options(options)
            .build();

        coll.create_index(model, None).await?;
        tracing::debug!(collection, field, "unique index ensured");
        Ok(())
    }
}
