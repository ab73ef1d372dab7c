use super::pagination::{paginate, Page, PageOptions};
use super::{find_one_as, DocumentStore, StoreResult, COUNTERS};
use crate::models::{Counter, TargetType, COUNTER_FIELDS};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, DateTime};

/// A validated counter fact ready to be stored
#[derive(Debug, Clone)]
pub struct NewCounter {
    pub target_id: ObjectId,
    pub target_type: TargetType,
    pub counter_field: String,
    pub user_id: ObjectId,
    pub value: Option<i64>,
}

/// Counters are append-only facts
pub async fn insert_counter(store: &dyn DocumentStore, counter: &NewCounter) -> StoreResult<ObjectId> {
    let id = ObjectId::new();
    let now = DateTime::now();
    let document = doc! {
        "_id": id,
        "targetId": counter.target_id,
        "targetType": i32::from(counter.target_type),
        "counterField": counter.counter_field.as_str(),
        "userId": counter.user_id,
        "value": counter.value,
        "createdAt": now,
        "updatedAt": now,
    };

    store.insert_one(COUNTERS, document).await?;
    Ok(id)
}

pub async fn find_counter(store: &dyn DocumentStore, id: ObjectId) -> StoreResult<Option<Counter>> {
    find_one_as(store, COUNTERS, doc! { "_id": id }, COUNTER_FIELDS).await
}

pub async fn list_counters_by_target(
    store: &dyn DocumentStore,
    target_id: ObjectId,
    page: u64,
) -> StoreResult<Page<Counter>> {
    let options = PageOptions {
        project: Some(doc! { "_id": 1 }),
        ..PageOptions::filter(doc! { "targetId": target_id })
    }
    .sorted_by(doc! { "createdAt": -1 });

    paginate(store, COUNTERS, COUNTER_FIELDS, page, &options).await
}
