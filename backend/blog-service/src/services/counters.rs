/// Counter service - ingestion and lookup of view/rating facts
use super::parse_object_id;
use crate::db::counter_repo::{self, NewCounter};
use crate::db::pagination::Page;
use crate::db::DocumentStore;
use crate::error::{AppError, Result};
use crate::models::{Counter, CreateCounter};
use std::sync::Arc;

pub struct CounterService {
    store: Arc<dyn DocumentStore>,
}

impl CounterService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, input: CreateCounter) -> Result<()> {
        let counter = NewCounter {
            target_id: parse_object_id(&input.target_id)?,
            target_type: input.target_type,
            counter_field: input.counter_field,
            user_id: parse_object_id(&input.user_id)?,
            value: input.value,
        };

        let id = counter_repo::insert_counter(self.store.as_ref(), &counter).await?;
        tracing::debug!(
            counter_id = %id,
            target_id = %counter.target_id,
            field = %counter.counter_field,
            "counter recorded"
        );
        Ok(())
    }

    pub async fn get_counter(&self, id: &str) -> Result<Counter> {
        let id = parse_object_id(id)?;
        counter_repo::find_counter(self.store.as_ref(), id)
            .await?
            .ok_or(AppError::CounterNotFound)
    }

    pub async fn list_target_counters(&self, target_id: &str, page: u64) -> Result<Page<Counter>> {
        let target_id = parse_object_id(target_id)?;
        Ok(counter_repo::list_counters_by_target(self.store.as_ref(), target_id, page).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::models::TargetType;
    use mongodb::bson::oid::ObjectId;

    #[tokio::test]
    async fn recorded_counters_are_listed_by_target() {
        let service = CounterService::new(Arc::new(InMemoryStore::new()));
        let target = ObjectId::new();

        for value in [Some(5), None] {
            service
                .record(CreateCounter {
                    target_id: target.to_hex(),
                    target_type: TargetType::Post,
                    counter_field: "view".into(),
                    user_id: ObjectId::new().to_hex(),
                    value,
                })
                .await
                .unwrap();
        }

        let page = service.list_target_counters(&target.to_hex(), 0).await.unwrap();
        assert_eq!(page.meta.total_count, 2);
        assert!(page.data.iter().all(|c| c.target_type == TargetType::Post));

        let first = service.get_counter(&page.data[0].id.to_hex()).await.unwrap();
        assert_eq!(first.counter_field, "view");
    }

    #[tokio::test]
    async fn missing_counter_is_not_found() {
        let service = CounterService::new(Arc::new(InMemoryStore::new()));
        let err = service
            .get_counter(&ObjectId::new().to_hex())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CounterNotFound));
    }
}
