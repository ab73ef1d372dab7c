use super::{find_one_as, DocumentStore, StoreResult, USERS};
use crate::models::{CreateUser, User, USER_FIELDS};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, DateTime, Document};
use uuid::Uuid;

/// The ways a single user can be addressed
#[derive(Debug, Clone)]
pub enum UserLookup {
    Id(ObjectId),
    Key(String),
    UserName(String),
    PhoneNumber(String),
}

impl UserLookup {
    pub fn filter(&self) -> Document {
        match self {
            UserLookup::Id(id) => doc! { "_id": *id },
            UserLookup::Key(key) => doc! { "key": key.as_str() },
            UserLookup::UserName(user_name) => doc! { "userName": user_name.as_str() },
            UserLookup::PhoneNumber(phone) => doc! { "phoneNumber": phone.as_str() },
        }
    }
}

/// Insert a new user and return its id
pub async fn create_user(store: &dyn DocumentStore, input: &CreateUser) -> StoreResult<ObjectId> {
    let id = ObjectId::new();
    let now = DateTime::now();

    let document = doc! {
        "_id": id,
        "key": Uuid::new_v4().to_string(),
        "phoneNumber": input.phone_number.as_str(),
        "userName": input.user_name.as_str(),
        "displayName": input.display_name.as_str(),
        "password": input.password.as_str(),
        "avatarKey": input.avatar_key.clone(),
        "createdAt": now,
        "updatedAt": now,
        "deletedAt": Bson::Null,
    };

    store.insert_one(USERS, document).await?;
    Ok(id)
}

pub async fn find_user(store: &dyn DocumentStore, lookup: &UserLookup) -> StoreResult<Option<User>> {
    find_one_as(store, USERS, lookup.filter(), USER_FIELDS).await
}

/// Existence check projecting a single field
pub async fn user_exists(store: &dyn DocumentStore, lookup: &UserLookup) -> StoreResult<bool> {
    let found = store
        .find_one(USERS, lookup.filter(), Some(doc! { "_id": 1 }))
        .await?;
    Ok(found.is_some())
}

/// `$set` the given fields and refresh `updatedAt`. Returns whether a user matched.
pub async fn update_user(
    store: &dyn DocumentStore,
    id: ObjectId,
    mut fields: Document,
) -> StoreResult<bool> {
    fields.insert("updatedAt", DateTime::now());
    let matched = store.update_one(USERS, doc! { "_id": id }, fields).await?;
    Ok(matched > 0)
}

pub async fn delete_user(store: &dyn DocumentStore, id: ObjectId) -> StoreResult<bool> {
    Ok(store.delete_one(USERS, doc! { "_id": id }).await? > 0)
}
