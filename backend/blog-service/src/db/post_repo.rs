use super::pagination::{paginate, Lookup, Page, PageOptions};
use super::{find_one_as, DocumentStore, StoreResult, POSTS, USERS};
use crate::models::post::AUTHOR_FIELDS;
use crate::models::{CreatePost, Post, POST_FIELDS};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, DateTime, Document};
use uuid::Uuid;

/// Insert a new post authored by `author_id` and return it
pub async fn create_post(
    store: &dyn DocumentStore,
    author_id: ObjectId,
    input: &CreatePost,
) -> StoreResult<Post> {
    let now = DateTime::now();
    let document = doc! {
        "_id": ObjectId::new(),
        "key": Uuid::new_v4().to_string(),
        "content": input.content.as_str(),
        "category": input.category.as_str(),
        "attachmentKey": input.attachment_key.clone(),
        "authorId": author_id,
        "likesCount": input.likes_count.unwrap_or(0),
        "commentsCount": 0_i64,
        "createdAt": now,
        "updatedAt": now,
        "deletedAt": Bson::Null,
    };

    store.insert_one(POSTS, document.clone()).await?;
    Ok(mongodb::bson::from_document(document)?)
}

pub async fn find_post(store: &dyn DocumentStore, filter: Document) -> StoreResult<Option<Post>> {
    find_one_as(store, POSTS, filter, POST_FIELDS).await
}

/// Project only what the caller needs next
pub async fn find_post_fields(
    store: &dyn DocumentStore,
    id: ObjectId,
    fields: &[&str],
) -> StoreResult<Option<Document>> {
    store
        .find_one(POSTS, doc! { "_id": id }, Some(super::field_projector(fields)))
        .await
}

/// `$set` the given fields and refresh `updatedAt`
pub async fn update_post(
    store: &dyn DocumentStore,
    id: ObjectId,
    mut fields: Document,
) -> StoreResult<bool> {
    fields.insert("updatedAt", DateTime::now());
    Ok(store.update_one(POSTS, doc! { "_id": id }, fields).await? > 0)
}

pub async fn delete_post(store: &dyn DocumentStore, id: ObjectId) -> StoreResult<bool> {
    Ok(store.delete_one(POSTS, doc! { "_id": id }).await? > 0)
}

/// Newest first; every listing keeps the post id
fn listing(filter: Document) -> PageOptions {
    PageOptions {
        project: Some(doc! { "_id": 1 }),
        ..PageOptions::filter(filter)
    }
    .sorted_by(doc! { "createdAt": -1 })
}

pub async fn list_posts_by_author(
    store: &dyn DocumentStore,
    author_id: ObjectId,
    page: u64,
) -> StoreResult<Page<Post>> {
    paginate(store, POSTS, POST_FIELDS, page, &listing(doc! { "authorId": author_id })).await
}

pub async fn list_posts_by_category(
    store: &dyn DocumentStore,
    category: &str,
    page: u64,
) -> StoreResult<Page<Post>> {
    paginate(store, POSTS, POST_FIELDS, page, &listing(doc! { "category": category })).await
}

/// All posts with their author's public name joined in
pub async fn list_all_posts(store: &dyn DocumentStore, page: u64) -> StoreResult<Page<Post>> {
    let options = listing(doc! {}).with_lookup(Lookup {
        from: USERS,
        local_field: "authorId",
        foreign_field: "_id",
        as_field: "author",
        fields: AUTHOR_FIELDS,
    });
    paginate(store, POSTS, POST_FIELDS, page, &options).await
}
