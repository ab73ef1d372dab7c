use super::pagination::{paginate, Page, PageOptions};
use super::{find_one_as, DocumentStore, StoreResult, COMMENTS};
use crate::models::{Comment, CreateComment, COMMENT_FIELDS};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, DateTime, Document};
use uuid::Uuid;

pub async fn create_comment(
    store: &dyn DocumentStore,
    post_id: ObjectId,
    author_id: ObjectId,
    input: &CreateComment,
) -> StoreResult<Comment> {
    let now = DateTime::now();
    let document = doc! {
        "_id": ObjectId::new(),
        "key": Uuid::new_v4().to_string(),
        "content": input.content.as_str(),
        "attachmentKey": input.attachment_key.clone(),
        "authorId": author_id,
        "postId": post_id,
        "likesCount": input.likes_count.unwrap_or(0),
        "createdAt": now,
        "updatedAt": now,
        "deletedAt": Bson::Null,
    };

    store.insert_one(COMMENTS, document.clone()).await?;
    Ok(mongodb::bson::from_document(document)?)
}

pub async fn find_comment(
    store: &dyn DocumentStore,
    filter: Document,
) -> StoreResult<Option<Comment>> {
    find_one_as(store, COMMENTS, filter, COMMENT_FIELDS).await
}

pub async fn find_comment_fields(
    store: &dyn DocumentStore,
    id: ObjectId,
    fields: &[&str],
) -> StoreResult<Option<Document>> {
    store
        .find_one(COMMENTS, doc! { "_id": id }, Some(super::field_projector(fields)))
        .await
}

pub async fn update_comment(
    store: &dyn DocumentStore,
    id: ObjectId,
    mut fields: Document,
) -> StoreResult<bool> {
    fields.insert("updatedAt", DateTime::now());
    Ok(store.update_one(COMMENTS, doc! { "_id": id }, fields).await? > 0)
}

pub async fn delete_comment(store: &dyn DocumentStore, id: ObjectId) -> StoreResult<bool> {
    Ok(store.delete_one(COMMENTS, doc! { "_id": id }).await? > 0)
}

/// Comments of a post, oldest first
pub async fn list_comments_by_post(
    store: &dyn DocumentStore,
    post_id: ObjectId,
    page: u64,
) -> StoreResult<Page<Comment>> {
    let options = PageOptions {
        project: Some(doc! { "_id": 1 }),
        ..PageOptions::filter(doc! { "postId": post_id })
    }
    .sorted_by(doc! { "createdAt": 1 });

    paginate(store, COMMENTS, COMMENT_FIELDS, page, &options).await
}
