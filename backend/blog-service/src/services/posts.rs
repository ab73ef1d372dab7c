/// Post service - handles post authoring, retrieval, listings and likes
use super::{count_field, object_id_field, parse_object_id};
use crate::db::pagination::Page;
use crate::db::post_repo;
use crate::db::user_repo::{self, UserLookup};
use crate::db::DocumentStore;
use crate::error::{AppError, Result};
use crate::models::{CreatePost, EditPost, LikeTotal, Post};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use std::sync::Arc;

pub struct PostService {
    store: Arc<dyn DocumentStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    async fn ensure_user(&self, id: ObjectId) -> Result<()> {
        if user_repo::user_exists(self.store(), &UserLookup::Id(id)).await? {
            Ok(())
        } else {
            Err(AppError::UserNotFound)
        }
    }

    /// Resolve the post and check that `caller` wrote it
    async fn authorize(&self, id: ObjectId, caller: ObjectId) -> Result<()> {
        let post = post_repo::find_post_fields(self.store(), id, &["authorId"])
            .await?
            .ok_or(AppError::PostNotFound)?;

        if object_id_field(&post, "authorId")? != caller {
            tracing::warn!(post_id = %id, caller = %caller, "post mutation by non-author");
            return Err(AppError::PermissionDenied);
        }
        Ok(())
    }

    pub async fn create_post(&self, input: CreatePost) -> Result<Post> {
        let author_id = parse_object_id(&input.user_id)?;
        self.ensure_user(author_id).await?;

        let post = post_repo::create_post(self.store(), author_id, &input).await?;
        tracing::info!(post_id = %post.id, author_id = %author_id, "post created");
        Ok(post)
    }

    pub async fn edit_post(&self, input: EditPost) -> Result<()> {
        let id = parse_object_id(&input.id)?;
        let caller = parse_object_id(&input.user_id)?;
        self.authorize(id, caller).await?;

        let mut fields = Document::new();
        if let Some(content) = input.content {
            fields.insert("content", content);
        }
        if let Some(category) = input.category {
            fields.insert("category", category);
        }

        post_repo::update_post(self.store(), id, fields).await?;
        tracing::info!(post_id = %id, "post updated");
        Ok(())
    }

    pub async fn delete_post(&self, id: &str, user_id: &str) -> Result<()> {
        let id = parse_object_id(id)?;
        let caller = parse_object_id(user_id)?;
        self.authorize(id, caller).await?;

        post_repo::delete_post(self.store(), id).await?;
        tracing::info!(post_id = %id, "post deleted");
        Ok(())
    }

    pub async fn get_post_by_id(&self, id: &str) -> Result<Post> {
        let id = parse_object_id(id)?;
        post_repo::find_post(self.store(), doc! { "_id": id })
            .await?
            .ok_or(AppError::PostNotFound)
    }

    pub async fn get_post_by_key(&self, key: &str) -> Result<Post> {
        post_repo::find_post(self.store(), doc! { "key": key })
            .await?
            .ok_or(AppError::PostNotFound)
    }

    pub async fn list_user_posts(&self, author_id: &str, page: u64) -> Result<Page<Post>> {
        let author_id = parse_object_id(author_id)?;
        self.ensure_user(author_id).await?;
        Ok(post_repo::list_posts_by_author(self.store(), author_id, page).await?)
    }

    pub async fn list_category_posts(&self, category: &str, page: u64) -> Result<Page<Post>> {
        Ok(post_repo::list_posts_by_category(self.store(), category, page).await?)
    }

    pub async fn list_all_posts(&self, page: u64) -> Result<Page<Post>> {
        Ok(post_repo::list_all_posts(self.store(), page).await?)
    }

    /// Read, increment and write back. Concurrent likes may overwrite each other.
    pub async fn like_post(&self, id: &str) -> Result<LikeTotal> {
        let id = parse_object_id(id)?;
        let post = post_repo::find_post_fields(self.store(), id, &["likesCount"])
            .await?
            .ok_or(AppError::PostNotFound)?;

        let total = count_field(&post, "likesCount").saturating_add(1);
        post_repo::update_post(self.store(), id, doc! { "likesCount": total }).await?;

        tracing::debug!(post_id = %id, total, "post liked");
        Ok(LikeTotal { total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::models::CreateUser;

    async fn setup() -> (PostService, ObjectId) {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let author = user_repo::create_user(
            store.as_ref(),
            &CreateUser {
                phone_number: "+989121234567".into(),
                display_name: "Author".into(),
                user_name: "author".into(),
                password: "password123".into(),
                avatar_key: None,
            },
        )
        .await
        .unwrap();
        (PostService::new(store), author)
    }

    fn new_post(author: ObjectId) -> CreatePost {
        CreatePost {
            user_id: author.to_hex(),
            content: "first post".into(),
            category: "news".into(),
            attachment_key: None,
            likes_count: None,
        }
    }

    #[tokio::test]
    async fn non_author_cannot_edit_or_delete() {
        let (service, author) = setup().await;
        let post = service.create_post(new_post(author)).await.unwrap();
        let stranger = ObjectId::new().to_hex();

        let edit = EditPost {
            id: post.id.to_hex(),
            user_id: stranger.clone(),
            content: Some("hijacked".into()),
            category: None,
        };
        assert!(matches!(
            service.edit_post(edit).await.unwrap_err(),
            AppError::PermissionDenied
        ));
        assert!(matches!(
            service.delete_post(&post.id.to_hex(), &stranger).await.unwrap_err(),
            AppError::PermissionDenied
        ));

        let unchanged = service.get_post_by_id(&post.id.to_hex()).await.unwrap();
        assert_eq!(unchanged.content, "first post");
    }

    #[tokio::test]
    async fn author_edit_only_touches_given_fields() {
        let (service, author) = setup().await;
        let post = service.create_post(new_post(author)).await.unwrap();

        let edit = EditPost {
            id: post.id.to_hex(),
            user_id: author.to_hex(),
            content: None,
            category: Some("sports".into()),
        };
        service.edit_post(edit).await.unwrap();

        let edited = service.get_post_by_key(&post.key).await.unwrap();
        assert_eq!(edited.content, "first post");
        assert_eq!(edited.category, "sports");
    }

    #[tokio::test]
    async fn sequential_likes_accumulate() {
        let (service, author) = setup().await;
        let post = service.create_post(new_post(author)).await.unwrap();

        for expected in 1..=5 {
            let like = service.like_post(&post.id.to_hex()).await.unwrap();
            assert_eq!(like.total, expected);
        }
        let liked = service.get_post_by_id(&post.id.to_hex()).await.unwrap();
        assert_eq!(liked.likes_count, 5);
    }

    #[tokio::test]
    async fn like_at_the_counter_ceiling_saturates() {
        let (service, author) = setup().await;
        let post = service
            .create_post(CreatePost {
                likes_count: Some(i64::MAX),
                ..new_post(author)
            })
            .await
            .unwrap();

        let like = service.like_post(&post.id.to_hex()).await.unwrap();
        assert_eq!(like.total, i64::MAX);
    }

    #[tokio::test]
    async fn posting_as_unknown_user_is_not_found() {
        let (service, _) = setup().await;
        let err = service.create_post(new_post(ObjectId::new())).await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }
}
