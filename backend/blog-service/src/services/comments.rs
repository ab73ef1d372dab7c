/// Comment service - comments on posts and their likes
use super::{count_field, object_id_field, parse_object_id};
use crate::db::pagination::Page;
use crate::db::{comment_repo, post_repo, DocumentStore};
use crate::error::{AppError, Result};
use crate::models::{Comment, CreateComment, EditComment, LikeTotal};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::doc;
use std::sync::Arc;

pub struct CommentService {
    store: Arc<dyn DocumentStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    async fn ensure_post(&self, id: ObjectId) -> Result<()> {
        post_repo::find_post_fields(self.store(), id, &["_id"])
            .await?
            .map(|_| ())
            .ok_or(AppError::PostNotFound)
    }

    /// Shift the parent post's `commentsCount` by `delta`. Not atomic.
    async fn adjust_comments_count(&self, post_id: ObjectId, delta: i64) -> Result<()> {
        let Some(post) =
            post_repo::find_post_fields(self.store(), post_id, &["commentsCount"]).await?
        else {
            return Ok(());
        };

        let count = (count_field(&post, "commentsCount") + delta).max(0);
        post_repo::update_post(self.store(), post_id, doc! { "commentsCount": count }).await?;
        Ok(())
    }

    /// Resolve the comment and check that `caller` wrote it.
    /// Returns the parent post id.
    async fn authorize(&self, id: ObjectId, caller: ObjectId) -> Result<ObjectId> {
        let comment = comment_repo::find_comment_fields(self.store(), id, &["authorId", "postId"])
            .await?
            .ok_or(AppError::CommentNotFound)?;

        if object_id_field(&comment, "authorId")? != caller {
            tracing::warn!(comment_id = %id, caller = %caller, "comment mutation by non-author");
            return Err(AppError::ForbiddenAccess);
        }
        object_id_field(&comment, "postId")
    }

    pub async fn create_comment(&self, input: CreateComment) -> Result<Comment> {
        let post_id = parse_object_id(&input.post_id)?;
        let author_id = parse_object_id(&input.user_id)?;
        self.ensure_post(post_id).await?;

        let comment = comment_repo::create_comment(self.store(), post_id, author_id, &input).await?;
        self.adjust_comments_count(post_id, 1).await?;

        tracing::info!(comment_id = %comment.id, post_id = %post_id, "comment created");
        Ok(comment)
    }

    pub async fn edit_comment(&self, input: EditComment) -> Result<()> {
        let id = parse_object_id(&input.id)?;
        let caller = parse_object_id(&input.user_id)?;
        self.authorize(id, caller).await?;

        comment_repo::update_comment(self.store(), id, doc! { "content": input.content }).await?;
        tracing::info!(comment_id = %id, "comment updated");
        Ok(())
    }

    pub async fn delete_comment(&self, id: &str, user_id: &str) -> Result<()> {
        let id = parse_object_id(id)?;
        let caller = parse_object_id(user_id)?;
        let post_id = self.authorize(id, caller).await?;

        // Comments left behind by a deleted post stay put
        if post_repo::find_post_fields(self.store(), post_id, &["_id"])
            .await?
            .is_none()
        {
            tracing::warn!(comment_id = %id, post_id = %post_id, "delete of comment on missing post");
            return Err(AppError::ForbiddenAccess);
        }

        comment_repo::delete_comment(self.store(), id).await?;
        self.adjust_comments_count(post_id, -1).await?;

        tracing::info!(comment_id = %id, "comment deleted");
        Ok(())
    }

    pub async fn get_comment_by_id(&self, id: &str) -> Result<Comment> {
        let id = parse_object_id(id)?;
        comment_repo::find_comment(self.store(), doc! { "_id": id })
            .await?
            .ok_or(AppError::CommentNotFound)
    }

    pub async fn get_comment_by_key(&self, key: &str) -> Result<Comment> {
        comment_repo::find_comment(self.store(), doc! { "key": key })
            .await?
            .ok_or(AppError::CommentNotFound)
    }

    pub async fn list_post_comments(&self, post_id: &str, page: u64) -> Result<Page<Comment>> {
        let post_id = parse_object_id(post_id)?;
        self.ensure_post(post_id).await?;
        Ok(comment_repo::list_comments_by_post(self.store(), post_id, page).await?)
    }

    /// Read, increment and write back. Concurrent likes may overwrite each other.
    pub async fn like_comment(&self, id: &str) -> Result<LikeTotal> {
        let id = parse_object_id(id)?;
        let comment = comment_repo::find_comment_fields(self.store(), id, &["likesCount"])
            .await?
            .ok_or(AppError::CommentNotFound)?;

        let total = count_field(&comment, "likesCount").saturating_add(1);
        comment_repo::update_comment(self.store(), id, doc! { "likesCount": total }).await?;

        tracing::debug!(comment_id = %id, total, "comment liked");
        Ok(LikeTotal { total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryStore, COMMENTS};
    use crate::models::CreatePost;

    async fn setup() -> (Arc<InMemoryStore>, CommentService, ObjectId) {
        let store = Arc::new(InMemoryStore::new());
        let post = post_repo::create_post(
            store.as_ref(),
            ObjectId::new(),
            &CreatePost {
                user_id: String::new(),
                content: "post".into(),
                category: "news".into(),
                attachment_key: None,
                likes_count: None,
            },
        )
        .await
        .unwrap();
        (store.clone(), CommentService::new(store), post.id)
    }

    fn new_comment(post_id: ObjectId, user_id: ObjectId) -> CreateComment {
        CreateComment {
            post_id: post_id.to_hex(),
            user_id: user_id.to_hex(),
            content: "hello".into(),
            attachment_key: None,
            likes_count: None,
        }
    }

    async fn comments_count(store: &InMemoryStore, post_id: ObjectId) -> i64 {
        let post = post_repo::find_post_fields(store, post_id, &["commentsCount"])
            .await
            .unwrap()
            .unwrap();
        count_field(&post, "commentsCount")
    }

    #[tokio::test]
    async fn commenting_on_missing_post_persists_nothing() {
        let (store, service, _) = setup().await;
        let err = service
            .create_comment(new_comment(ObjectId::new(), ObjectId::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PostNotFound));
        assert_eq!(store.len(COMMENTS).await, 0);
    }

    #[tokio::test]
    async fn comment_lifecycle_tracks_post_count() {
        let (store, service, post_id) = setup().await;
        let author = ObjectId::new();

        let comment = service
            .create_comment(new_comment(post_id, author))
            .await
            .unwrap();
        assert_eq!(comments_count(&store, post_id).await, 1);

        let stranger = ObjectId::new().to_hex();
        assert!(matches!(
            service
                .delete_comment(&comment.id.to_hex(), &stranger)
                .await
                .unwrap_err(),
            AppError::ForbiddenAccess
        ));

        service
            .delete_comment(&comment.id.to_hex(), &author.to_hex())
            .await
            .unwrap();
        assert_eq!(comments_count(&store, post_id).await, 0);
        assert!(matches!(
            service.get_comment_by_id(&comment.id.to_hex()).await.unwrap_err(),
            AppError::CommentNotFound
        ));
    }

    #[tokio::test]
    async fn comment_on_deleted_post_cannot_be_deleted() {
        let (store, service, post_id) = setup().await;
        let author = ObjectId::new();
        let comment = service
            .create_comment(new_comment(post_id, author))
            .await
            .unwrap();
        post_repo::delete_post(store.as_ref(), post_id).await.unwrap();

        let err = service
            .delete_comment(&comment.id.to_hex(), &author.to_hex())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ForbiddenAccess));
        assert_eq!(store.len(COMMENTS).await, 1);
    }

    #[tokio::test]
    async fn non_author_edit_is_forbidden() {
        let (_, service, post_id) = setup().await;
        let comment = service
            .create_comment(new_comment(post_id, ObjectId::new()))
            .await
            .unwrap();

        let edit = EditComment {
            id: comment.id.to_hex(),
            user_id: ObjectId::new().to_hex(),
            content: "changed".into(),
        };
        assert!(matches!(
            service.edit_comment(edit).await.unwrap_err(),
            AppError::ForbiddenAccess
        ));
        let unchanged = service.get_comment_by_key(&comment.key).await.unwrap();
        assert_eq!(unchanged.content, "hello");
    }

    #[tokio::test]
    async fn likes_and_listing() {
        let (_, service, post_id) = setup().await;
        let author = ObjectId::new();
        let first = service
            .create_comment(new_comment(post_id, author))
            .await
            .unwrap();
        service
            .create_comment(new_comment(post_id, author))
            .await
            .unwrap();

        let id = first.id.to_hex();
        service.like_comment(&id).await.unwrap();
        let liked = service.like_comment(&id).await.unwrap();
        assert_eq!(liked.total, 2);

        let page = service
            .list_post_comments(&post_id.to_hex(), 0)
            .await
            .unwrap();
        assert_eq!(page.meta.total_count, 2);
        assert_eq!(page.data[0].id, first.id);
    }
}
