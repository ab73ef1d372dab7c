/// User service - registration, profile edits and lookups
use super::parse_object_id;
use crate::db::user_repo::{self, UserLookup};
use crate::db::{DocumentStore, StoreError};
use crate::error::{AppError, Result};
use crate::models::{CreateUser, EditUser, User};
use mongodb::bson::{doc, Bson};
use std::sync::Arc;

pub struct UserService {
    store: Arc<dyn DocumentStore>,
}

/// A unique-index collision raced past the pre-check
fn map_duplicate(err: StoreError) -> AppError {
    match err {
        StoreError::DuplicateKey { ref field, .. } if field == "userName" => {
            AppError::UsernameAlreadyTaken
        }
        StoreError::DuplicateKey { ref field, .. } if field == "phoneNumber" => {
            AppError::PhoneNumberAlreadyTaken
        }
        other => AppError::Store(other),
    }
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fail if another user (anyone but `owner`) already holds the value
    async fn ensure_available(
        &self,
        lookup: UserLookup,
        owner: Option<&User>,
        taken: AppError,
    ) -> Result<()> {
        match user_repo::find_user(self.store.as_ref(), &lookup).await? {
            Some(existing) if owner.map_or(true, |o| o.id != existing.id) => Err(taken),
            _ => Ok(()),
        }
    }

    pub async fn create_user(&self, input: CreateUser) -> Result<()> {
        self.ensure_available(
            UserLookup::UserName(input.user_name.clone()),
            None,
            AppError::UsernameAlreadyTaken,
        )
        .await?;
        self.ensure_available(
            UserLookup::PhoneNumber(input.phone_number.clone()),
            None,
            AppError::PhoneNumberAlreadyTaken,
        )
        .await?;

        let id = user_repo::create_user(self.store.as_ref(), &input)
            .await
            .map_err(map_duplicate)?;

        tracing::info!(user_id = %id, user_name = %input.user_name, "user created");
        Ok(())
    }

    pub async fn edit_user(&self, input: EditUser) -> Result<()> {
        let id = parse_object_id(&input.id)?;
        let user = self.get_user(UserLookup::Id(id)).await?;

        let mut fields = doc! {};
        if let Some(user_name) = input.user_name {
            self.ensure_available(
                UserLookup::UserName(user_name.clone()),
                Some(&user),
                AppError::UsernameAlreadyTaken,
            )
            .await?;
            fields.insert("userName", user_name);
        }
        if let Some(phone_number) = input.phone_number {
            self.ensure_available(
                UserLookup::PhoneNumber(phone_number.clone()),
                Some(&user),
                AppError::PhoneNumberAlreadyTaken,
            )
            .await?;
            fields.insert("phoneNumber", phone_number);
        }
        if let Some(display_name) = input.display_name {
            fields.insert("displayName", display_name);
        }
        if let Some(password) = input.password {
            fields.insert("password", password);
        }
        if let Some(avatar_key) = input.avatar_key {
            fields.insert("avatarKey", Bson::from(avatar_key));
        }

        user_repo::update_user(self.store.as_ref(), id, fields)
            .await
            .map_err(map_duplicate)?;

        tracing::info!(user_id = %id, "user updated");
        Ok(())
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let id = parse_object_id(id)?;
        if !user_repo::delete_user(self.store.as_ref(), id).await? {
            return Err(AppError::UserNotFound);
        }

        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    pub async fn get_user(&self, lookup: UserLookup) -> Result<User> {
        user_repo::find_user(self.store.as_ref(), &lookup)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn is_user_name_taken(&self, user_name: &str) -> Result<bool> {
        let lookup = UserLookup::UserName(user_name.to_string());
        Ok(user_repo::user_exists(self.store.as_ref(), &lookup).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ensure_indexes, InMemoryStore};

    async fn service() -> UserService {
        let store = Arc::new(InMemoryStore::new());
        ensure_indexes(store.as_ref()).await.unwrap();
        UserService::new(store)
    }

    fn create(user_name: &str, phone_number: &str) -> CreateUser {
        CreateUser {
            phone_number: phone_number.into(),
            display_name: "Someone".into(),
            user_name: user_name.into(),
            password: "password123".into(),
            avatar_key: None,
        }
    }

    #[tokio::test]
    async fn duplicate_user_name_and_phone_are_rejected() {
        let service = service().await;
        service.create_user(create("first", "+989121111111")).await.unwrap();

        let err = service
            .create_user(create("first", "+989122222222"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UsernameAlreadyTaken));

        let err = service
            .create_user(create("second", "+989121111111"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PhoneNumberAlreadyTaken));
    }

    #[tokio::test]
    async fn editing_to_own_user_name_is_allowed() {
        let service = service().await;
        service.create_user(create("first", "+989121111111")).await.unwrap();
        service.create_user(create("second", "+989122222222")).await.unwrap();
        let first = service
            .get_user(UserLookup::UserName("first".into()))
            .await
            .unwrap();

        let own = EditUser {
            id: first.id.to_hex(),
            user_name: Some("first".into()),
            display_name: Some("Renamed".into()),
            ..EditUser::default()
        };
        service.edit_user(own).await.unwrap();

        let stolen = EditUser {
            id: first.id.to_hex(),
            user_name: Some("second".into()),
            ..EditUser::default()
        };
        assert!(matches!(
            service.edit_user(stolen).await.unwrap_err(),
            AppError::UsernameAlreadyTaken
        ));
    }

    #[tokio::test]
    async fn clearing_avatar_stores_null() {
        let service = service().await;
        let mut input = create("first", "+989121111111");
        input.avatar_key = Some(uuid::Uuid::new_v4().to_string());
        service.create_user(input).await.unwrap();
        let user = service
            .get_user(UserLookup::UserName("first".into()))
            .await
            .unwrap();
        assert!(user.avatar_key.is_some());

        let edit = EditUser {
            id: user.id.to_hex(),
            avatar_key: Some(None),
            ..EditUser::default()
        };
        service.edit_user(edit).await.unwrap();

        let user = service.get_user(UserLookup::Id(user.id)).await.unwrap();
        assert_eq!(user.avatar_key, None);
    }

    #[tokio::test]
    async fn deleting_missing_user_is_not_found() {
        let service = service().await;
        let err = service
            .delete_user("507f1f77bcf86cd799439011")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }
}
