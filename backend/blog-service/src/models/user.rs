use super::{deserialize_present, serialize_optional_datetime};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::{
    serialize_bson_datetime_as_rfc3339_string, serialize_object_id_as_hex_string,
};
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// Fields readable through the API. Never includes `password`.
pub const USER_FIELDS: &[&str] = &[
    "key",
    "phoneNumber",
    "displayName",
    "userName",
    "avatarKey",
    "createdAt",
    "updatedAt",
    "deletedAt",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(
        rename(serialize = "id", deserialize = "_id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    pub key: String,
    pub phone_number: String,
    pub user_name: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_key: Option<String>,
    #[serde(serialize_with = "serialize_bson_datetime_as_rfc3339_string")]
    pub created_at: DateTime,
    #[serde(serialize_with = "serialize_bson_datetime_as_rfc3339_string")]
    pub updated_at: DateTime,
    #[serde(default, serialize_with = "serialize_optional_datetime")]
    pub deleted_at: Option<DateTime>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub phone_number: String,
    pub display_name: String,
    pub user_name: String,
    pub password: String,
    #[serde(default)]
    pub avatar_key: Option<String>,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUser {
    pub id: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// `Some(None)` clears the avatar
    #[serde(default, deserialize_with = "deserialize_present")]
    pub avatar_key: Option<Option<String>>,
}
