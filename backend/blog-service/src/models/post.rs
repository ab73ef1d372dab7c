use super::serialize_optional_datetime;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::{
    serialize_bson_datetime_as_rfc3339_string, serialize_object_id_as_hex_string,
};
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

pub const POST_FIELDS: &[&str] = &[
    "key",
    "content",
    "category",
    "attachmentKey",
    "authorId",
    "likesCount",
    "commentsCount",
    "createdAt",
    "updatedAt",
    "deletedAt",
];

/// Author fields joined into the global post listing
pub const AUTHOR_FIELDS: &[&str] = &["userName", "displayName"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub user_name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(
        rename(serialize = "id", deserialize = "_id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    pub key: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub attachment_key: Option<String>,
    #[serde(serialize_with = "serialize_object_id_as_hex_string")]
    pub author_id: ObjectId,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub comments_count: i64,
    #[serde(serialize_with = "serialize_bson_datetime_as_rfc3339_string")]
    pub created_at: DateTime,
    #[serde(serialize_with = "serialize_bson_datetime_as_rfc3339_string")]
    pub updated_at: DateTime,
    #[serde(default, serialize_with = "serialize_optional_datetime")]
    pub deleted_at: Option<DateTime>,
    /// Present only on listings that join the author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Vec<AuthorSummary>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePost {
    pub user_id: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub attachment_key: Option<String>,
    #[serde(default)]
    pub likes_count: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPost {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}
