use super::serialize_optional_datetime;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::{
    serialize_bson_datetime_as_rfc3339_string, serialize_object_id_as_hex_string,
};
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

pub const COMMENT_FIELDS: &[&str] = &[
    "key",
    "content",
    "attachmentKey",
    "authorId",
    "postId",
    "likesCount",
    "createdAt",
    "updatedAt",
    "deletedAt",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(
        rename(serialize = "id", deserialize = "_id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    pub key: String,
    pub content: String,
    #[serde(default)]
    pub attachment_key: Option<String>,
    #[serde(serialize_with = "serialize_object_id_as_hex_string")]
    pub author_id: ObjectId,
    #[serde(serialize_with = "serialize_object_id_as_hex_string")]
    pub post_id: ObjectId,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(serialize_with = "serialize_bson_datetime_as_rfc3339_string")]
    pub created_at: DateTime,
    #[serde(serialize_with = "serialize_bson_datetime_as_rfc3339_string")]
    pub updated_at: DateTime,
    #[serde(default, serialize_with = "serialize_optional_datetime")]
    pub deleted_at: Option<DateTime>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    #[serde(default)]
    pub attachment_key: Option<String>,
    #[serde(default)]
    pub likes_count: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditComment {
    pub id: String,
    pub user_id: String,
    pub content: String,
}
