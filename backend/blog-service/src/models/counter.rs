use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::{
    serialize_bson_datetime_as_rfc3339_string, serialize_object_id_as_hex_string,
};
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

pub const COUNTER_FIELDS: &[&str] = &[
    "targetId",
    "targetType",
    "counterField",
    "userId",
    "value",
    "createdAt",
    "updatedAt",
];

/// Kind of entity a counter refers to. Stored and sent as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum TargetType {
    User = 1,
    Post = 2,
    Comment = 3,
}

impl TargetType {
    pub const CODES: &'static [i64] = &[1, 2, 3];
}

impl TryFrom<i32> for TargetType {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(TargetType::User),
            2 => Ok(TargetType::Post),
            3 => Ok(TargetType::Comment),
            other => Err(format!("unknown target type {}", other)),
        }
    }
}

impl From<TargetType> for i32 {
    fn from(target: TargetType) -> Self {
        target as i32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counter {
    #[serde(
        rename(serialize = "id", deserialize = "_id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    #[serde(serialize_with = "serialize_object_id_as_hex_string")]
    pub target_id: ObjectId,
    pub target_type: TargetType,
    pub counter_field: String,
    #[serde(serialize_with = "serialize_object_id_as_hex_string")]
    pub user_id: ObjectId,
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(serialize_with = "serialize_bson_datetime_as_rfc3339_string")]
    pub created_at: DateTime,
    #[serde(serialize_with = "serialize_bson_datetime_as_rfc3339_string")]
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCounter {
    pub target_id: String,
    pub target_type: TargetType,
    pub counter_field: String,
    pub user_id: String,
    #[serde(default)]
    pub value: Option<i64>,
}
