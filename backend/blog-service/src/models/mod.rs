/// Data models for blog-service
///
/// This module defines structures for:
/// - User: Account profile (the password never leaves the store)
/// - Post: Short text posts with optional attachment
/// - Comment: Comments on posts
/// - Counter: View/rating fact records aggregated elsewhere
///
/// Stored documents deserialize from BSON and serialize to the JSON wire
/// shape: `_id` becomes a hex `id`, references become hex strings and
/// timestamps become RFC 3339 strings.
pub mod comment;
pub mod counter;
pub mod post;
pub mod user;

pub use comment::{Comment, CreateComment, EditComment, COMMENT_FIELDS};
pub use counter::{Counter, CreateCounter, TargetType, COUNTER_FIELDS};
pub use post::{AuthorSummary, CreatePost, EditPost, Post, POST_FIELDS};
pub use user::{CreateUser, EditUser, User, USER_FIELDS};

use mongodb::bson::serde_helpers::serialize_bson_datetime_as_rfc3339_string;
use mongodb::bson::DateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize_optional_datetime<S>(
    value: &Option<DateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(datetime) => serialize_bson_datetime_as_rfc3339_string(datetime, serializer),
        None => serializer.serialize_none(),
    }
}

/// Distinguish an explicit `null` from an absent field: absent stays
/// `None` via `#[serde(default)]`, present becomes `Some(value)`.
pub fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// `{ total }` returned by like routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeTotal {
    pub total: i64,
}
