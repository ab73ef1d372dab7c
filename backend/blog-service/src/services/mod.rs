/// Business logic layer for blog-service
///
/// This module provides high-level operations:
/// - User service: Registration, profile edits, lookups
/// - Post service: Authoring, listings, likes
/// - Comment service: Comments on posts, likes
/// - Counter service: View/rating fact ingestion and lookup
///
/// Each operation resolves the referenced entity, checks existence and
/// ownership, then mutates or fetches a narrowed field set.
pub mod comments;
pub mod counters;
pub mod posts;
pub mod users;

pub use comments::CommentService;
pub use counters::CounterService;
pub use posts::PostService;
pub use users::UserService;

use crate::error::{AppError, Result};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};

/// Ids arrive validated; a parse failure here is still a client error
pub fn parse_object_id(value: &str) -> Result<ObjectId> {
    ObjectId::parse_str(value).map_err(|_| AppError::BadRequest(format!("invalid id: {}", value)))
}

pub(crate) fn object_id_field(document: &Document, field: &str) -> Result<ObjectId> {
    document
        .get_object_id(field)
        .map_err(|_| AppError::Internal(format!("stored document has no valid {}", field)))
}

/// Read a counter field, treating absent or non-numeric values as zero
pub(crate) fn count_field(document: &Document, field: &str) -> i64 {
    match document.get(field) {
        Some(Bson::Int32(n)) => i64::from(*n),
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Double(n)) => *n as i64,
        _ => 0,
    }
}
