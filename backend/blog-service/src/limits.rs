//! Validation bounds shared by request schemas and the pagination engine.
//!
//! Ranges are inclusive `(min, max)` pairs measured in characters.

/// Documents returned per page by every paginated listing
pub const PAGE_SIZE: u64 = 10;

/// Highest page whose skip offset still fits a 64-bit store integer
pub const MAX_PAGE: u64 = i64::MAX as u64 / PAGE_SIZE;

pub const SHORT_TEXT_MAX_LENGTH: usize = 80;
pub const PASSWORD_LENGTH_RANGE: (usize, usize) = (8, 255);

pub mod user {
    use super::SHORT_TEXT_MAX_LENGTH;

    pub const DISPLAY_NAME_LENGTH_RANGE: (usize, usize) = (2, SHORT_TEXT_MAX_LENGTH);
    pub const USERNAME_LENGTH_RANGE: (usize, usize) = (4, SHORT_TEXT_MAX_LENGTH);
}

/// Initial `likesCount` a client may supply on create
pub const LIKES_COUNT_RANGE: (i64, i64) = (0, 1_000_000_000);

pub mod post {
    pub const CONTENT_LENGTH_RANGE: (usize, usize) = (1, 280);
    pub const CATEGORY_LENGTH_RANGE: (usize, usize) = (1, 20);
}

pub mod comment {
    pub const CONTENT_LENGTH_RANGE: (usize, usize) = (1, 280);
}

pub mod counter {
    pub const VALUE_RANGE: (i64, i64) = (1, 5);
    pub const COUNTER_FIELD_MAX_LENGTH: usize = super::SHORT_TEXT_MAX_LENGTH;
}
