//! Username format rule.
//!
//! A username is ASCII letters, digits and single dots. It may not start or
//! end with a dot and may not contain two dots in a row.

use super::FormatViolation;
use crate::limits::user::USERNAME_LENGTH_RANGE;
use once_cell::sync::Lazy;
use regex::Regex;

pub const CODE: &str = "name.username";

static ALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9.]+$").expect("username pattern must compile"));

static BAD_DOTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.{2,}|^\.|\.$").expect("username dot pattern must compile"));

const VIOLATION: FormatViolation = FormatViolation {
    code: CODE,
    message: "is not a valid username!",
};

pub fn is_valid(value: &str) -> bool {
    let (min, max) = USERNAME_LENGTH_RANGE;
    // ASCII-only, so byte length is the character count
    (min..=max).contains(&value.len())
        && ALLOWED_CHARS.is_match(value)
        && !BAD_DOTS.is_match(value)
}

/// Usernames are stored exactly as given
pub fn normalize(value: &str) -> Result<String, FormatViolation> {
    if is_valid(value) {
        Ok(value.to_string())
    } else {
        Err(VIOLATION)
    }
}
