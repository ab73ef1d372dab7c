//! Environment variable parsing helpers shared by service configs

use std::str::FromStr;

/// Parse an environment variable, falling back to `default` when it is
/// missing or does not parse.
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// Parse an environment variable, `None` if missing or invalid
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_with_default() {
        let result: u32 = parse_env_with_default("BLOG_NONEXISTENT_VAR", 42);
        assert_eq!(result, 42);

        std::env::set_var("BLOG_TEST_POOL", "16");
        let result: u32 = parse_env_with_default("BLOG_TEST_POOL", 4);
        assert_eq!(result, 16);

        std::env::set_var("BLOG_TEST_POOL", "sixteen");
        let result: u32 = parse_env_with_default("BLOG_TEST_POOL", 4);
        assert_eq!(result, 4);
        std::env::remove_var("BLOG_TEST_POOL");
    }
}
