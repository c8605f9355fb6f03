//! Lenient value parsing shared by the interpreters and the state importer.
//!
//! Malformed data inside a document never fails an interpretation. Every
//! helper here returns `None` for input it cannot make sense of:
//!
//! - **URIs**: [`to_uri`] resolves relative references against a base
//! - **Dates**: [`parse_date`] tries the RFC 822 and ISO 8601 families
//! - **Numbers**: [`parse_int`] / [`parse_long`] ignore surrounding space
//!
//! # Examples
//!
//! ```
//! use feedloom::util::{parse_date, parse_int};
//!
//! assert!(parse_date("Sat, 07 Sep 2002 00:00:01 GMT").is_some());
//! assert_eq!(parse_int(" 60 "), Some(60));
//! assert_eq!(parse_int("sixty"), None);
//! ```

mod date;
mod uri;

pub use date::parse_date;
pub use uri::{to_uri, with_default_scheme};

/// Separator for multi-valued attributes in the state dialect.
pub const VALUE_SEPARATOR: char = ',';

pub fn parse_int(text: &str) -> Option<i32> {
    text.trim().parse().ok()
}

pub fn parse_long(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

/// Splits a comma separated attribute value, skipping empty parts.
pub fn split_values(text: &str) -> impl Iterator<Item = &str> {
    text.split(VALUE_SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_are_permissive() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("4 2"), None);
        assert_eq!(parse_long("-1"), Some(-1));
        assert_eq!(parse_long("12.5"), None);
    }

    #[test]
    fn test_split_values_skips_blanks() {
        let parts: Vec<_> = split_values("1, 2,,3 ").collect();
        assert_eq!(parts, vec!["1", "2", "3"]);
        assert_eq!(split_values("").count(), 0);
    }
}
