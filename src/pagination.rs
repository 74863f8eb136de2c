//! This modules defines the common functionality for paging data.

use serde::Serialize;

/// The config for pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    /// The number of items to return when the request does not specify a limit.
    pub default_limit: i64,
    /// The largest number of items a single request may ask for.
    pub max_limit: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 200,
        }
    }
}

/// A page of results expressed as `LIMIT`/`OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    /// Build a page from the raw `limit` and `offset` query parameters.
    ///
    /// Parameters are never rejected: a limit is clamped to
    /// `1..=config.max_limit` and an offset to `0..`, and anything that is not
    /// an integer counts as zero.
    pub fn from_query(limit: Option<&str>, offset: Option<&str>, config: PaginationConfig) -> Self {
        let limit = match limit {
            Some(raw) => parse_lenient(raw).clamp(1, config.max_limit),
            None => config.default_limit,
        };
        let offset = offset.map_or(0, |raw| parse_lenient(raw).max(0));

        Self { limit, offset }
    }
}

/// Parse the leading integer of `raw`, e.g. `"20abc"` is 20 and `"abc"` is 0.
fn parse_lenient(raw: &str) -> i64 {
    let raw = raw.trim();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw.strip_prefix('+').unwrap_or(raw)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end]
        .parse::<i64>()
        .map_or(0, |value| sign * value)
}
