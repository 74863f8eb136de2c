//! Pure checks for the shape of incoming request fields.
//!
//! These functions only answer "is this well formed?". Turning a value into a
//! domain type (and choosing the error message) is left to the caller.

use email_address::EmailAddress;
use time::{Date, macros::format_description};

use crate::{json::Scalar, transaction::TransactionType};

/// The longest email address that will be stored.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Whether `value` is a syntactically valid email address.
pub fn email(value: &str) -> bool {
    value.len() <= MAX_EMAIL_LENGTH && EmailAddress::is_valid(value)
}

/// Whether the number of characters in `value` is within `min..=max`.
///
/// Characters are counted as Unicode scalar values, not bytes, so "café" has
/// length four.
pub fn string_len(value: &str, min: usize, max: usize) -> bool {
    let length = value.chars().count();

    (min..=max).contains(&length)
}

/// Whether `value` is an acceptable password length.
pub fn password(value: &str) -> bool {
    string_len(value, 8, 128)
}

/// Whether `value` is a colour code of the form `#RRGGBB`.
pub fn color_hex(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(digits) => digits.len() == 6 && digits.bytes().all(|byte| byte.is_ascii_hexdigit()),
        None => false,
    }
}

/// Parse a positive integer ID from a path segment or query parameter.
pub fn parse_id(value: &str) -> Option<i64> {
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    value.parse::<i64>().ok().filter(|id| *id > 0)
}

/// Parse a positive integer ID from a JSON string or number.
pub fn id(value: &Scalar) -> Option<i64> {
    match value {
        Scalar::Number(number) => number.as_i64().filter(|id| *id > 0),
        Scalar::Text(text) => parse_id(text),
        Scalar::Bool(_) => None,
    }
}

/// Interpret `true`, `false`, `1`, `0` (as JSON booleans, numbers or strings)
/// as a boolean.
pub fn bool_like(value: &Scalar) -> Option<bool> {
    match value {
        Scalar::Bool(flag) => Some(*flag),
        Scalar::Number(number) => match number.as_u64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Scalar::Text(text) => match text.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
    }
}

/// Parse a `YYYY-MM-DD` string that names a real calendar date.
pub fn date_ymd(value: &str) -> Option<Date> {
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, byte)| i == 4 || i == 7 || byte.is_ascii_digit());

    if !well_formed {
        return None;
    }

    Date::parse(value, format_description!("[year]-[month]-[day]")).ok()
}

/// Whether `value` looks like a decimal amount with at most two fractional
/// digits, e.g. `12`, `12.5`, `-0.25`.
pub fn money(value: &str) -> bool {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    let whole_ok = !whole.is_empty() && whole.bytes().all(|byte| byte.is_ascii_digit());
    let fraction_ok = match fraction {
        Some(fraction) => {
            (1..=2).contains(&fraction.len()) && fraction.bytes().all(|byte| byte.is_ascii_digit())
        }
        None => true,
    };

    whole_ok && fraction_ok
}

/// Whether `value` is a three letter, upper case currency code.
pub fn currency(value: &str) -> bool {
    value.len() == 3 && value.bytes().all(|byte| byte.is_ascii_uppercase())
}

/// Whether `value` is one of the known transaction types.
pub fn transaction_type(value: &str) -> bool {
    value.parse::<TransactionType>().is_ok()
}
