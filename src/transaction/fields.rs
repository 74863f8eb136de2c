//! Validation of the individual fields of transaction request bodies.

use time::Date;

use crate::{
    Error,
    json::Scalar,
    money::{Amount, parse_transaction_amount},
    transaction::TransactionType,
    validation,
};

/// The currency used when a new transaction does not name one.
pub const DEFAULT_CURRENCY: &str = "USD";

pub const MAX_PAYEE_LENGTH: usize = 160;
pub const MAX_NOTE_LENGTH: usize = 1000;

fn invalid(message: &str) -> Error {
    Error::Validation(message.to_owned())
}

pub fn parse_type(value: Option<&str>) -> Result<TransactionType, Error> {
    value
        .unwrap_or_default()
        .parse()
        .map_err(|_| invalid("type must be income|expense"))
}

pub fn parse_amount(value: Option<&Scalar>) -> Result<Amount, Error> {
    match value {
        Some(value) => parse_transaction_amount(value),
        None => Err(invalid("amount invalid (max 2 decimals)")),
    }
}

/// Upper-case and check a currency code, e.g. `usd` becomes `USD`.
pub fn parse_currency(value: Option<&str>) -> Result<String, Error> {
    let currency = value.unwrap_or_default().to_uppercase();

    if validation::currency(&currency) {
        Ok(currency)
    } else {
        Err(invalid("currency invalid (ISO-4217 like)"))
    }
}

pub fn parse_date(value: Option<&str>) -> Result<Date, Error> {
    value
        .and_then(validation::date_ymd)
        .ok_or_else(|| invalid("txn_date must be YYYY-MM-DD"))
}

/// Trim an optional payee and check its length. `None` stays `None`.
pub fn parse_payee(value: Option<String>) -> Result<Option<String>, Error> {
    optional_text(value, MAX_PAYEE_LENGTH, "payee length 1..160")
}

/// Trim an optional note and check its length. `None` stays `None`.
pub fn parse_note(value: Option<String>) -> Result<Option<String>, Error> {
    optional_text(value, MAX_NOTE_LENGTH, "note length 1..1000")
}

fn optional_text(
    value: Option<String>,
    max_length: usize,
    message: &str,
) -> Result<Option<String>, Error> {
    let Some(value) = value else {
        return Ok(None);
    };

    let value = value.trim();
    if validation::string_len(value, 1, max_length) {
        Ok(Some(value.to_owned()))
    } else {
        Err(invalid(message))
    }
}
