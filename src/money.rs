//! Exact decimal money amounts.

use std::{
    fmt::Display,
    ops::{Add, Sub},
};

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::{Error, json::Scalar, validation};

/// The largest amount, in cents, that a single transaction may carry.
pub const MAX_TRANSACTION_CENTS: i64 = 999_999_999_999;

/// A money amount with exactly two fractional digits.
///
/// Amounts are stored in the database as integer cents and serialized as
/// strings (e.g. `"12.34"`) so that no floating point conversion happens
/// between the client and the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// An amount of zero.
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Create an amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Parse an amount such as `12`, `12.5` or `-0.25`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if `text` is not a number with at most
    /// two fractional digits.
    pub fn parse(text: &str) -> Result<Self, Error> {
        if !validation::money(text) {
            return Err(invalid_amount());
        }

        let mut value = Decimal::from_str_exact(text).map_err(|_| invalid_amount())?;
        value.rescale(2);

        Ok(Self(value))
    }

    /// The amount as a whole number of cents.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if the amount does not fit in an `i64`.
    pub fn cents(&self) -> Result<i64, Error> {
        i64::try_from(self.0.mantissa()).map_err(|_| invalid_amount())
    }

    /// Whether the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

fn invalid_amount() -> Error {
    Error::Validation("amount invalid (max 2 decimals)".to_owned())
}

/// Parse and range check the amount of a transaction.
///
/// The value may be a JSON string or number. Numbers are read from their
/// textual form so that `12.34` stays exactly `12.34`.
///
/// # Errors
///
/// Returns an [Error::Validation] if the amount is malformed, not positive, or
/// larger than [MAX_TRANSACTION_CENTS].
pub fn parse_transaction_amount(value: &Scalar) -> Result<Amount, Error> {
    if let Scalar::Bool(_) = value {
        return Err(invalid_amount());
    }

    let amount = Amount::parse(&value.to_text())?;
    let cents = amount.cents()?;

    if !amount.is_positive() || cents > MAX_TRANSACTION_CENTS {
        return Err(Error::Validation(
            "amount must be between 0.01 and 9999999999.99".to_owned(),
        ));
    }

    Ok(amount)
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod amount_tests {
    use serde_json::Number;

    use crate::{Error, json::Scalar};

    use super::{Amount, parse_transaction_amount};

    #[test]
    fn parse_pads_to_two_decimals() {
        assert_eq!(Amount::parse("12").unwrap().to_string(), "12.00");
        assert_eq!(Amount::parse("12.5").unwrap().to_string(), "12.50");
        assert_eq!(Amount::parse("12.34").unwrap().to_string(), "12.34");
    }

    #[test]
    fn parse_rejects_three_decimals() {
        assert!(matches!(Amount::parse("1.234"), Err(Error::Validation(_))));
    }

    #[test]
    fn cents_round_trip() {
        let amount = Amount::parse("42.50").unwrap();

        assert_eq!(amount.cents(), Ok(4250));
        assert_eq!(Amount::from_cents(4250), amount);
    }

    #[test]
    fn sums_are_exact() {
        let total = Amount::from_cents(10) + Amount::from_cents(20);

        assert_eq!(total.to_string(), "0.30");
    }

    #[test]
    fn negative_difference_keeps_two_decimals() {
        let net = Amount::from_cents(100) - Amount::from_cents(610);

        assert_eq!(net.to_string(), "-5.10");
    }

    #[test]
    fn zero_formats_with_two_decimals() {
        assert_eq!(Amount::ZERO.to_string(), "0.00");
        assert_eq!(serde_json::to_string(&Amount::ZERO).unwrap(), r#""0.00""#);
    }

    #[test]
    fn transaction_amount_from_json_number_is_exact() {
        let number: Number = serde_json::from_str("12.34").unwrap();

        let amount = parse_transaction_amount(&Scalar::Number(number)).unwrap();

        assert_eq!(amount.cents(), Ok(1234));
    }

    #[test]
    fn transaction_amount_must_be_positive() {
        let zero = parse_transaction_amount(&Scalar::Text("0".to_owned()));
        let negative = parse_transaction_amount(&Scalar::Text("-3.00".to_owned()));

        assert!(matches!(zero, Err(Error::Validation(_))));
        assert!(matches!(negative, Err(Error::Validation(_))));
    }

    #[test]
    fn transaction_amount_has_an_upper_bound() {
        let max = parse_transaction_amount(&Scalar::Text("9999999999.99".to_owned()));
        let too_big = parse_transaction_amount(&Scalar::Text("10000000000.00".to_owned()));

        assert!(max.is_ok());
        assert!(matches!(too_big, Err(Error::Validation(_))));
    }

    #[test]
    fn transaction_amount_rejects_bools() {
        let result = parse_transaction_amount(&Scalar::Bool(true));

        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
