//! Money and quantity types.
//!
//! Prices use decimal arithmetic end to end: `rust_decimal::Decimal` in Rust,
//! `NUMERIC(15,2)` in `PostgreSQL`, and a decimal string on the serde boundary.
//! Binary floating point never touches a price.
//!
//! Caller input for price and stock arrives as untyped form strings. The
//! `sanitize` constructors collapse anything that is not a non-negative number
//! to zero instead of rejecting the write.

use core::fmt;
use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`] or [`Stock`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The input string is empty.
    #[error("amount cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("amount is not a number: {0}")]
    Invalid(String),
    /// The input is below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// The input does not fit the storage column.
    #[error("amount is out of range")]
    OutOfRange,
}

/// A non-negative monetary amount with at most two fractional digits.
///
/// ## Constraints
///
/// - Never negative
/// - Rounded to 2 decimal places (midpoint away from zero, like `PostgreSQL`)
/// - At most `9999999999999.99` (`NUMERIC(15,2)`)
///
/// ## Examples
///
/// ```
/// use commerce_core::Price;
///
/// assert_eq!(Price::parse("19.99").unwrap().to_string(), "19.99");
/// assert_eq!(Price::sanitize(Some("-5")).to_string(), "0");
/// assert_eq!(Price::sanitize(Some("abc")).to_string(), "0");
/// assert_eq!(Price::sanitize(None).to_string(), "0");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// The zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Number of fractional digits kept.
    pub const SCALE: u32 = 2;

    /// Largest value a `NUMERIC(15,2)` column accepts.
    pub const MAX: Self = Self(Decimal::from_parts(
        // 999_999_999_999_999 split into (lo, mid, hi)
        2_764_472_319,
        232_830,
        0,
        false,
        2,
    ));

    /// Parse a price from caller input.
    ///
    /// Accepts plain decimals (`"19.99"`) and scientific notation (`"1e3"`).
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not a number, negative, or
    /// larger than [`Price::MAX`] after rounding.
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        let value = parse_decimal(s)?;
        Self::try_from_decimal(value)
    }

    /// Build a price from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative or out of range.
    pub fn try_from_decimal(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative);
        }

        let rounded =
            value.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded > Self::MAX.0 {
            return Err(AmountError::OutOfRange);
        }

        Ok(Self(rounded.normalize()))
    }

    /// Coerce untrusted input to a price.
    ///
    /// Absent, non-numeric, negative and out-of-range input all become
    /// [`Price::ZERO`].
    #[must_use]
    pub fn sanitize(input: Option<&str>) -> Self {
        input.and_then(|s| Self::parse(s).ok()).unwrap_or(Self::ZERO)
    }

    /// Returns the underlying decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format with exactly two fractional digits (e.g. `"19.90"`).
    #[must_use]
    pub fn format_money(&self) -> String {
        format!("{:.2}", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Price {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::try_from_decimal(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

/// Units in stock. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Stock(i32);

impl Stock {
    /// Zero units.
    pub const ZERO: Self = Self(0);

    /// Create a stock level.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::Negative` if `units` is below zero.
    pub const fn new(units: i32) -> Result<Self, AmountError> {
        if units < 0 {
            return Err(AmountError::Negative);
        }
        Ok(Self(units))
    }

    /// Parse a stock level from caller input.
    ///
    /// Fractional values are truncated toward zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not a number, negative, or
    /// does not fit in an `i32`.
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        let value = parse_decimal(s)?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative);
        }

        let units = value.trunc().to_i32().ok_or(AmountError::OutOfRange)?;
        Self::new(units)
    }

    /// Coerce untrusted input to a stock level.
    ///
    /// Absent, non-numeric, negative and out-of-range input all become zero.
    #[must_use]
    pub fn sanitize(input: Option<&str>) -> Self {
        input.and_then(|s| Self::parse(s).ok()).unwrap_or(Self::ZERO)
    }

    /// Returns the number of units.
    #[must_use]
    pub const fn units(&self) -> i32 {
        self.0
    }
}

/// New products start with one unit in stock.
impl Default for Stock {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<i32> for Stock {
    type Error = AmountError;

    fn try_from(units: i32) -> Result<Self, Self::Error> {
        Self::new(units)
    }
}

impl From<Stock> for i32 {
    fn from(stock: Stock) -> Self {
        stock.0
    }
}

impl fmt::Display for Stock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Product rating. Absent or non-positive ratings are stored as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(i32);

impl Rating {
    /// Clamp caller input to a valid rating.
    #[must_use]
    pub fn sanitize(input: Option<i32>) -> Self {
        Self(input.filter(|r| *r > 0).unwrap_or(0))
    }

    /// Returns the rating value.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

fn parse_decimal(s: &str) -> Result<Decimal, AmountError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| AmountError::Invalid(trimmed.to_owned()))
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::try_from_decimal(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// Implements `sqlx` support for a non-negative `i32` newtype.
macro_rules! impl_pg_int4 {
    ($name:ident, $check:expr) => {
        #[cfg(feature = "postgres")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                let check: fn(i32) -> Result<$name, AmountError> = $check;
                Ok(check(raw)?)
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

impl_pg_int4!(Stock, Stock::new);
impl_pg_int4!(Rating, |raw| Ok(Rating::sanitize(Some(raw))));
