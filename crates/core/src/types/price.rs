//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(12, 2)` and never go through floating point.
//! A [`Price`] is always non-negative and fits that column. Multiplying it by
//! a [`Quantity`] gives the line total used for order totals.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Quantity;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),

    /// The amount does not fit in `NUMERIC(12, 2)`.
    #[error("price cannot exceed {max} (got {0})", max = Price::MAX)]
    TooLarge(Decimal),

    /// The amount has more than two decimal places.
    #[error("price cannot have more than 2 decimal places (got {0})")]
    TooPrecise(Decimal),
}

/// A non-negative unit price with at most two decimal places.
///
/// ## Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use stockroom_core::{Price, Quantity};
///
/// let price = Price::new(Decimal::new(1050, 2)).unwrap(); // 10.50
/// let qty = Quantity::new(3).unwrap();
/// assert_eq!(price.line_total(qty), Some(Decimal::new(3150, 2)));
///
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// assert!(Price::new(Decimal::MAX).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest storable amount: 9,999,999,999.99.
    pub const MAX: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] if `amount` is below zero, above [`Price::MAX`],
    /// or has more than two decimal places.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount > Self::MAX {
            return Err(PriceError::TooLarge(amount));
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise(amount));
        }
        Ok(Self(amount))
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a quantity, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self, quantity: Quantity) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity.get()))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
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
        Ok(Self::new(amount)?)
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert_eq!(
            Price::new(dec!(-0.01)),
            Err(PriceError::Negative(dec!(-0.01)))
        );
    }

    #[test]
    fn test_accepts_zero() {
        assert_eq!(Price::new(dec!(0)).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_line_total() {
        let price = Price::new(dec!(19.99)).unwrap();
        let qty = Quantity::new(3).unwrap();
        assert_eq!(price.line_total(qty), Some(dec!(59.97)));
    }

    #[test]
    fn test_max_matches_column() {
        assert_eq!(Price::MAX, dec!(9999999999.99));
        assert_eq!(Price::new(Price::MAX).unwrap().amount(), Price::MAX);
    }

    #[test]
    fn test_rejects_out_of_column_range() {
        assert_eq!(
            Price::new(dec!(10000000000.00)),
            Err(PriceError::TooLarge(dec!(10000000000.00)))
        );
        assert_eq!(
            Price::new(Decimal::MAX),
            Err(PriceError::TooLarge(Decimal::MAX))
        );
        assert_eq!(
            Price::new(dec!(1.005)),
            Err(PriceError::TooPrecise(dec!(1.005)))
        );
        // Trailing zeros are not extra precision
        assert!(Price::new(dec!(1.500)).is_ok());
    }

    #[test]
    fn test_line_total_of_max_price_fits() {
        let qty = Quantity::new(i32::MAX).unwrap();
        assert!(Price::new(Price::MAX).unwrap().line_total(qty).is_some());
    }

    #[test]
    fn test_deserialize_too_large_fails() {
        assert!(serde_json::from_str::<Price>("\"79228162514264337593543950335\"").is_err());
    }

    #[test]
    fn test_deserialize_from_string_and_number() {
        let from_str: Price = serde_json::from_str("\"10.50\"").unwrap();
        let from_num: Price = serde_json::from_str("10.5").unwrap();
        assert_eq!(from_str.amount(), dec!(10.50));
        assert_eq!(from_num.amount(), dec!(10.5));
    }

    #[test]
    fn test_deserialize_negative_fails() {
        assert!(serde_json::from_str::<Price>("\"-3\"").is_err());
    }
}
