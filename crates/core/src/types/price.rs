//! Prices and quantities.
//!
//! Prices are whole minor currency units (no decimals) and must be positive.
//! Quantities are positive counts. Totals are computed in `i64` so a large
//! cart cannot overflow the `i32` column types.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Reasons a price input is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not an integer.
    #[error("price must be a whole number")]
    NotANumber,
    /// The input is zero or negative.
    #[error("price must be greater than zero")]
    NotPositive,
}

/// A positive unit price in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Price(i32);

impl Price {
    /// Build a price from minor units.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotPositive` for zero or negative amounts.
    pub const fn new(minor_units: i32) -> Result<Self, PriceError> {
        if minor_units <= 0 {
            return Err(PriceError::NotPositive);
        }
        Ok(Self(minor_units))
    }

    /// Parse a price typed into an admin form.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotANumber` when the trimmed input is not an
    /// integer and `PriceError::NotPositive` when it is not above zero.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let amount = input
            .trim()
            .parse::<i32>()
            .map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// Minor units.
    #[must_use]
    pub const fn minor_units(self) -> i32 {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: Quantity) -> i64 {
        i64::from(self.0) * i64::from(quantity.get())
    }
}

impl TryFrom<i32> for Price {
    type Error = PriceError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for i32 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reasons a quantity is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative.
    #[error("quantity must be at least 1")]
    NotPositive,
}

/// A positive item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Build a quantity.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::NotPositive` for zero or negative counts.
    pub const fn new(count: i32) -> Result<Self, QuantityError> {
        if count <= 0 {
            return Err(QuantityError::NotPositive);
        }
        Ok(Self(count))
    }

    /// The count.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// One fewer unit, or `None` when this is the last unit.
    #[must_use]
    pub const fn decremented(self) -> Option<Self> {
        if self.0 > 1 { Some(Self(self.0 - 1)) } else { None }
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_padded_integer() {
        assert_eq!(Price::parse(" 1500 ").unwrap().minor_units(), 1500);
    }

    #[test]
    fn test_parse_rejects_decimals_and_words() {
        assert_eq!(Price::parse("12.50"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("cheap"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse(""), Err(PriceError::NotANumber));
    }

    #[test]
    fn test_parse_rejects_zero_and_negative() {
        assert_eq!(Price::parse("0"), Err(PriceError::NotPositive));
        assert_eq!(Price::parse("-3"), Err(PriceError::NotPositive));
    }

    #[test]
    fn test_times_widens_to_i64() {
        let price = Price::new(i32::MAX).unwrap();
        let quantity = Quantity::new(2).unwrap();
        assert_eq!(price.times(quantity), i64::from(i32::MAX) * 2);
    }

    #[test]
    fn test_decremented_stops_at_one() {
        assert_eq!(Quantity::new(3).unwrap().decremented(), Quantity::new(2).ok());
        assert_eq!(Quantity::ONE.decremented(), None);
    }

    #[test]
    fn test_quantity_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("4").unwrap().get(), 4);
    }
}
