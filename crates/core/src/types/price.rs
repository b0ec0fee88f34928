//! Type-safe price representation using decimal arithmetic.
//!
//! Prices arrive from the products API as JSON numbers (`179.9`) and are
//! written back to storage the same way, but are held as [`Decimal`] in
//! memory so line subtotals and cart totals never pick up float drift.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A unit or line price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an integer number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_deserializes_from_json_number() {
        let price: Price = serde_json::from_str("179.9").unwrap();
        assert_eq!(price, Price::new(Decimal::new(1799, 1)));

        let whole: Price = serde_json::from_str("100").unwrap();
        assert_eq!(whole, Price::from_cents(10_000));
    }

    #[test]
    fn test_price_serializes_as_json_number() {
        let price = Price::from_cents(13_990);
        assert_eq!(serde_json::to_string(&price).unwrap(), "139.9");
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_cents(17_990).to_string(), "$179.90");
        assert_eq!(Price::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_price_times_and_sum() {
        let unit = Price::from_cents(1_999);
        assert_eq!(unit.times(3), Price::from_cents(5_997));

        let total: Price = [Price::from_cents(100), Price::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(350));
    }
}
