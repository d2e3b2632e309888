//! Value objects for the invoice domain.

use std::iter::Sum;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Product identifier (SKU) as known by the inventory service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque reservation token issued by the inventory service.
///
/// Only used as a correlation handle for commit and release calls; the
/// reservation state itself lives in the inventory service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(String);

impl ReservationId {
    /// Wraps a reservation token.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ReservationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ReservationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Fixed-point money amount.
///
/// Backed by `rust_decimal` so unit prices and totals never go through
/// binary floating point arithmetic. Serialized as a JSON number to keep
/// the wire format of the billing API.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    /// Creates a money amount from a decimal value.
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a money amount from minor units (e.g. 1050 = 10.50).
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the underlying decimal amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money(self.0 * Decimal::from(quantity))
    }

    /// Divides evenly across `count` items, rounded to cents.
    ///
    /// Returns zero when `count` is zero.
    pub fn average_over(&self, count: u64) -> Money {
        if count == 0 {
            return Money::zero();
        }
        Money(self.0 / Decimal::from(count)).rounded()
    }

    /// Rounds to two decimal places, half away from zero.
    pub fn rounded(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_product_id_string_conversion() {
        let id = ProductId::new("SKU-001");
        assert_eq!(id.as_str(), "SKU-001");

        let id2: ProductId = "SKU-002".into();
        assert_eq!(id2.as_str(), "SKU-002");
    }

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.amount(), Decimal::from_str("12.34").unwrap());
        assert_eq!(money.to_string(), "12.34");
    }

    #[test]
    fn test_money_multiply_is_exact() {
        // 0.1 * 3 is the classic float trap
        let price = Money::new(Decimal::from_str("0.1").unwrap());
        assert_eq!(price.multiply(3), Money::new(Decimal::from_str("0.3").unwrap()));
    }

    #[test]
    fn test_money_sum() {
        let amounts = [Money::from_cents(10000), Money::from_cents(5000)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total, Money::from_cents(15000));
    }

    #[test]
    fn test_average_over_guards_zero_count() {
        assert_eq!(Money::from_cents(15000).average_over(0), Money::zero());
        assert_eq!(Money::from_cents(15000).average_over(2), Money::from_cents(7500));
    }

    #[test]
    fn test_average_over_rounds_to_cents() {
        // 100.00 / 3 = 33.333.. -> 33.33
        assert_eq!(Money::from_cents(10000).average_over(3), Money::from_cents(3333));
        // 0.05 / 2 = 0.025 -> 0.03
        assert_eq!(Money::from_cents(5).average_over(2), Money::from_cents(3));
    }

    #[test]
    fn test_money_serializes_as_number() {
        let json = serde_json::to_value(Money::from_cents(1250)).unwrap();
        assert_eq!(json, serde_json::json!(12.5));

        let parsed: Money = serde_json::from_value(serde_json::json!(1200)).unwrap();
        assert_eq!(parsed, Money::from_cents(120000));
    }

    #[test]
    fn test_negative_detection() {
        assert!(Money::from_cents(-1).is_negative());
        assert!(!Money::zero().is_negative());
        assert!(!Money::from_cents(1).is_negative());
    }
}
