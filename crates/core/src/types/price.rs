//! Type-safe price representation using decimal arithmetic.
//!
//! The catalog API sends prices as JSON numbers (`139.9`). Parsing goes
//! through `rust_decimal` so the value is kept exactly as sent. It is written
//! back as a number when a number holds it exactly, and as a decimal string
//! otherwise, so a persisted cart reads back to the same price.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A product price in the store currency's standard unit (e.g., reais, not centavos).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Price {
    /// Written as a JSON number when the number reads back to the same
    /// digits, otherwise as a string so no precision is lost.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.scale() == 0
            && let Some(whole) = self.0.to_i64()
        {
            return serializer.serialize_i64(whole);
        }
        match self.0.to_f64() {
            Some(value) if value.to_string() == self.0.to_string() => {
                serializer.serialize_f64(value)
            }
            _ => serializer.collect_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_parses_json_number() {
        let price: Price = serde_json::from_str("139.9").unwrap();
        assert_eq!(price.amount(), Decimal::new(1399, 1));
    }

    #[test]
    fn test_price_parses_json_string() {
        let price: Price = serde_json::from_str("\"59.90\"").unwrap();
        assert_eq!(price.amount(), Decimal::new(5990, 2));
    }

    #[test]
    fn test_price_serializes_as_number() {
        let price = Price::new(Decimal::new(1399, 1));
        assert_eq!(serde_json::to_string(&price).unwrap(), "139.9");
    }

    #[test]
    fn test_whole_price_serializes_as_integer() {
        let price: Price = serde_json::from_str("200").unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "200");
    }

    #[test]
    fn test_trailing_zeros_stay_a_string() {
        let price: Price = serde_json::from_str("\"59.90\"").unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"59.90\"");

        let price = Price::new(Decimal::new(20000, 2));
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"200.00\"");
    }

    #[test]
    fn test_price_beyond_f64_precision_is_kept() {
        let price: Price = serde_json::from_str("\"12345678901.123456789\"").unwrap();

        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"12345678901.123456789\"");

        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
        assert_eq!(back.amount().scale(), 9);
    }

    #[test]
    fn test_price_display_two_decimals() {
        assert_eq!(Price::new(Decimal::new(1399, 1)).to_string(), "139.90");
        assert_eq!(Price::new(Decimal::new(200, 0)).to_string(), "200.00");
    }
}
