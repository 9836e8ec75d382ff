//! Monetary amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount of money in a specific currency.
///
/// The orchestrator performs no rounding or currency conversion; the
/// value is carried unchanged between the caller, the compliance
/// service, and the ledger. Serializes as `{ "value": 100.0,
/// "currency": "USD" }` with `value` as a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub value: Decimal,
    pub currency: String,
}

impl Money {
    /// Creates a money value.
    pub fn new(value: Decimal, currency: impl Into<String>) -> Self {
        Self {
            value,
            currency: currency.into(),
        }
    }

    /// Returns true if the value is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.value > Decimal::ZERO
    }

    /// Returns a copy of this amount denominated in another currency.
    ///
    /// Used when the settlement currency is resolved from the source
    /// account; the numeric value is never converted.
    pub fn with_currency(&self, currency: impl Into<String>) -> Self {
        Self {
            value: self.value,
            currency: currency.into(),
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_check() {
        assert!(Money::new(Decimal::from(100), "USD").is_positive());
        assert!(!Money::new(Decimal::ZERO, "USD").is_positive());
        assert!(!Money::new(Decimal::from(-5), "USD").is_positive());
    }

    #[test]
    fn with_currency_keeps_value() {
        let eur = Money::new(Decimal::from(250), "EUR");
        let usd = eur.with_currency("USD");
        assert_eq!(usd.value, eur.value);
        assert_eq!(usd.currency, "USD");
    }

    #[test]
    fn serializes_value_as_number() {
        let money = Money::new(Decimal::from(100), "USD");
        let json = serde_json::to_value(&money).unwrap();
        assert!(json["value"].is_number());
        assert_eq!(json["currency"], "USD");
    }

    #[test]
    fn serialization_roundtrip() {
        let money = Money::new(Decimal::from(42), "GBP");
        let json = serde_json::to_string(&money).unwrap();
        let deserialized: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(money, deserialized);
    }
}
