//! Money value object

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::errors::{DomainError, DomainResult};

/// Currency-tagged decimal amount.
///
/// Immutable: every operation produces a new value. Arithmetic between
/// different currencies is refused, never converted. The currency code
/// is normalized to upper case on construction, so `"egp"` and `"EGP"`
/// denote the same currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl Money {
    /// Create a new amount. Fails on negative amounts and on currency
    /// codes that are not exactly three ASCII letters.
    pub fn new(amount: Decimal, currency: &str) -> DomainResult<Self> {
        if amount < Decimal::ZERO {
            return Err(DomainError::Validation(format!(
                "Money amount cannot be negative: {}",
                amount
            )));
        }
        Ok(Self {
            amount,
            currency: normalize_currency(currency)?,
        })
    }

    pub fn zero(currency: &str) -> DomainResult<Self> {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Sum of two amounts in the same currency.
    pub fn add(&self, other: &Money) -> DomainResult<Money> {
        self.ensure_same_currency(other)?;
        Ok(Money {
            amount: self.amount + other.amount,
            currency: self.currency.clone(),
        })
    }

    /// Difference of two amounts in the same currency; fails if the
    /// result would be negative (Money is unsigned by construction).
    pub fn sub(&self, other: &Money) -> DomainResult<Money> {
        self.ensure_same_currency(other)?;
        if other.amount > self.amount {
            return Err(DomainError::Validation(format!(
                "Cannot subtract {} from {}: result would be negative",
                other, self
            )));
        }
        Ok(Money {
            amount: self.amount - other.amount,
            currency: self.currency.clone(),
        })
    }

    /// Unit price times a quantity. Never fails: non-negative times a
    /// count stays non-negative.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            amount: self.amount * Decimal::from(quantity),
            currency: self.currency.clone(),
        }
    }

    fn ensure_same_currency(&self, other: &Money) -> DomainResult<()> {
        if self.currency != other.currency {
            return Err(DomainError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

fn normalize_currency(code: &str) -> DomainResult<String> {
    let trimmed = code.trim();
    if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(DomainError::Validation(format!(
            "Invalid currency code: {:?}",
            code
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn egp(amount: i64) -> Money {
        Money::new(Decimal::from(amount), "EGP").unwrap()
    }

    #[test]
    fn currency_is_normalized_to_upper_case() {
        let lower = Money::new(Decimal::from(10), "egp").unwrap();
        let upper = Money::new(Decimal::from(10), "EGP").unwrap();
        assert_eq!(lower.currency(), "EGP");
        assert_eq!(lower, upper);
    }

    #[test]
    fn scale_does_not_affect_equality() {
        let a = Money::new(Decimal::from(10), "EGP").unwrap();
        let b = Money::new(Decimal::new(1000, 2), "EGP").unwrap(); // 10.00
        assert_eq!(a, b);
    }

    #[test]
    fn negative_amount_is_rejected() {
        let result = Money::new(Decimal::from(-1), "EGP");
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn bad_currency_codes_are_rejected() {
        for code in ["", "EG", "EGPT", "E1P", "10$"] {
            assert!(
                Money::new(Decimal::ONE, code).is_err(),
                "expected rejection for {:?}",
                code
            );
        }
    }

    #[test]
    fn add_same_currency() {
        let sum = egp(10).add(&egp(5)).unwrap();
        assert_eq!(sum, egp(15));
    }

    #[test]
    fn add_currency_mismatch_fails() {
        let usd = Money::new(Decimal::from(5), "USD").unwrap();
        let result = egp(10).add(&usd);
        assert!(matches!(result, Err(DomainError::CurrencyMismatch { .. })));
    }

    #[test]
    fn sub_below_zero_fails() {
        let result = egp(5).sub(&egp(10));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn sub_to_exactly_zero() {
        let result = egp(10).sub(&egp(10)).unwrap();
        assert!(result.is_zero());
    }

    #[test]
    fn multiply_by_quantity() {
        let price = Money::new(Decimal::new(2550, 2), "EGP").unwrap(); // 25.50
        let total = price.multiply(3);
        assert_eq!(total, Money::new(Decimal::new(7650, 2), "EGP").unwrap());
    }

    #[test]
    fn multiply_by_zero_is_zero() {
        assert!(egp(10).multiply(0).is_zero());
    }

    #[test]
    fn display_includes_currency() {
        assert_eq!(egp(10).to_string(), "10 EGP");
        let fractional = Money::new(Decimal::new(1050, 2), "EGP").unwrap();
        assert_eq!(fractional.to_string(), "10.50 EGP");
    }
}
