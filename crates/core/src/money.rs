//! Fixed-point decimal helpers for monetary and quantity values.
//!
//! All quantities and costs in the ledger are `rust_decimal::Decimal`, never
//! binary floats: weighted-average costs are recomputed across long movement
//! chains and must not accumulate binary rounding drift. Rounding to the
//! currency's minor unit happens only at reporting boundaries, never in the
//! middle of a costing chain.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{DomainError, DomainResult};

/// Decimal places of the currency minor unit (cents).
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Round a monetary value to the currency's minor unit.
///
/// Commercial rounding (midpoint away from zero). Only for reporting/display
/// values; stored averages keep full precision.
pub fn round_minor(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Validate that a value is strictly positive (quantities for receipts and
/// consumptions; zero or negative is a validation error, not a no-op).
pub fn positive(name: &str, value: Decimal) -> DomainResult<Decimal> {
    if value <= Decimal::ZERO {
        return Err(DomainError::validation(format!(
            "{name} must be positive (got {value})"
        )));
    }
    Ok(value)
}

/// Validate that a value is zero or greater (unit costs; zero is a valid
/// cost, e.g. warranty replacements).
pub fn non_negative(name: &str, value: Decimal) -> DomainResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(DomainError::validation(format!(
            "{name} must not be negative (got {value})"
        )));
    }
    Ok(value)
}

/// Validate that a value is non-zero (adjustment deltas).
pub fn non_zero(name: &str, value: Decimal) -> DomainResult<Decimal> {
    if value.is_zero() {
        return Err(DomainError::validation(format!("{name} must not be zero")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn round_minor_uses_commercial_rounding() {
        assert_eq!(round_minor(dec!(1.005)), dec!(1.01));
        assert_eq!(round_minor(dec!(1.004)), dec!(1.00));
        assert_eq!(round_minor(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_minor(dec!(110)), dec!(110.00));
    }

    #[test]
    fn positive_rejects_zero_and_negative() {
        assert!(positive("quantity", dec!(0.001)).is_ok());
        assert!(positive("quantity", Decimal::ZERO).is_err());
        assert!(positive("quantity", dec!(-1)).is_err());
    }

    #[test]
    fn non_negative_accepts_zero_cost() {
        assert_eq!(non_negative("unitCost", Decimal::ZERO), Ok(Decimal::ZERO));
        assert!(non_negative("unitCost", dec!(-0.01)).is_err());
    }

    #[test]
    fn non_zero_rejects_zero_delta() {
        assert!(non_zero("delta", dec!(-3)).is_ok());
        assert!(non_zero("delta", Decimal::ZERO).is_err());
    }
}
