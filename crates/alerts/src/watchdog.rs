//! Deviation classifier (pure, no IO).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fleetstock_core::{DomainError, DomainResult};

/// Severity tiers, ordered. `Critical` is the highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Deviation thresholds as fractions of the baseline, one per severity tier.
///
/// A deviation at or above a tier's threshold (and below the next tier's)
/// classifies at that tier; below `low` the price is unremarkable and no
/// alert is warranted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviationThresholds {
    pub low: Decimal,
    pub medium: Decimal,
    pub high: Decimal,
    pub critical: Decimal,
}

impl Default for DeviationThresholds {
    /// 10% / 25% / 50% / 75%.
    fn default() -> Self {
        Self {
            low: Decimal::new(10, 2),
            medium: Decimal::new(25, 2),
            high: Decimal::new(50, 2),
            critical: Decimal::new(75, 2),
        }
    }
}

impl DeviationThresholds {
    /// Thresholds must be positive and strictly ascending.
    pub fn validate(&self) -> DomainResult<()> {
        if self.low <= Decimal::ZERO {
            return Err(DomainError::validation("low threshold must be positive"));
        }
        if !(self.low < self.medium && self.medium < self.high && self.high < self.critical) {
            return Err(DomainError::validation(
                "thresholds must be strictly ascending (low < medium < high < critical)",
            ));
        }
        Ok(())
    }

    fn classify(&self, magnitude: Decimal) -> Option<Severity> {
        if magnitude >= self.critical {
            Some(Severity::Critical)
        } else if magnitude >= self.high {
            Some(Severity::High)
        } else if magnitude >= self.medium {
            Some(Severity::Medium)
        } else if magnitude >= self.low {
            Some(Severity::Low)
        } else {
            None
        }
    }
}

/// Outcome of a flagged price check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviationCheck {
    /// Signed deviation as a fraction of the baseline (0.50 = 50% above,
    /// -0.30 = 30% below). Full precision; round for display only.
    pub deviation_pct: Decimal,
    pub severity: Severity,
}

/// Grade a proposed unit price against a baseline.
///
/// Returns `None` when the check cannot run (no positive baseline) or when
/// the deviation stays below the lowest threshold. Deviations in either
/// direction are graded; an unusually cheap part is as suspicious as an
/// unusually expensive one.
pub fn evaluate(
    proposed_price: Decimal,
    baseline_price: Decimal,
    thresholds: &DeviationThresholds,
) -> Option<DeviationCheck> {
    if baseline_price <= Decimal::ZERO {
        return None;
    }

    let deviation_pct = (proposed_price - baseline_price) / baseline_price;
    thresholds
        .classify(deviation_pct.abs())
        .map(|severity| DeviationCheck {
            deviation_pct,
            severity,
        })
}
