//! Weighted-average costing engine.
//!
//! Pure calculation consumed by the [`InventoryItem`](crate::item::InventoryItem)
//! aggregate: given the item's previous state and a movement, compute the new
//! stock level, the new weighted-average unit cost, and the movement's value.
//! No IO, fully deterministic, unit-testable without a store.
//!
//! All arithmetic is fixed-point decimal at full precision; only `total_cost`
//! (a reporting figure) is rounded to the currency minor unit. The running
//! average is never rounded mid-chain.

use rust_decimal::Decimal;

use fleetstock_core::money::{non_negative, non_zero, positive, round_minor};
use fleetstock_core::{DomainError, DomainResult};

use crate::movement::MovementType;

/// Result of applying one movement to an item's costing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostingOutcome {
    pub new_stock: Decimal,
    pub new_avg_cost: Decimal,
    /// Per-unit valuation of this movement: the received cost for receipts,
    /// the current average for consumptions and adjustments.
    pub unit_cost: Decimal,
    /// Movement value, rounded to the currency minor unit. Signed for
    /// adjustments (follows the delta), positive otherwise.
    pub total_cost: Decimal,
}

/// Compute the costing outcome of a movement.
///
/// `quantity` is the positive magnitude for receipts and consumptions, and
/// the signed delta for adjustments. `unit_cost` is only meaningful for
/// receipts; issues and adjustments are valued at `previous_avg_cost`
/// (standard weighted-average costing: consumption never changes the
/// average).
pub fn compute(
    previous_stock: Decimal,
    previous_avg_cost: Decimal,
    movement_type: MovementType,
    quantity: Decimal,
    unit_cost: Decimal,
) -> DomainResult<CostingOutcome> {
    non_negative("previousStock", previous_stock)?;
    non_negative("previousAvgCost", previous_avg_cost)?;

    match movement_type {
        MovementType::Receipt => receipt(previous_stock, previous_avg_cost, quantity, unit_cost),
        MovementType::Consumption => consumption(previous_stock, previous_avg_cost, quantity),
        MovementType::Adjustment => adjustment(previous_stock, previous_avg_cost, quantity),
    }
}

fn receipt(
    previous_stock: Decimal,
    previous_avg_cost: Decimal,
    quantity: Decimal,
    unit_cost: Decimal,
) -> DomainResult<CostingOutcome> {
    positive("quantity", quantity)?;
    non_negative("unitCost", unit_cost)?;

    let new_stock = previous_stock + quantity;
    // First receipt into an empty bin sets the average outright; otherwise
    // the receipt blends in stock-weighted, so a zero-cost receipt pulls the
    // average down proportionally, never to zero.
    let new_avg_cost = if previous_stock.is_zero() {
        unit_cost
    } else {
        (previous_stock * previous_avg_cost + quantity * unit_cost) / new_stock
    };

    Ok(CostingOutcome {
        new_stock,
        new_avg_cost,
        unit_cost,
        total_cost: round_minor(quantity * unit_cost),
    })
}

fn consumption(
    previous_stock: Decimal,
    previous_avg_cost: Decimal,
    quantity: Decimal,
) -> DomainResult<CostingOutcome> {
    positive("quantity", quantity)?;

    if quantity > previous_stock {
        return Err(DomainError::insufficient_stock(quantity, previous_stock));
    }

    Ok(CostingOutcome {
        new_stock: previous_stock - quantity,
        new_avg_cost: previous_avg_cost,
        unit_cost: previous_avg_cost,
        total_cost: round_minor(quantity * previous_avg_cost),
    })
}

fn adjustment(
    previous_stock: Decimal,
    previous_avg_cost: Decimal,
    delta: Decimal,
) -> DomainResult<CostingOutcome> {
    non_zero("delta", delta)?;

    let new_stock = previous_stock + delta;
    if new_stock < Decimal::ZERO {
        return Err(DomainError::invalid_adjustment(delta, previous_stock));
    }

    // Corrections are valued at the current average in both directions:
    // a positive delta is a receipt at current average (no cost impact),
    // a negative delta decreases stock without changing the average.
    Ok(CostingOutcome {
        new_stock,
        new_avg_cost: previous_avg_cost,
        unit_cost: previous_avg_cost,
        total_cost: round_minor(delta * previous_avg_cost),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn first_receipt_sets_average_to_unit_cost() {
        let out = compute(dec!(0), dec!(0), MovementType::Receipt, dec!(10), dec!(100)).unwrap();
        assert_eq!(out.new_stock, dec!(10));
        assert_eq!(out.new_avg_cost, dec!(100));
        assert_eq!(out.total_cost, dec!(1000.00));
    }

    #[test]
    fn receipt_blends_stock_weighted_average() {
        // 10 @ 100 on hand, receive 5 @ 130 -> (10*100 + 5*130) / 15 = 110
        let out = compute(dec!(10), dec!(100), MovementType::Receipt, dec!(5), dec!(130)).unwrap();
        assert_eq!(out.new_stock, dec!(15));
        assert_eq!(out.new_avg_cost, dec!(110));
    }

    #[test]
    fn zero_cost_receipt_is_valid_and_weighted() {
        // Warranty replacement: 10 @ 100 plus 10 free -> average halves, not zero.
        let out = compute(dec!(10), dec!(100), MovementType::Receipt, dec!(10), dec!(0)).unwrap();
        assert_eq!(out.new_avg_cost, dec!(50));
        assert_eq!(out.total_cost, dec!(0.00));
    }

    #[test]
    fn receipt_into_emptied_bin_resets_average() {
        let out = compute(dec!(0), dec!(87.50), MovementType::Receipt, dec!(4), dec!(20)).unwrap();
        assert_eq!(out.new_avg_cost, dec!(20));
    }

    #[test]
    fn receipt_rejects_non_positive_quantity_and_negative_cost() {
        assert!(compute(dec!(0), dec!(0), MovementType::Receipt, dec!(0), dec!(1)).is_err());
        assert!(compute(dec!(0), dec!(0), MovementType::Receipt, dec!(-1), dec!(1)).is_err());
        assert!(compute(dec!(0), dec!(0), MovementType::Receipt, dec!(1), dec!(-1)).is_err());
    }

    #[test]
    fn consumption_preserves_average_and_values_at_average() {
        let out =
            compute(dec!(15), dec!(110), MovementType::Consumption, dec!(4), dec!(0)).unwrap();
        assert_eq!(out.new_stock, dec!(11));
        assert_eq!(out.new_avg_cost, dec!(110));
        assert_eq!(out.unit_cost, dec!(110));
        assert_eq!(out.total_cost, dec!(440.00));
    }

    #[test]
    fn consumption_beyond_stock_is_insufficient_stock() {
        let err =
            compute(dec!(11), dec!(110), MovementType::Consumption, dec!(20), dec!(0)).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                requested: dec!(20),
                available: dec!(11),
            }
        );
    }

    #[test]
    fn consuming_exactly_all_stock_is_allowed() {
        let out =
            compute(dec!(5), dec!(10), MovementType::Consumption, dec!(5), dec!(0)).unwrap();
        assert_eq!(out.new_stock, dec!(0));
        assert_eq!(out.new_avg_cost, dec!(10));
    }

    #[test]
    fn adjustment_never_changes_average() {
        let up = compute(dec!(10), dec!(42), MovementType::Adjustment, dec!(3), dec!(0)).unwrap();
        assert_eq!(up.new_stock, dec!(13));
        assert_eq!(up.new_avg_cost, dec!(42));
        assert_eq!(up.total_cost, dec!(126.00));

        let down =
            compute(dec!(10), dec!(42), MovementType::Adjustment, dec!(-2), dec!(0)).unwrap();
        assert_eq!(down.new_stock, dec!(8));
        assert_eq!(down.new_avg_cost, dec!(42));
        assert_eq!(down.total_cost, dec!(-84.00));
    }

    #[test]
    fn adjustment_below_zero_is_invalid() {
        let err =
            compute(dec!(2), dec!(42), MovementType::Adjustment, dec!(-3), dec!(0)).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidAdjustment {
                delta: dec!(-3),
                available: dec!(2),
            }
        );
    }

    #[test]
    fn zero_delta_adjustment_is_a_validation_error() {
        assert!(matches!(
            compute(dec!(2), dec!(42), MovementType::Adjustment, dec!(0), dec!(0)),
            Err(DomainError::Validation(_))
        ));
    }

    proptest! {
        /// Receipts only: stock equals the sum of received quantities and the
        /// average equals the quantity-weighted mean of received costs, within
        /// one minor unit.
        #[test]
        fn receipts_only_average_is_weighted_mean(
            receipts in proptest::collection::vec((1u32..500, 0u32..100_000), 1..40)
        ) {
            let mut stock = Decimal::ZERO;
            let mut avg = Decimal::ZERO;
            let mut total_qty = Decimal::ZERO;
            let mut total_value = Decimal::ZERO;

            for (qty, cost_cents) in receipts {
                let qty = Decimal::from(qty);
                let cost = Decimal::from(cost_cents) / dec!(100);
                let out = compute(stock, avg, MovementType::Receipt, qty, cost).unwrap();
                stock = out.new_stock;
                avg = out.new_avg_cost;
                total_qty += qty;
                total_value += qty * cost;
            }

            prop_assert_eq!(stock, total_qty);
            let expected_avg = total_value / total_qty;
            prop_assert!((avg - expected_avg).abs() <= dec!(0.01));
        }

        /// Any valid consumption leaves the average untouched.
        #[test]
        fn consumption_never_moves_the_average(
            stock in 1u32..10_000,
            avg_cents in 0u32..1_000_000,
            take in 1u32..10_000,
        ) {
            let stock = Decimal::from(stock);
            let avg = Decimal::from(avg_cents) / dec!(100);
            let take = Decimal::from(take);

            match compute(stock, avg, MovementType::Consumption, take, Decimal::ZERO) {
                Ok(out) => {
                    prop_assert_eq!(out.new_avg_cost, avg);
                    prop_assert!(out.new_stock >= Decimal::ZERO);
                }
                Err(DomainError::InsufficientStock { requested, available }) => {
                    prop_assert_eq!(requested, take);
                    prop_assert_eq!(available, stock);
                    prop_assert!(take > stock);
                }
                Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
            }
        }
    }
}
