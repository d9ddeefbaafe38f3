//! Property-based tests for the reconciliation calculators.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::{client_balance, invoice_remaining, payment_remaining};
use super::stock::stock_summary;
use super::totals::{invoice_totals, totals_from_ht};
use super::types::LineAmount;

/// Strategy for a plausible unit price (cents, up to 1,000,000.00).
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for a line quantity. Negative quantities are representable on
/// purpose; the calculators accept them.
fn quantity_strategy() -> impl Strategy<Value = i32> {
    -1_000i32..1_000i32
}

fn line_strategy() -> impl Strategy<Value = LineAmount> {
    (price_strategy(), quantity_strategy()).prop_map(|(unit_price, quantity)| LineAmount {
        unit_price,
        quantity,
    })
}

fn lines_strategy() -> impl Strategy<Value = Vec<LineAmount>> {
    prop::collection::vec(line_strategy(), 0..20)
}

fn tax_rate_strategy() -> impl Strategy<Value = Decimal> {
    // 0% to 50%
    (0i64..=50i64).prop_map(|pct| Decimal::new(pct, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// HT + VAT always equals TTC, for any line set and tax rate.
    #[test]
    fn prop_ttc_is_ht_plus_tva(lines in lines_strategy(), rate in tax_rate_strategy()) {
        let totals = invoice_totals(&lines, rate);
        prop_assert_eq!(totals.total_ht + totals.total_tva, totals.total_ttc);
    }

    /// Totals are order-independent over the line set.
    #[test]
    fn prop_totals_permutation_invariant(mut lines in lines_strategy(), rate in tax_rate_strategy()) {
        let forward = invoice_totals(&lines, rate);
        lines.reverse();
        let backward = invoice_totals(&lines, rate);
        prop_assert_eq!(forward, backward);
    }

    /// Repeated reads of the same figures return identical outputs; the
    /// calculators hide no mutable state.
    #[test]
    fn prop_calculators_deterministic(
        lines in lines_strategy(),
        rate in tax_rate_strategy(),
        applied in price_strategy(),
    ) {
        let first = invoice_totals(&lines, rate);
        let second = invoice_totals(&lines, rate);
        prop_assert_eq!(first, second);

        prop_assert_eq!(
            invoice_remaining(first.total_ttc, applied),
            invoice_remaining(second.total_ttc, applied)
        );
    }

    /// The TTC total scales linearly in the HT total.
    #[test]
    fn prop_totals_from_ht_linear(ht in price_strategy(), rate in tax_rate_strategy()) {
        let single = totals_from_ht(ht, rate);
        let doubled = totals_from_ht(ht + ht, rate);
        prop_assert_eq!(single.total_ttc + single.total_ttc, doubled.total_ttc);
    }

    /// Sold-net-of-returns is never negative, availability is never clamped.
    #[test]
    fn prop_stock_floor_and_no_clamp(
        received in 0i64..1_000_000,
        sold in 0i64..1_000_000,
        returned in 0i64..1_000_000,
    ) {
        let s = stock_summary(received, sold, returned);
        prop_assert!(s.quantity_sold >= 0);
        prop_assert_eq!(s.quantity_available, received - sold + returned);
        // The floor only kicks in when returns exceed finalized sales.
        if returned <= sold {
            prop_assert_eq!(s.quantity_sold, sold - returned);
        } else {
            prop_assert_eq!(s.quantity_sold, 0);
        }
    }

    /// Balance arithmetic round-trips: applying the full remaining amount of
    /// a payment leaves it at exactly zero.
    #[test]
    fn prop_payment_fully_applied_is_zero(amount in price_strategy(), applied in price_strategy()) {
        let remaining = payment_remaining(amount, applied);
        prop_assert_eq!(payment_remaining(amount, applied + remaining), Decimal::ZERO);
    }

    /// The client balance record is internally consistent.
    #[test]
    fn prop_client_balance_consistent(invoiced in price_strategy(), applied in price_strategy()) {
        let b = client_balance(invoiced, applied);
        prop_assert_eq!(b.balance, b.invoiced_ttc - b.applied);
    }
}
