//! Stock availability calculation.
//!
//! Stock for a product is derived from three independent ledgers: quantities
//! received (stock entries), quantities sold on finalized invoices, and
//! quantities returned (counted regardless of the invoice's finalization
//! state).

use super::types::StockSummary;

/// Combines the three ledger sums into a stock position.
///
/// `quantity_available = received - sold + returned` and is deliberately NOT
/// floored: a negative figure means the product is oversold and that must
/// stay visible. `quantity_sold` is the net-of-returns sales figure, floored
/// at zero so a return surplus never shows as negative sales.
#[must_use]
pub fn stock_summary(received: i64, sold_finalized: i64, returned: i64) -> StockSummary {
    StockSummary {
        quantity_received: received,
        quantity_sold: (sold_finalized - returned).max(0),
        quantity_available: received - sold_finalized + returned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_reference_case() {
        let s = stock_summary(100, 30, 5);
        assert_eq!(s.quantity_received, 100);
        assert_eq!(s.quantity_sold, 25);
        assert_eq!(s.quantity_available, 75);
    }

    #[test]
    fn test_sold_floored_when_returns_exceed_sales() {
        let s = stock_summary(50, 10, 20);
        assert_eq!(s.quantity_sold, 0);
        // availability is NOT floored; the surplus returns add back
        assert_eq!(s.quantity_available, 60);
    }

    #[test]
    fn test_oversold_goes_negative() {
        let s = stock_summary(10, 25, 0);
        assert_eq!(s.quantity_available, -15);
        assert_eq!(s.quantity_sold, 25);
    }

    #[rstest]
    #[case(0, 0, 0, 0, 0)]
    #[case(100, 100, 0, 100, 0)]
    #[case(0, 5, 5, 0, 0)]
    fn test_edge_cases(
        #[case] received: i64,
        #[case] sold: i64,
        #[case] returned: i64,
        #[case] expected_sold: i64,
        #[case] expected_available: i64,
    ) {
        let s = stock_summary(received, sold, returned);
        assert_eq!(s.quantity_sold, expected_sold);
        assert_eq!(s.quantity_available, expected_available);
    }
}
