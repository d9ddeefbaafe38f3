//! Invoice totals calculation.

use rust_decimal::Decimal;

use super::types::{InvoiceTotals, LineAmount};

/// Derives the full totals record from a pre-tax total.
///
/// `total_tva = total_ht * tax_rate`, `total_ttc = total_ht + total_tva`.
#[must_use]
pub fn totals_from_ht(total_ht: Decimal, tax_rate: Decimal) -> InvoiceTotals {
    let total_tva = total_ht * tax_rate;
    InvoiceTotals {
        total_ht,
        total_tva,
        total_ttc: total_ht + total_tva,
    }
}

/// Computes invoice totals from its line items.
///
/// Return lines are excluded by construction: callers pass invoice lines
/// only. An empty line set yields all-zero totals.
#[must_use]
pub fn invoice_totals(lines: &[LineAmount], tax_rate: Decimal) -> InvoiceTotals {
    let total_ht: Decimal = lines.iter().map(LineAmount::total).sum();
    totals_from_ht(total_ht, tax_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TAX: Decimal = dec!(0.20);

    #[test]
    fn test_totals_reference_case() {
        // (10 x 2) + (5 x 3) = 35 HT, 7 VAT, 42 TTC
        let lines = [
            LineAmount {
                unit_price: dec!(10),
                quantity: 2,
            },
            LineAmount {
                unit_price: dec!(5),
                quantity: 3,
            },
        ];
        let totals = invoice_totals(&lines, TAX);
        assert_eq!(totals.total_ht, dec!(35));
        assert_eq!(totals.total_tva, dec!(7.00));
        assert_eq!(totals.total_ttc, dec!(42.00));
    }

    #[test]
    fn test_empty_lines_yield_zero() {
        assert_eq!(invoice_totals(&[], TAX), InvoiceTotals::ZERO);
    }

    #[test]
    fn test_totals_from_ht() {
        let totals = totals_from_ht(dec!(100), TAX);
        assert_eq!(totals.total_tva, dec!(20.00));
        assert_eq!(totals.total_ttc, dec!(120.00));
    }

    #[test]
    fn test_zero_tax_rate() {
        let totals = totals_from_ht(dec!(100), Decimal::ZERO);
        assert_eq!(totals.total_tva, Decimal::ZERO);
        assert_eq!(totals.total_ttc, dec!(100));
    }

    #[test]
    fn test_fractional_prices() {
        let lines = [LineAmount {
            unit_price: dec!(19.99),
            quantity: 3,
        }];
        let totals = invoice_totals(&lines, TAX);
        assert_eq!(totals.total_ht, dec!(59.97));
        assert_eq!(totals.total_tva, dec!(11.9940));
        assert_eq!(totals.total_ttc, dec!(71.9640));
    }
}
