//! Client, payment, and invoice balance calculations.

use rust_decimal::Decimal;

use super::types::ClientBalance;

/// Computes a client's outstanding balance.
///
/// `invoiced_ttc` sums the TTC totals of the client's FINALIZED invoices
/// only. `applied` sums the payment applications on ANY invoice belonging to
/// the client, including drafts. The two sides are intentionally asymmetric:
/// a payment applied to a draft invoice reduces the balance even though that
/// invoice's total is absent from the invoiced side. Downstream figures
/// depend on this exact behavior; do not filter the applied side by the
/// invoice's finalized flag.
#[must_use]
pub fn client_balance(invoiced_ttc: Decimal, applied: Decimal) -> ClientBalance {
    ClientBalance {
        invoiced_ttc,
        applied,
        balance: invoiced_ttc - applied,
    }
}

/// Remaining (unapplied) amount of a payment.
///
/// Not clamped: over-applying a payment drives this negative, and that
/// over-application must stay visible.
#[must_use]
pub fn payment_remaining(amount: Decimal, applied: Decimal) -> Decimal {
    amount - applied
}

/// Remaining amount due on an invoice after its payment applications.
///
/// Not clamped either; an over-paid invoice shows a negative remainder.
#[must_use]
pub fn invoice_remaining(total_ttc: Decimal, applied: Decimal) -> Decimal {
    total_ttc - applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_client_balance_reference_case() {
        // One finalized invoice of 120 TTC, 50 applied => 70 outstanding.
        let b = client_balance(dec!(120), dec!(50));
        assert_eq!(b.balance, dec!(70));
        assert_eq!(b.invoiced_ttc, dec!(120));
        assert_eq!(b.applied, dec!(50));
    }

    #[test]
    fn test_client_balance_applied_to_draft_still_counts() {
        // The applied side is not filtered by finalization: an application on
        // a draft invoice lowers the balance while the draft's own total is
        // excluded from the invoiced side.
        let b = client_balance(Decimal::ZERO, dec!(40));
        assert_eq!(b.balance, dec!(-40));
    }

    #[test]
    fn test_payment_remaining() {
        assert_eq!(payment_remaining(dec!(200), dec!(150)), dec!(50));
    }

    #[test]
    fn test_payment_over_application_not_clamped() {
        // 150 applied, then 60 more: remaining goes to -10 and stays there.
        assert_eq!(payment_remaining(dec!(200), dec!(210)), dec!(-10));
    }

    #[test]
    fn test_invoice_remaining() {
        assert_eq!(invoice_remaining(dec!(42), dec!(42)), Decimal::ZERO);
        assert_eq!(invoice_remaining(dec!(42), dec!(50)), dec!(-8));
    }
}
