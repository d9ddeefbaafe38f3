//! Billing domain types shared by the calculators.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice lifecycle state.
///
/// An invoice is either a draft or finalized. Only finalized invoices count
/// toward sales figures and client balances. The transition is a manual
/// toggle in either direction; there are no other states and no automatic
/// transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Invoice is being drafted; excluded from sales and balance totals.
    Draft,
    /// Invoice counts toward sales, stock deductions, and client balances.
    Finalized,
}

impl InvoiceStatus {
    /// Builds the status from the persisted `finalized` flag.
    #[must_use]
    pub const fn from_finalized(finalized: bool) -> Self {
        if finalized { Self::Finalized } else { Self::Draft }
    }

    /// Returns true if the invoice counts toward sales and balances.
    #[must_use]
    pub const fn counts_toward_sales(self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// Returns the opposite state (the manual toggle).
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Draft => Self::Finalized,
            Self::Finalized => Self::Draft,
        }
    }
}

/// One priced quantity on an invoice (a line item or a return line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmount {
    /// Unit sale price.
    pub unit_price: Decimal,
    /// Quantity sold (or returned).
    pub quantity: i32,
}

impl LineAmount {
    /// The line total: unit price times quantity.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Invoice financial totals.
///
/// Totals are a pure function of the invoice lines; return lines never enter
/// here (they only affect stock and inventory figures).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Total excluding tax.
    pub total_ht: Decimal,
    /// Tax amount.
    pub total_tva: Decimal,
    /// Total including tax.
    pub total_ttc: Decimal,
}

impl InvoiceTotals {
    /// All-zero totals (an invoice with no lines).
    pub const ZERO: Self = Self {
        total_ht: Decimal::ZERO,
        total_tva: Decimal::ZERO,
        total_ttc: Decimal::ZERO,
    };
}

/// Stock position for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    /// Total quantity received across stock entries.
    pub quantity_received: i64,
    /// Quantity sold net of returns, floored at zero.
    pub quantity_sold: i64,
    /// Quantity on hand. May go negative when oversold; overselling stays
    /// visible rather than being clamped away.
    pub quantity_available: i64,
}

/// Outstanding balance breakdown for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientBalance {
    /// Sum of TTC totals over the client's finalized invoices.
    pub invoiced_ttc: Decimal,
    /// Sum of payment amounts applied to any of the client's invoices.
    pub applied: Decimal,
    /// `invoiced_ttc - applied`.
    pub balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_from_flag() {
        assert_eq!(InvoiceStatus::from_finalized(false), InvoiceStatus::Draft);
        assert_eq!(
            InvoiceStatus::from_finalized(true),
            InvoiceStatus::Finalized
        );
    }

    #[test]
    fn test_status_toggle_both_directions() {
        assert_eq!(InvoiceStatus::Draft.toggled(), InvoiceStatus::Finalized);
        assert_eq!(InvoiceStatus::Finalized.toggled(), InvoiceStatus::Draft);
    }

    #[test]
    fn test_only_finalized_counts() {
        assert!(InvoiceStatus::Finalized.counts_toward_sales());
        assert!(!InvoiceStatus::Draft.counts_toward_sales());
    }

    #[test]
    fn test_line_total() {
        let line = LineAmount {
            unit_price: dec!(12.50),
            quantity: 4,
        };
        assert_eq!(line.total(), dec!(50.00));
    }

    #[test]
    fn test_line_total_negative_quantity_allowed() {
        // Negative quantities are accepted everywhere; corrective entries rely on it.
        let line = LineAmount {
            unit_price: dec!(10),
            quantity: -3,
        };
        assert_eq!(line.total(), dec!(-30));
    }
}
