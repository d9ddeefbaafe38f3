//! Financial reconciliation logic.
//!
//! This module implements the derived computations of the ledger engine:
//! - Invoice totals (HT, VAT, TTC) from line items
//! - Per-product stock availability from three ledgers (entries, sales, returns)
//! - Per-client outstanding balance from payment applications
//! - Per-payment and per-invoice remaining balances
//! - Deletion guards for referenced entities
//!
//! Everything here is a pure function over already-aggregated figures; the
//! persistence layer supplies the sums and commits nothing during a read.

pub mod balance;
pub mod guards;
pub mod stock;
pub mod totals;
pub mod types;

#[cfg(test)]
mod props;

pub use balance::{client_balance, invoice_remaining, payment_remaining};
pub use guards::{client_deletable, invoice_deletable, product_deletable};
pub use stock::stock_summary;
pub use totals::{invoice_totals, totals_from_ht};
pub use types::{ClientBalance, InvoiceStatus, InvoiceTotals, LineAmount, StockSummary};
