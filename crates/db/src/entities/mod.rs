//! `SeaORM` entity definitions for the billing ledger.
//!
//! One module per relation: clients, products, stock entries, invoices,
//! invoice lines, return lines, payments, and payment applications.

pub mod clients;
pub mod invoice_lines;
pub mod invoices;
pub mod payment_applications;
pub mod payments;
pub mod products;
pub mod return_lines;
pub mod stock_entries;
