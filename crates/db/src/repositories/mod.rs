//! Repository abstractions for data access.
//!
//! One repository per aggregate. Repositories run the aggregate-sum queries
//! and feed the pure calculators in `comptoir_core::billing`; all integrity
//! guards are checked here before any write is attempted.

pub mod client;
pub mod inventory;
pub mod invoice;
pub mod payment;
pub mod product;
pub mod stock;

pub use client::ClientRepository;
pub use inventory::InventoryRepository;
pub use invoice::InvoiceRepository;
pub use payment::PaymentRepository;
pub use product::ProductRepository;
pub use stock::StockRepository;
