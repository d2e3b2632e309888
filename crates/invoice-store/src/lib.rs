//! Invoice persistence.
//!
//! `InvoiceStore` is the single unit-of-work boundary for invoices: a header
//! and its lines are written in one transaction or not at all. The same trait
//! serves the read side (paginated listing) and daily sales aggregation.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{InvoiceStoreError, Result};
pub use memory::InMemoryInvoiceStore;
pub use postgres::PostgresInvoiceStore;
pub use query::{DEFAULT_PAGE_SIZE, InvoicePage, InvoiceQuery, MAX_PAGE_SIZE, PageRequest};
pub use store::InvoiceStore;
