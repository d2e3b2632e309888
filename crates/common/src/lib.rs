//! Shared types for the billing workspace.

pub mod types;

pub use types::InvoiceId;
