use common::InvoiceId;
use thiserror::Error;

/// Errors that can occur when interacting with the invoice store.
#[derive(Debug, Error)]
pub enum InvoiceStoreError {
    /// An invoice with this id already exists.
    #[error("Invoice already exists: {0}")]
    Duplicate(InvoiceId),

    /// The invoice total does not match its lines.
    #[error("Invoice {0} total does not match the sum of its lines")]
    Unbalanced(InvoiceId),

    /// The invoice was not found.
    #[error("Invoice not found: {0}")]
    NotFound(InvoiceId),

    /// Paging parameters are out of range.
    #[error("Invalid page request: {0}")]
    InvalidPage(String),

    /// A stored row could not be mapped back into the domain.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Injected failure used by the in-memory store.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for invoice store operations.
pub type Result<T> = std::result::Result<T, InvoiceStoreError>;
