//! Invoice model, request validation and pricing.

mod model;
mod request;
mod value_objects;

pub use model::{Invoice, InvoiceDraft, InvoiceLine, InvoiceSummary, PriceList};
pub use request::{CreateInvoice, InvoiceRequest, LineRequest, RequestedLine};
pub use value_objects::{Money, ProductId, ReservationId};

use thiserror::Error;

/// Errors raised while validating or pricing an invoice request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceError {
    /// Customer name is missing or blank.
    #[error("customer_name must not be empty")]
    EmptyCustomerName,

    /// The request carries no line items.
    #[error("invoice must contain at least one item")]
    NoItems,

    /// A line item has a blank product id.
    #[error("item {index}: product_id must not be empty")]
    EmptyProductId { index: usize },

    /// A line item has a non-positive quantity.
    #[error("item {index}: invalid quantity {quantity} (must be greater than 0)")]
    InvalidQuantity { index: usize, quantity: i64 },

    /// A referenced product is not present in the price snapshot.
    #[error("product {0} does not exist")]
    ProductNotFound(ProductId),

    /// The price snapshot carries a negative unit price.
    #[error("invalid price {price} for product {product_id} (must not be negative)")]
    InvalidPrice { product_id: ProductId, price: Money },
}
