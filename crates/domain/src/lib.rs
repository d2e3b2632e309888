//! Domain layer for the billing service.
//!
//! This crate provides the value objects and invariants shared by the
//! orchestrator, the invoice store and the HTTP surface:
//! - `Money` fixed-point amounts and `ProductId` / `ReservationId` identifiers
//! - `CreateInvoice` request validation and `InvoiceDraft` pricing against a
//!   request-time price snapshot
//! - `Invoice` and `InvoiceLine` as persisted
//! - `DateRange` and daily sales report types

pub mod invoice;
pub mod report;

pub use invoice::{
    CreateInvoice, Invoice, InvoiceDraft, InvoiceError, InvoiceLine, InvoiceRequest,
    InvoiceSummary, LineRequest, Money, PriceList, ProductId, RequestedLine, ReservationId,
};
pub use report::{DailySales, DateRange, MAX_REPORT_DAYS, ReportError, SalesReport, SalesSummary};
