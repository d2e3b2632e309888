use std::sync::Arc;

use async_trait::async_trait;
use common::InvoiceId;
use domain::{DailySales, DateRange, Invoice};

use crate::{InvoicePage, InvoiceQuery, Result};

/// Core trait for invoice store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Persists an invoice header and all of its lines.
    ///
    /// The write is atomic: either the header and every line become
    /// visible, or nothing does.
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<()>;

    /// Loads a single invoice with its lines.
    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>>;

    /// Lists invoice headers created inside the query window, ordered by
    /// creation time (oldest first, ties broken by id).
    async fn list_invoices(&self, query: InvoiceQuery) -> Result<InvoicePage>;

    /// Aggregates invoice totals per UTC day. Days without invoices are
    /// omitted.
    async fn daily_sales(&self, range: DateRange) -> Result<Vec<DailySales>>;

    /// Records the rendered document for an invoice.
    async fn attach_document(&self, id: InvoiceId, pdf_url: &str, job_id: &str) -> Result<()>;
}

#[async_trait]
impl<T: InvoiceStore + ?Sized> InvoiceStore for Arc<T> {
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<()> {
        (**self).insert_invoice(invoice).await
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>> {
        (**self).get_invoice(id).await
    }

    async fn list_invoices(&self, query: InvoiceQuery) -> Result<InvoicePage> {
        (**self).list_invoices(query).await
    }

    async fn daily_sales(&self, range: DateRange) -> Result<Vec<DailySales>> {
        (**self).daily_sales(range).await
    }

    async fn attach_document(&self, id: InvoiceId, pdf_url: &str, job_id: &str) -> Result<()> {
        (**self).attach_document(id, pdf_url, job_id).await
    }
}
