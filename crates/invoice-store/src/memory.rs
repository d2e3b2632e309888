use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use common::InvoiceId;
use domain::{DailySales, DateRange, Invoice, Money};
use tokio::sync::RwLock;

use crate::{InvoicePage, InvoiceQuery, InvoiceStoreError, Result, store::InvoiceStore};

/// In-memory invoice store implementation for testing.
///
/// Provides the same interface as the PostgreSQL implementation and can be
/// told to fail inserts so callers can exercise their failure paths.
#[derive(Clone, Default)]
pub struct InMemoryInvoiceStore {
    invoices: Arc<RwLock<Vec<Invoice>>>,
    fail_on_insert: Arc<AtomicBool>,
    report_queries: Arc<AtomicUsize>,
}

impl InMemoryInvoiceStore {
    /// Creates a new empty in-memory invoice store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent insert fail.
    pub fn set_fail_on_insert(&self, fail: bool) {
        self.fail_on_insert.store(fail, Ordering::SeqCst);
    }

    /// Number of `daily_sales` queries served so far.
    pub fn report_queries(&self) -> usize {
        self.report_queries.load(Ordering::SeqCst)
    }

    /// Returns the number of stored invoices.
    pub async fn invoice_count(&self) -> usize {
        self.invoices.read().await.len()
    }

    /// Returns true if an invoice with this id is stored.
    pub async fn contains(&self, id: InvoiceId) -> bool {
        self.invoices.read().await.iter().any(|i| i.id == id)
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<()> {
        if self.fail_on_insert.load(Ordering::SeqCst) {
            return Err(InvoiceStoreError::Unavailable("insert failure injected".to_string()));
        }
        if !invoice.is_balanced() {
            return Err(InvoiceStoreError::Unbalanced(invoice.id));
        }

        let mut store = self.invoices.write().await;
        if store.iter().any(|i| i.id == invoice.id) {
            return Err(InvoiceStoreError::Duplicate(invoice.id));
        }
        store.push(invoice.clone());
        Ok(())
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>> {
        let store = self.invoices.read().await;
        Ok(store.iter().find(|i| i.id == id).cloned())
    }

    async fn list_invoices(&self, query: InvoiceQuery) -> Result<InvoicePage> {
        let store = self.invoices.read().await;
        let mut matching: Vec<_> = store
            .iter()
            .filter(|i| query.range.contains(i.created_at))
            .collect();
        matching.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_uuid().cmp(&b.id.as_uuid()))
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.page.offset() as usize)
            .take(query.page.page_size() as usize)
            .map(Invoice::summary)
            .collect();

        Ok(InvoicePage {
            items,
            total,
            page: query.page.page(),
            page_size: query.page.page_size(),
        })
    }

    async fn daily_sales(&self, range: DateRange) -> Result<Vec<DailySales>> {
        self.report_queries.fetch_add(1, Ordering::SeqCst);
        let store = self.invoices.read().await;
        let mut by_day: BTreeMap<NaiveDate, (Money, u64)> = BTreeMap::new();
        for invoice in store.iter().filter(|i| range.contains(i.created_at)) {
            let entry = by_day
                .entry(invoice.created_at.date_naive())
                .or_insert((Money::zero(), 0));
            entry.0 += invoice.total;
            entry.1 += 1;
        }

        Ok(by_day
            .into_iter()
            .map(|(date, (total, count))| DailySales { date, total, count })
            .collect())
    }

    async fn attach_document(&self, id: InvoiceId, pdf_url: &str, job_id: &str) -> Result<()> {
        let mut store = self.invoices.write().await;
        let invoice = store
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(InvoiceStoreError::NotFound(id))?;
        invoice.pdf_url = Some(pdf_url.to_string());
        invoice.print_job_id = Some(job_id.to_string());
        Ok(())
    }
}
