//! Invoice document printing.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::InvoiceId;
use domain::Invoice;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reference to a rendered invoice document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintJob {
    pub pdf_url: String,
    pub job_id: String,
}

/// Why no document was produced.
#[derive(Debug, Error)]
pub enum PrintError {
    #[error("print service returned {status}")]
    Rejected { status: StatusCode },

    #[error("print request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("print service unavailable: {0}")]
    Unavailable(String),
}

/// Trait for rendering invoice documents.
#[async_trait]
pub trait PrintService: Send + Sync {
    /// Requests a document for a persisted invoice.
    async fn print_invoice(&self, invoice: &Invoice) -> Result<PrintJob, PrintError>;
}

#[async_trait]
impl<T: PrintService + ?Sized> PrintService for Arc<T> {
    async fn print_invoice(&self, invoice: &Invoice) -> Result<PrintJob, PrintError> {
        (**self).print_invoice(invoice).await
    }
}

#[derive(Serialize)]
struct PrintRequest<'a> {
    invoice: &'a Invoice,
}

/// Print service client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPrintService {
    client: Client,
    base_url: String,
}

impl HttpPrintService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PrintService for HttpPrintService {
    #[tracing::instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    async fn print_invoice(&self, invoice: &Invoice) -> Result<PrintJob, PrintError> {
        let url = format!("{}/print/invoice/{}", self.base_url, invoice.id);
        let response = self
            .client
            .post(&url)
            .json(&PrintRequest { invoice })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PrintError::Rejected { status });
        }
        Ok(response.json().await?)
    }
}

#[derive(Debug, Default)]
struct InMemoryPrintState {
    printed: Vec<InvoiceId>,
    fail_on_print: bool,
}

/// In-memory print service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPrintService {
    state: Arc<RwLock<InMemoryPrintState>>,
}

impl InMemoryPrintService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_print(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_print = fail;
    }

    /// Invoices a document was requested for, successful or not.
    pub fn printed(&self) -> Vec<InvoiceId> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .printed
            .clone()
    }
}

#[async_trait]
impl PrintService for InMemoryPrintService {
    async fn print_invoice(&self, invoice: &Invoice) -> Result<PrintJob, PrintError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.printed.push(invoice.id);

        if state.fail_on_print {
            return Err(PrintError::Unavailable("printer offline".to_string()));
        }

        Ok(PrintJob {
            pdf_url: format!("memory://invoices/{}.pdf", invoice.id),
            job_id: format!("JOB-{:04}", state.printed.len()),
        })
    }
}
