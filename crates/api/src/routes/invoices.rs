//! Invoice creation and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::InvoiceId;
use domain::{CreateInvoice, Invoice, InvoiceLine, InvoiceSummary, Money};
use invoice_store::{InvoicePage, InvoiceQuery};
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::params::ListParams;
use crate::state::AppState;

// -- Response types --

#[derive(Debug, Serialize)]
pub struct InvoiceLineResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub invoice_id: InvoiceId,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
    pub reservation_id: String,
    pub total: Money,
    pub items: Vec<InvoiceLineResponse>,
    pub pdf_url: Option<String>,
    pub print_job_id: Option<String>,
}

impl From<InvoiceLine> for InvoiceLineResponse {
    fn from(line: InvoiceLine) -> Self {
        Self {
            product_id: line.product_id.as_str().to_string(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal: line.subtotal,
        }
    }
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            invoice_id: invoice.id,
            customer_name: invoice.customer_name,
            created_at: invoice.created_at,
            reservation_id: invoice.reservation_id.as_str().to_string(),
            total: invoice.total,
            items: invoice.lines.into_iter().map(Into::into).collect(),
            pdf_url: invoice.pdf_url,
            print_job_id: invoice.print_job_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceSummaryResponse {
    pub invoice_id: InvoiceId,
    pub customer_name: String,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

impl From<InvoiceSummary> for InvoiceSummaryResponse {
    fn from(summary: InvoiceSummary) -> Self {
        Self {
            invoice_id: summary.id,
            customer_name: summary.customer_name,
            total: summary.total,
            created_at: summary.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceListResponse {
    pub items: Vec<InvoiceSummaryResponse>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl From<InvoicePage> for InvoiceListResponse {
    fn from(page: InvoicePage) -> Self {
        Self {
            items: page.items.into_iter().map(Into::into).collect(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}

// -- Handlers --

/// POST /billing/invoices: run the billing saga.
///
/// The saga runs on its own task so a client disconnect cannot abort it
/// between reservation and persistence.
#[tracing::instrument(skip(state, payload))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateInvoice>, JsonRejection>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    let Json(request) = payload?;

    let orchestrator = state.orchestrator.clone();
    let invoice = tokio::spawn(async move { orchestrator.create_invoice(request).await })
        .await
        .map_err(|e| ApiError::Internal(format!("billing task failed: {e}")))??;

    Ok((StatusCode::CREATED, Json(invoice.into())))
}

/// GET /billing/invoices: paginated listing over an inclusive day range.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<InvoiceListResponse>, ApiError> {
    let query = InvoiceQuery::new(params.range.range()?, params.page()?);
    let page = state.store.list_invoices(query).await?;
    Ok(Json(page.into()))
}

/// GET /billing/invoices/{id}: a single invoice with its lines.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice_id: InvoiceId = id
        .parse()
        .map_err(|_| ApiError::Validation(format!("invalid invoice id: {id}")))?;
    let invoice = state
        .store
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Invoice {id} not found")))?;
    Ok(Json(invoice.into()))
}
