//! Sales reports.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use chrono::NaiveDate;
use domain::{DailySales, Money, SalesReport, SalesSummary};
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::params::RangeParams;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DailySalesResponse {
    pub date: NaiveDate,
    pub total: Money,
    pub count: u64,
    pub avg_ticket: Money,
}

impl From<DailySales> for DailySalesResponse {
    fn from(day: DailySales) -> Self {
        Self {
            avg_ticket: day.avg_ticket(),
            date: day.date,
            total: day.total,
            count: day.count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DailyReportResponse {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub currency: String,
    pub days: Vec<DailySalesResponse>,
    pub summary: SalesSummary,
}

/// GET /billing/report/daily: revenue per UTC day plus a range summary.
#[tracing::instrument(skip(state))]
pub async fn daily(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<DailyReportResponse>, ApiError> {
    // Range is validated before the store is touched
    let range = params.report_range()?;
    let days = state.store.daily_sales(range).await?;
    let report = SalesReport::from_days(range, days);

    Ok(Json(DailyReportResponse {
        from_date: report.range.from(),
        to_date: report.range.to(),
        currency: state.report_currency.clone(),
        days: report.days.into_iter().map(Into::into).collect(),
        summary: report.summary,
    }))
}
