//! Query string parsing shared by the billing read endpoints.
//!
//! Parameters arrive as raw strings so that every malformed value is
//! reported as a 422 with the billing error body.

use domain::{DateRange, MAX_REPORT_DAYS};
use invoice_store::{DEFAULT_PAGE_SIZE, PageRequest};
use serde::Deserialize;

use crate::error::ApiError;

/// `from`/`to` with `from_date`/`to_date` accepted as aliases.
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

impl RangeParams {
    fn bounds(&self) -> Result<(&str, &str), ApiError> {
        let from = self
            .from
            .as_deref()
            .or(self.from_date.as_deref())
            .ok_or_else(|| ApiError::Validation("from is required".to_string()))?;
        let to = self
            .to
            .as_deref()
            .or(self.to_date.as_deref())
            .ok_or_else(|| ApiError::Validation("to is required".to_string()))?;
        Ok((from, to))
    }

    /// Inclusive day range with no length limit.
    pub fn range(&self) -> Result<DateRange, ApiError> {
        let (from, to) = self.bounds()?;
        Ok(DateRange::parse(from, to)?)
    }

    /// Inclusive day range capped at `MAX_REPORT_DAYS`.
    pub fn report_range(&self) -> Result<DateRange, ApiError> {
        let range = self.range()?;
        Ok(DateRange::bounded(range.from(), range.to(), MAX_REPORT_DAYS)?)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(flatten)]
    pub range: RangeParams,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

fn parse_u32(name: &str, value: Option<&str>, default: u32) -> Result<u32, ApiError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ApiError::Validation(format!("{name} must be a positive integer"))),
    }
}

impl ListParams {
    pub fn page(&self) -> Result<PageRequest, ApiError> {
        let page = parse_u32("page", self.page.as_deref(), 1)?;
        let page_size = parse_u32("page_size", self.page_size.as_deref(), DEFAULT_PAGE_SIZE)?;
        Ok(PageRequest::new(page, page_size)?)
    }
}
