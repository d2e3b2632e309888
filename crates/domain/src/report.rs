//! Date ranges and daily sales aggregates.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::invoice::Money;

/// Largest span, in days and inclusive of both ends, a sales report may cover.
pub const MAX_REPORT_DAYS: i64 = 366;

/// Errors raised when building a date range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// A date could not be parsed as `YYYY-MM-DD`.
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// The start date is after the end date.
    #[error("invalid range: from {from} is after to {to}")]
    InvertedRange { from: NaiveDate, to: NaiveDate },

    /// The range covers more days than allowed.
    #[error("range covers {days} days, maximum is {max}")]
    RangeTooLong { days: i64, max: i64 },
}

/// An inclusive range of UTC calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ReportError> {
        if from > to {
            return Err(ReportError::InvertedRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// Creates a range that additionally covers at most `max_days` days.
    pub fn bounded(from: NaiveDate, to: NaiveDate, max_days: i64) -> Result<Self, ReportError> {
        let range = Self::new(from, to)?;
        let days = range.days();
        if days > max_days {
            return Err(ReportError::RangeTooLong {
                days,
                max: max_days,
            });
        }
        Ok(range)
    }

    /// Parses both ends from `YYYY-MM-DD` strings.
    pub fn parse(from: &str, to: &str) -> Result<Self, ReportError> {
        Self::new(parse_date(from)?, parse_date(to)?)
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Number of calendar days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// Inclusive lower bound: midnight UTC of `from`.
    pub fn start(&self) -> DateTime<Utc> {
        self.from.and_time(NaiveTime::MIN).and_utc()
    }

    /// Exclusive upper bound: midnight UTC of the day after `to`.
    pub fn end_exclusive(&self) -> DateTime<Utc> {
        self.to
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX)
            .and_time(NaiveTime::MIN)
            .and_utc()
    }

    /// Returns true if `ts` falls inside `[start, end_exclusive)`.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start() && ts < self.end_exclusive()
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, ReportError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ReportError::InvalidDate(s.to_string()))
}

/// Revenue for a single UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub total: Money,
    pub count: u64,
}

impl DailySales {
    /// Average ticket for the day; zero if no invoices.
    pub fn avg_ticket(&self) -> Money {
        self.total.average_over(self.count)
    }
}

/// Totals across a whole report range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total: Money,
    pub count: u64,
    pub avg_ticket: Money,
}

/// Per-day sales plus a summary over the range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    pub range: DateRange,
    pub days: Vec<DailySales>,
    pub summary: SalesSummary,
}

impl SalesReport {
    /// Builds a report from per-day rows, sorting them by date.
    pub fn from_days(range: DateRange, mut days: Vec<DailySales>) -> Self {
        days.sort_by_key(|d| d.date);
        let total: Money = days.iter().map(|d| d.total).sum();
        let count: u64 = days.iter().map(|d| d.count).sum();
        Self {
            range,
            days,
            summary: SalesSummary {
                total,
                count,
                avg_ticket: total.average_over(count),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_is_half_open() {
        let range = DateRange::parse("2024-01-01", "2024-01-03").unwrap();
        assert_eq!(range.start(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(
            range.end_exclusive(),
            Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap()
        );
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 1, 3, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::new(date(2024, 2, 29), date(2024, 2, 29)).unwrap();
        assert_eq!(range.days(), 1);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = DateRange::parse("2024-01-05", "2024-01-01").unwrap_err();
        assert!(matches!(err, ReportError::InvertedRange { .. }));
    }

    #[test]
    fn test_invalid_date_rejected() {
        assert_eq!(
            DateRange::parse("2024-13-01", "2024-01-01").unwrap_err(),
            ReportError::InvalidDate("2024-13-01".to_string())
        );
        assert!(DateRange::parse("yesterday", "2024-01-01").is_err());
    }

    #[test]
    fn test_bounded_span() {
        // 2024 is a leap year: Jan 1 to Dec 31 is exactly 366 days
        assert!(DateRange::bounded(date(2024, 1, 1), date(2024, 12, 31), MAX_REPORT_DAYS).is_ok());

        let err =
            DateRange::bounded(date(2024, 1, 1), date(2025, 1, 1), MAX_REPORT_DAYS).unwrap_err();
        assert_eq!(err, ReportError::RangeTooLong { days: 367, max: 366 });
    }

    #[test]
    fn test_report_from_days() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 3)).unwrap();
        let report = SalesReport::from_days(
            range,
            vec![
                DailySales {
                    date: date(2024, 1, 2),
                    total: Money::from_cents(20000),
                    count: 1,
                },
                DailySales {
                    date: date(2024, 1, 1),
                    total: Money::from_cents(15000),
                    count: 2,
                },
            ],
        );

        assert_eq!(report.days[0].date, date(2024, 1, 1));
        assert_eq!(report.days[0].avg_ticket(), Money::from_cents(7500));
        assert_eq!(report.days[1].avg_ticket(), Money::from_cents(20000));
        assert_eq!(report.summary.total, Money::from_cents(35000));
        assert_eq!(report.summary.count, 3);
        assert_eq!(report.summary.avg_ticket, Money::from_cents(11667));
    }

    #[test]
    fn test_empty_report() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 1)).unwrap();
        let report = SalesReport::from_days(range, vec![]);
        assert!(report.days.is_empty());
        assert_eq!(report.summary.count, 0);
        assert!(report.summary.avg_ticket.is_zero());
    }
}
