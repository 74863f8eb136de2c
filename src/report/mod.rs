//! Monthly and yearly income/expense reports.
//!
//! This module contains:
//! - SQL queries that sum amounts for a user, period and optional category
//! - Gap-filling of daily and monthly series
//! - The HTTP handlers

mod aggregation;
mod handlers;
mod query;

pub use aggregation::{CategoryTotal, DailyPoint, Flow, MonthlyPoint, Series};
pub use handlers::{
    MonthReportQuery, Report, ReportPeriod, ReportState, YearReportQuery, month_report_endpoint,
    year_report_endpoint,
};
