//! Month and year report endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    category::resolve_category_filter,
    db::lock_connection,
    period::{DateRange, resolve_month, resolve_year},
    report::{
        aggregation::{CategoryTotal, Flow, Series, fill_daily, fill_monthly},
        query::{
            ReportScope, get_category_totals, get_daily_totals, get_monthly_totals, get_totals,
        },
    },
    user::UserID,
};

/// The state needed for building reports.
#[derive(Debug, Clone)]
pub struct ReportState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthReportQuery {
    pub month: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YearReportQuery {
    pub year: Option<String>,
    pub category_id: Option<String>,
}

/// The half-open period a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    #[serde(with = "crate::period::ymd_date")]
    pub from: Date,
    #[serde(with = "crate::period::ymd_date")]
    pub to: Date,
}

impl From<DateRange> for ReportPeriod {
    fn from(DateRange { from, to }: DateRange) -> Self {
        Self { from, to }
    }
}

/// Totals, per-category totals and a gap-filled time series for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub period: ReportPeriod,
    pub totals: Flow,
    #[serde(rename = "byCategory")]
    pub by_category: Vec<CategoryTotal>,
    #[serde(flatten)]
    pub series: Series,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Granularity {
    Daily,
    /// Monthly buckets for the given calendar year.
    Monthly(i32),
}

/// Report on one calendar month with a daily series.
///
/// The month is validated before the category filter.
pub async fn month_report_endpoint(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MonthReportQuery>,
) -> Result<Json<Report>, Error> {
    let date_range = resolve_month(query.month.as_deref())?;

    let mut connection = lock_connection(&state.db_connection)?;
    build_report(
        user_id,
        date_range,
        Granularity::Daily,
        query.category_id.as_deref(),
        &mut connection,
    )
    .map(Json)
}

/// Report on one calendar year with a monthly series.
///
/// The year is validated before the category filter.
pub async fn year_report_endpoint(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<YearReportQuery>,
) -> Result<Json<Report>, Error> {
    let date_range = resolve_year(query.year.as_deref())?;

    let mut connection = lock_connection(&state.db_connection)?;
    build_report(
        user_id,
        date_range,
        Granularity::Monthly(date_range.from.year()),
        query.category_id.as_deref(),
        &mut connection,
    )
    .map(Json)
}

/// Run every query of a report inside one read transaction so that the
/// totals, category totals and series describe the same snapshot.
fn build_report(
    user_id: UserID,
    date_range: DateRange,
    granularity: Granularity,
    raw_category_id: Option<&str>,
    connection: &mut Connection,
) -> Result<Report, Error> {
    let transaction = connection.transaction_with_behavior(TransactionBehavior::Deferred)?;

    let category_id = resolve_category_filter(raw_category_id, user_id, &transaction)?;
    let scope = ReportScope {
        user_id,
        date_range,
        category_id,
    };

    let totals = get_totals(&scope, &transaction)?;
    let by_category = get_category_totals(&scope, &transaction)?;
    let series = match granularity {
        Granularity::Daily => {
            Series::Daily(fill_daily(date_range, &get_daily_totals(&scope, &transaction)?))
        }
        Granularity::Monthly(year) => {
            Series::Monthly(fill_monthly(year, &get_monthly_totals(&scope, &transaction)?))
        }
    };

    transaction.commit()?;

    Ok(Report {
        period: date_range.into(),
        totals,
        by_category,
        series,
    })
}
