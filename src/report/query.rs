//! Database queries for the aggregates shown in reports.
//!
//! Every query sums integer cents inside SQLite and is restricted to one
//! user, a half-open date range and, optionally, one category.

use std::collections::HashMap;

use rusqlite::{Connection, Row};
use time::{Date, Month};

use crate::{
    Error,
    category::CategoryId,
    money::Amount,
    period::DateRange,
    report::aggregation::{CategoryTotal, Flow},
    user::UserID,
};

/// The name reported for transactions without a category.
pub(super) const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// The transactions a report is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ReportScope {
    pub user_id: UserID,
    pub date_range: DateRange,
    pub category_id: Option<CategoryId>,
}

impl ReportScope {
    fn params(&self) -> (i64, Date, Date, Option<CategoryId>) {
        (
            self.user_id.as_i64(),
            self.date_range.from,
            self.date_range.to,
            self.category_id,
        )
    }
}

const SCOPE_CONDITION: &str = "t.user_id = ?1 \
    AND t.txn_date >= ?2 AND t.txn_date < ?3 \
    AND (?4 IS NULL OR t.category_id = ?4)";

const FLOW_COLUMNS: &str = "\
    COALESCE(SUM(CASE WHEN t.type = 'income' THEN t.amount_cents ELSE 0 END), 0), \
    COALESCE(SUM(CASE WHEN t.type = 'expense' THEN t.amount_cents ELSE 0 END), 0)";

/// Total income and expenses over the whole scope.
pub(super) fn get_totals(scope: &ReportScope, connection: &Connection) -> Result<Flow, Error> {
    connection
        .prepare(&format!(
            "SELECT {FLOW_COLUMNS} FROM \"transaction\" t WHERE {SCOPE_CONDITION}"
        ))?
        .query_row(scope.params(), |row| map_flow(row, 0))
        .map_err(Error::from)
}

/// Totals grouped by category and type, largest first.
///
/// Ties are broken by category name, then type, then category ID, so the
/// order never depends on how SQLite happens to group the rows.
pub(super) fn get_category_totals(
    scope: &ReportScope,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    connection
        .prepare(&format!(
            "SELECT t.category_id, COALESCE(c.name, '{UNCATEGORIZED_LABEL}') AS category_name, \
                t.type, SUM(t.amount_cents) AS total \
            FROM \"transaction\" t \
            LEFT JOIN category c ON c.id = t.category_id \
            WHERE {SCOPE_CONDITION} \
            GROUP BY t.category_id, t.type \
            ORDER BY total DESC, category_name ASC, t.type ASC, t.category_id ASC"
        ))?
        .query_map(scope.params(), |row| {
            Ok(CategoryTotal {
                category_id: row.get(0)?,
                category_name: row.get(1)?,
                transaction_type: row.get(2)?,
                total: Amount::from_cents(row.get(3)?),
            })
        })?
        .collect::<Result<Vec<_>, rusqlite::Error>>()
        .map_err(Error::from)
}

/// Income and expenses for each day that has at least one transaction.
pub(super) fn get_daily_totals(
    scope: &ReportScope,
    connection: &Connection,
) -> Result<HashMap<Date, Flow>, Error> {
    connection
        .prepare(&format!(
            "SELECT t.txn_date, {FLOW_COLUMNS} \
            FROM \"transaction\" t \
            WHERE {SCOPE_CONDITION} \
            GROUP BY t.txn_date"
        ))?
        .query_map(scope.params(), |row| Ok((row.get(0)?, map_flow(row, 1)?)))?
        .collect::<Result<HashMap<_, _>, rusqlite::Error>>()
        .map_err(Error::from)
}

/// Income and expenses for each calendar month that has at least one
/// transaction.
///
/// Only the month is used as the key, so the scope must not span more than
/// one year.
pub(super) fn get_monthly_totals(
    scope: &ReportScope,
    connection: &Connection,
) -> Result<HashMap<Month, Flow>, Error> {
    connection
        .prepare(&format!(
            "SELECT CAST(substr(t.txn_date, 6, 2) AS INTEGER) AS month_number, {FLOW_COLUMNS} \
            FROM \"transaction\" t \
            WHERE {SCOPE_CONDITION} \
            GROUP BY month_number"
        ))?
        .query_map(scope.params(), |row| {
            let month_number: u8 = row.get(0)?;
            let month = Month::try_from(month_number).map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Integer,
                    Box::new(error),
                )
            })?;

            Ok((month, map_flow(row, 1)?))
        })?
        .collect::<Result<HashMap<_, _>, rusqlite::Error>>()
        .map_err(Error::from)
}

fn map_flow(row: &Row, first_column: usize) -> Result<Flow, rusqlite::Error> {
    Ok(Flow {
        income: Amount::from_cents(row.get(first_column)?),
        expense: Amount::from_cents(row.get(first_column + 1)?),
    })
}
