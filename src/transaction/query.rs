//! Database query helpers for listing transactions.

use rusqlite::{Connection, params_from_iter, types::Value};

use crate::{
    Error,
    category::CategoryId,
    pagination::Pagination,
    period::{DateRange, format_date},
    user::UserID,
};

use super::core::{TRANSACTION_SELECT, Transaction, TransactionType, map_transaction_row};

/// The optional filters of a transaction listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only include transactions dated within this range.
    pub date_range: Option<DateRange>,
    /// Only include transactions in this category.
    pub category_id: Option<CategoryId>,
    /// Only include income or only include expenses.
    pub transaction_type: Option<TransactionType>,
}

/// Get a page of the user's transactions, newest first.
///
/// Transactions are sorted by date, and then ID to keep the order stable for
/// transactions on the same day.
///
/// # Errors
/// Returns [Error::Sql] if the query fails.
pub fn list_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    page: Pagination,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut conditions = vec!["t.user_id = ?"];
    let mut values = vec![Value::Integer(user_id.as_i64())];

    if let Some(DateRange { from, to }) = filter.date_range {
        conditions.push("t.txn_date >= ? AND t.txn_date < ?");
        values.push(Value::Text(format_date(from)));
        values.push(Value::Text(format_date(to)));
    }

    if let Some(category_id) = filter.category_id {
        conditions.push("t.category_id = ?");
        values.push(Value::Integer(category_id));
    }

    if let Some(transaction_type) = filter.transaction_type {
        conditions.push("t.type = ?");
        values.push(Value::Text(transaction_type.as_str().to_owned()));
    }

    values.push(Value::Integer(page.limit));
    values.push(Value::Integer(page.offset));

    let query = format!(
        "{TRANSACTION_SELECT} WHERE {} ORDER BY t.txn_date DESC, t.id DESC LIMIT ? OFFSET ?",
        conditions.join(" AND ")
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(values), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}
