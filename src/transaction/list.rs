//! Endpoints for reading transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    category::resolve_category_filter,
    database_id::PathId,
    db::lock_connection,
    pagination::{Pagination, PaginationConfig},
    period::resolve_month,
    transaction::{
        Transaction, TransactionFilter, TransactionType, get_transaction, list_transactions,
    },
    user::UserID,
};

/// The state needed for reading transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    pub pagination_config: PaginationConfig,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            pagination_config: PaginationConfig::default(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters of a transaction listing. All of them are optional
/// and an empty value is the same as an absent one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTransactionsQuery {
    pub month: Option<String>,
    pub category_id: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// List a page of the caller's transactions: `{"items", "limit", "offset"}`.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Value>, Error> {
    let date_range = match non_empty(query.month.as_deref()) {
        Some(month) => Some(resolve_month(Some(month)).map_err(|_| {
            Error::InvalidPeriod("Invalid month (use YYYY-MM)".to_owned())
        })?),
        None => None,
    };

    let transaction_type = non_empty(query.transaction_type.as_deref())
        .map(|raw| {
            raw.parse::<TransactionType>()
                .map_err(|_| Error::Validation("Invalid type (income|expense)".to_owned()))
        })
        .transpose()?;

    let page = Pagination::from_query(
        query.limit.as_deref(),
        query.offset.as_deref(),
        state.pagination_config,
    );

    let connection = lock_connection(&state.db_connection)?;
    let category_id =
        resolve_category_filter(query.category_id.as_deref(), user_id, &connection)?;

    let filter = TransactionFilter {
        date_range,
        category_id,
        transaction_type,
    };
    let items = list_transactions(user_id, &filter, page, &connection)?;

    Ok(Json(json!({
        "items": items,
        "limit": page.limit,
        "offset": page.offset,
    })))
}

/// Get one of the caller's transactions.
pub async fn get_transaction_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(user_id): Extension<UserID>,
    PathId(transaction_id): PathId,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transaction(transaction_id, user_id, &connection).map(Json)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
