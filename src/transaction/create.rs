//! Transaction creation endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    category::resolve_category_id,
    db::lock_connection,
    json::{JsonBody, Scalar},
    transaction::{
        NewTransaction, create_transaction,
        fields::{
            DEFAULT_CURRENCY, parse_amount, parse_currency, parse_date, parse_note, parse_payee,
            parse_type,
        },
    },
    user::UserID,
};

/// The state needed for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a transaction creation request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTransactionData {
    #[serde(default, rename = "type")]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub amount: Option<Scalar>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub txn_date: Option<String>,
    #[serde(default)]
    pub category_id: Option<Scalar>,
    #[serde(default)]
    pub payee: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Handle transaction creation: `201 {"id": ...}`.
///
/// The fields are checked in order (type, amount, currency, date, payee,
/// note, category) and the first invalid one is reported.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    JsonBody(data): JsonBody<CreateTransactionData>,
) -> Result<Response, Error> {
    let transaction_type = parse_type(data.transaction_type.as_deref())?;
    let amount = parse_amount(data.amount.as_ref())?;
    let currency = parse_currency(Some(data.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)))?;
    let txn_date = parse_date(data.txn_date.as_deref())?;
    let payee = parse_payee(data.payee)?;
    let note = parse_note(data.note)?;

    let connection = lock_connection(&state.db_connection)?;
    let category_id = resolve_category_id(data.category_id.as_ref(), user_id, &connection)?;

    let transaction = NewTransaction {
        category_id,
        transaction_type,
        amount,
        currency,
        txn_date,
        payee,
        note,
    };
    let id = create_transaction(user_id, &transaction, &connection)?;

    tracing::debug!("created transaction {id} for user {user_id}");

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}
