//! Transaction update endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::Response,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::resolve_category_id,
    database_id::PathId,
    db::lock_connection,
    json::{JsonBody, Scalar, double_option, ok_response},
    transaction::{
        TransactionUpdate,
        fields::{parse_amount, parse_currency, parse_date, parse_note, parse_payee, parse_type},
        update_transaction,
    },
    user::UserID,
};

/// The state needed for updating a transaction.
#[derive(Debug, Clone)]
pub struct UpdateTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a partial transaction update.
///
/// Each field is absent (unchanged), `null` (cleared) or a value (set).
/// `type`, `amount`, `currency` and `txn_date` cannot be cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTransactionData {
    #[serde(default, rename = "type", deserialize_with = "double_option")]
    pub transaction_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub amount: Option<Option<Scalar>>,
    #[serde(default, deserialize_with = "double_option")]
    pub currency: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub txn_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Scalar>>,
    #[serde(default, deserialize_with = "double_option")]
    pub payee: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub note: Option<Option<String>>,
}

impl UpdateTransactionData {
    /// Validate the fields that can be checked without the database.
    ///
    /// The category is resolved separately because it needs the caller's
    /// categories.
    fn validate(self) -> Result<(TransactionUpdate, Option<Option<Scalar>>), Error> {
        let update = TransactionUpdate {
            transaction_type: self
                .transaction_type
                .map(|value| parse_type(value.as_deref()))
                .transpose()?,
            amount: self
                .amount
                .map(|value| parse_amount(value.as_ref()))
                .transpose()?,
            currency: self
                .currency
                .map(|value| parse_currency(value.as_deref()))
                .transpose()?,
            txn_date: self
                .txn_date
                .map(|value| parse_date(value.as_deref()))
                .transpose()?,
            category_id: None,
            payee: self.payee.map(parse_payee).transpose()?,
            note: self.note.map(parse_note).transpose()?,
        };

        Ok((update, self.category_id))
    }
}

/// Handle a partial transaction update: `{"ok": true}`.
pub async fn update_transaction_endpoint(
    State(state): State<UpdateTransactionState>,
    Extension(user_id): Extension<UserID>,
    PathId(transaction_id): PathId,
    JsonBody(data): JsonBody<UpdateTransactionData>,
) -> Result<Response, Error> {
    let (mut update, category_id) = data.validate()?;

    let connection = lock_connection(&state.db_connection)?;

    update.category_id = category_id
        .map(|value| resolve_category_id(value.as_ref(), user_id, &connection))
        .transpose()?;

    update_transaction(transaction_id, user_id, &update, &connection)?;

    Ok(ok_response())
}


#[cfg(test)]
mod update_transaction_endpoint_tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use time::macros::date;

    use crate::{
        Error,
        database_id::PathId,
        json::JsonBody,
        money::Amount,
        test_utils::{create_test_user, get_test_connection, shared_connection},
        transaction::{NewTransaction, TransactionType, create_transaction, get_transaction},
    };

    use super::{UpdateTransactionData, UpdateTransactionState, update_transaction_endpoint};

    fn new_transaction() -> NewTransaction {
        NewTransaction {
            category_id: None,
            transaction_type: TransactionType::Expense,
            amount: Amount::from_cents(500),
            currency: "USD".to_owned(),
            txn_date: date!(2024 - 06 - 03),
            payee: Some("Cafe".to_owned()),
            note: None,
        }
    }

    #[tokio::test]
    async fn update_changes_date_and_clears_payee() {
        let connection = get_test_connection();
        let user_id = create_test_user("a@x.com", &connection);
        let id = create_transaction(user_id, &new_transaction(), &connection).unwrap();
        let state = UpdateTransactionState {
            db_connection: shared_connection(connection),
        };
        let data: UpdateTransactionData =
            serde_json::from_str(r#"{"txn_date": "2024-06-04", "payee": null}"#).unwrap();

        let response =
            update_transaction_endpoint(State(state.clone()), Extension(user_id), PathId(id), JsonBody(data))
                .await
                .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        let got = get_transaction(id, user_id, &connection).unwrap();
        assert_eq!(got.txn_date, date!(2024 - 06 - 04));
        assert_eq!(got.payee, None);
    }

    #[tokio::test]
    async fn update_with_unknown_category_is_not_found() {
        let connection = get_test_connection();
        let user_id = create_test_user("a@x.com", &connection);
        let id = create_transaction(user_id, &new_transaction(), &connection).unwrap();
        let state = UpdateTransactionState {
            db_connection: shared_connection(connection),
        };
        let data: UpdateTransactionData = serde_json::from_str(r#"{"category_id": 77}"#).unwrap();

        let result =
            update_transaction_endpoint(State(state), Extension(user_id), PathId(id), JsonBody(data))
                .await;

        assert_eq!(result.unwrap_err(), Error::InvalidCategory);
    }

    #[tokio::test]
    async fn update_other_users_transaction_is_not_found() {
        let connection = get_test_connection();
        let owner = create_test_user("a@x.com", &connection);
        let stranger = create_test_user("b@x.com", &connection);
        let id = create_transaction(owner, &new_transaction(), &connection).unwrap();
        let state = UpdateTransactionState {
            db_connection: shared_connection(connection),
        };
        let data: UpdateTransactionData = serde_json::from_str(r#"{"note": "hi"}"#).unwrap();

        let result =
            update_transaction_endpoint(State(state), Extension(stranger), PathId(id), JsonBody(data))
                .await;

        assert_eq!(result.unwrap_err(), Error::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_without_fields_is_bad_request() {
        let connection = get_test_connection();
        let user_id = create_test_user("a@x.com", &connection);
        let state = UpdateTransactionState {
            db_connection: shared_connection(connection),
        };

        let result = update_transaction_endpoint(
            State(state),
            Extension(user_id),
            PathId(1),
            JsonBody(UpdateTransactionData::default()),
        )
        .await;

        assert_eq!(result.unwrap_err(), Error::NoFieldsToUpdate);
    }
}
