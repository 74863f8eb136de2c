//! Core transaction types and database operations.
//!
//! Amounts are stored as integer cents and dates as `YYYY-MM-DD` text, so
//! date ranges can be compared as strings.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql, params_from_iter,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Value, ValueRef},
};
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    category::CategoryId,
    database_id::TransactionId,
    db::SQL_NOW,
    money::Amount,
    user::UserID,
};

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(Error::Validation("type must be income|expense".to_owned())),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(error.to_string().into()))
    }
}

/// A stored transaction, joined with the name and colour of its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub category_id: Option<CategoryId>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Amount,
    pub currency: String,
    #[serde(with = "crate::period::ymd_date")]
    pub txn_date: Date,
    pub payee: Option<String>,
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
}

/// A validated transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub category_id: Option<CategoryId>,
    pub transaction_type: TransactionType,
    pub amount: Amount,
    pub currency: String,
    pub txn_date: Date,
    pub payee: Option<String>,
    pub note: Option<String>,
}

/// The validated changes of a partial transaction update.
///
/// `None` leaves a field unchanged. For the nullable fields, `Some(None)`
/// clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionUpdate {
    pub transaction_type: Option<TransactionType>,
    pub amount: Option<Amount>,
    pub currency: Option<String>,
    pub txn_date: Option<Date>,
    pub category_id: Option<Option<CategoryId>>,
    pub payee: Option<Option<String>>,
    pub note: Option<Option<String>>,
}

impl TransactionUpdate {
    /// Whether the update would not change anything.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// The columns read by [map_transaction_row], for a query over `"transaction" t`
/// left joined with `category c`.
pub(crate) const TRANSACTION_SELECT: &str = "SELECT t.id, t.category_id, t.type, t.amount_cents, \
    t.currency, t.txn_date, t.payee, t.note, t.created_at, t.updated_at, \
    c.name, c.color_hex \
    FROM \"transaction\" t \
    LEFT JOIN category c ON c.id = t.category_id";

/// Create a new transaction in the database.
///
/// The caller must check that `category_id` belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if `category_id` does not refer to a valid category,
/// - [Error::Validation] if the amount is out of range,
/// - [Error::Sql] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<TransactionId, Error> {
    let amount_cents = transaction.amount.cents()?;

    connection
        .prepare(
            "INSERT INTO \"transaction\" \
            (user_id, category_id, type, amount_cents, currency, txn_date, payee, note) \
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
            RETURNING id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                transaction.category_id,
                transaction.transaction_type,
                amount_cents,
                &transaction.currency,
                transaction.txn_date,
                &transaction.payee,
                &transaction.note,
            ),
            |row| row.get(0),
        )
        .map_err(map_foreign_key_error)
}

/// Retrieve one of the user's transactions.
///
/// # Errors
/// This function will return a:
/// - [Error::NOT_FOUND] if the transaction does not exist or belongs to another user,
/// - [Error::Sql] if there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "{TRANSACTION_SELECT} WHERE t.id = ?1 AND t.user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_transaction_row)
        .map_err(Error::from)
}

/// Apply a partial update to one of the user's transactions.
///
/// The caller must check that a new category belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NoFieldsToUpdate] if `update` is empty,
/// - [Error::NOT_FOUND] if the transaction does not exist or belongs to another user,
/// - [Error::InvalidCategory] if the new category does not exist,
/// - [Error::Sql] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    update: &TransactionUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    if update.is_empty() {
        return Err(Error::NoFieldsToUpdate);
    }

    let mut assignments = Vec::new();
    let mut values = Vec::new();

    if let Some(transaction_type) = update.transaction_type {
        assignments.push("type = ?");
        values.push(Value::Text(transaction_type.as_str().to_owned()));
    }

    if let Some(amount) = update.amount {
        assignments.push("amount_cents = ?");
        values.push(Value::Integer(amount.cents()?));
    }

    if let Some(currency) = &update.currency {
        assignments.push("currency = ?");
        values.push(Value::Text(currency.clone()));
    }

    if let Some(txn_date) = update.txn_date {
        assignments.push("txn_date = ?");
        values.push(Value::Text(crate::period::format_date(txn_date)));
    }

    if let Some(category_id) = update.category_id {
        assignments.push("category_id = ?");
        values.push(category_id.map_or(Value::Null, Value::Integer));
    }

    if let Some(payee) = &update.payee {
        assignments.push("payee = ?");
        values.push(payee.clone().map_or(Value::Null, Value::Text));
    }

    if let Some(note) = &update.note {
        assignments.push("note = ?");
        values.push(note.clone().map_or(Value::Null, Value::Text));
    }

    values.push(Value::Integer(id));
    values.push(Value::Integer(user_id.as_i64()));

    let query = format!(
        "UPDATE \"transaction\" SET {}, updated_at = {SQL_NOW} WHERE id = ? AND user_id = ?",
        assignments.join(", ")
    );

    let rows_affected = connection
        .execute(&query, params_from_iter(values))
        .map_err(map_foreign_key_error)?;

    if rows_affected == 0 {
        return Err(Error::NOT_FOUND);
    }

    Ok(())
}

/// Delete one of the user's transactions.
///
/// # Errors
/// This function will return a:
/// - [Error::NOT_FOUND] if the transaction does not exist or belongs to another user,
/// - [Error::Sql] if there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NOT_FOUND);
    }

    Ok(())
}

/// Create the transaction table and its indexes.
///
/// # Errors
/// Returns an error if the table or the index could not be created.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
            currency TEXT NOT NULL,
            txn_date TEXT NOT NULL,
            payee TEXT,
            note TEXT,
            created_at TEXT NOT NULL DEFAULT ({SQL_NOW}),
            updated_at TEXT NOT NULL DEFAULT ({SQL_NOW})
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, txn_date);
        CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);"
    ))?;

    Ok(())
}

/// Map a row selected with [TRANSACTION_SELECT] to a [Transaction].
pub(crate) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        category_id: row.get(1)?,
        transaction_type: row.get(2)?,
        amount: Amount::from_cents(row.get(3)?),
        currency: row.get(4)?,
        txn_date: row.get(5)?,
        payee: row.get(6)?,
        note: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        category_name: row.get(10)?,
        category_color: row.get(11)?,
    })
}

fn map_foreign_key_error(error: rusqlite::Error) -> Error {
    match error {
        // Code 787 occurs when a FOREIGN KEY constraint failed.
        rusqlite::Error::SqliteFailure(sql_error, _)
            if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            Error::InvalidCategory
        }
        error => error.into(),
    }
}


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        category::{CategoryName, create_category, delete_category},
        money::Amount,
        test_utils::{create_test_user, get_test_connection},
        user::UserID,
    };

    use super::{
        NewTransaction, TransactionType, TransactionUpdate, create_transaction,
        delete_transaction, get_transaction, update_transaction,
    };

    fn groceries(category_id: Option<i64>) -> NewTransaction {
        NewTransaction {
            category_id,
            transaction_type: TransactionType::Expense,
            amount: Amount::parse("42.50").unwrap(),
            currency: "USD".to_owned(),
            txn_date: date!(2024 - 06 - 03),
            payee: Some("Market".to_owned()),
            note: None,
        }
    }

    fn setup() -> (Connection, UserID, UserID) {
        let connection = get_test_connection();
        let owner = create_test_user("a@x.com", &connection);
        let stranger = create_test_user("b@x.com", &connection);

        (connection, owner, stranger)
    }

    #[test]
    fn create_and_get_transaction() {
        let (connection, user_id, _) = setup();
        let category = create_category(
            user_id,
            CategoryName::new_unchecked("Groceries"),
            Some("#10B981".to_owned()),
            &connection,
        )
        .unwrap();

        let id = create_transaction(user_id, &groceries(Some(category.id)), &connection).unwrap();
        let got = get_transaction(id, user_id, &connection).unwrap();

        assert_eq!(got.id, id);
        assert_eq!(got.amount.to_string(), "42.50");
        assert_eq!(got.transaction_type, TransactionType::Expense);
        assert_eq!(got.txn_date, date!(2024 - 06 - 03));
        assert_eq!(got.category_name.as_deref(), Some("Groceries"));
        assert_eq!(got.category_color.as_deref(), Some("#10B981"));
        assert_eq!(got.payee.as_deref(), Some("Market"));
    }

    #[test]
    fn serialized_transaction_uses_api_field_names() {
        let (connection, user_id, _) = setup();
        let id = create_transaction(user_id, &groceries(None), &connection).unwrap();

        let json = serde_json::to_value(get_transaction(id, user_id, &connection).unwrap()).unwrap();

        assert_eq!(json["type"], "expense");
        assert_eq!(json["amount"], "42.50");
        assert_eq!(json["txn_date"], "2024-06-03");
        assert_eq!(json["category_id"], serde_json::Value::Null);
        assert_eq!(json["category_name"], serde_json::Value::Null);
    }

    #[test]
    fn create_with_missing_category_fails() {
        let (connection, user_id, _) = setup();

        let result = create_transaction(user_id, &groceries(Some(999)), &connection);

        assert_eq!(result, Err(Error::InvalidCategory));
    }

    #[test]
    fn get_other_users_transaction_is_not_found() {
        let (connection, owner, stranger) = setup();
        let id = create_transaction(owner, &groceries(None), &connection).unwrap();

        assert_eq!(
            get_transaction(id, stranger, &connection),
            Err(Error::NOT_FOUND)
        );
    }

    #[test]
    fn update_changes_only_given_fields() {
        let (connection, user_id, _) = setup();
        let id = create_transaction(user_id, &groceries(None), &connection).unwrap();
        let update = TransactionUpdate {
            amount: Some(Amount::parse("10").unwrap()),
            payee: Some(None),
            ..Default::default()
        };

        update_transaction(id, user_id, &update, &connection).unwrap();

        let got = get_transaction(id, user_id, &connection).unwrap();
        assert_eq!(got.amount.to_string(), "10.00");
        assert_eq!(got.payee, None);
        assert_eq!(got.currency, "USD");
        assert_eq!(got.txn_date, date!(2024 - 06 - 03));
    }

    #[test]
    fn update_can_move_and_clear_category() {
        let (connection, user_id, _) = setup();
        let category =
            create_category(user_id, CategoryName::new_unchecked("Food"), None, &connection)
                .unwrap();
        let id = create_transaction(user_id, &groceries(None), &connection).unwrap();

        let set = TransactionUpdate {
            category_id: Some(Some(category.id)),
            ..Default::default()
        };
        update_transaction(id, user_id, &set, &connection).unwrap();
        assert_eq!(
            get_transaction(id, user_id, &connection).unwrap().category_id,
            Some(category.id)
        );

        let clear = TransactionUpdate {
            category_id: Some(None),
            ..Default::default()
        };
        update_transaction(id, user_id, &clear, &connection).unwrap();
        assert_eq!(
            get_transaction(id, user_id, &connection).unwrap().category_id,
            None
        );
    }

    #[test]
    fn update_other_users_transaction_is_not_found() {
        let (connection, owner, stranger) = setup();
        let id = create_transaction(owner, &groceries(None), &connection).unwrap();
        let update = TransactionUpdate {
            note: Some(Some("mine now".to_owned())),
            ..Default::default()
        };

        let result = update_transaction(id, stranger, &update, &connection);

        assert_eq!(result, Err(Error::NOT_FOUND));
        assert_eq!(get_transaction(id, owner, &connection).unwrap().note, None);
    }

    #[test]
    fn empty_update_is_rejected() {
        let (connection, user_id, _) = setup();

        let result = update_transaction(1, user_id, &TransactionUpdate::default(), &connection);

        assert_eq!(result, Err(Error::NoFieldsToUpdate));
    }

    #[test]
    fn delete_transaction_succeeds_once() {
        let (connection, user_id, _) = setup();
        let id = create_transaction(user_id, &groceries(None), &connection).unwrap();

        assert_eq!(delete_transaction(id, user_id, &connection), Ok(()));
        assert_eq!(
            delete_transaction(id, user_id, &connection),
            Err(Error::NOT_FOUND)
        );
    }

    #[test]
    fn deleting_category_uncategorizes_transactions() {
        let (connection, user_id, _) = setup();
        let category =
            create_category(user_id, CategoryName::new_unchecked("Food"), None, &connection)
                .unwrap();
        let id = create_transaction(user_id, &groceries(Some(category.id)), &connection).unwrap();

        delete_category(category.id, user_id, &connection).unwrap();

        let got = get_transaction(id, user_id, &connection).unwrap();
        assert_eq!(got.category_id, None);
        assert_eq!(got.category_name, None);
    }
}
