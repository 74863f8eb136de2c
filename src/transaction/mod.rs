//! Income and expense transactions: storage, validation and the CRUD endpoints.

mod core;
mod create;
mod delete;
mod edit;
mod fields;
mod list;
mod query;

pub use self::core::{
    NewTransaction, Transaction, TransactionType, TransactionUpdate, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, update_transaction,
};
pub use create::create_transaction_endpoint;
pub use delete::delete_transaction_endpoint;
pub use edit::update_transaction_endpoint;
pub use list::{get_transaction_endpoint, list_transactions_endpoint};
pub use query::{TransactionFilter, list_transactions};
