//! Categories for grouping a user's transactions (e.g., 'Groceries', 'Salary').

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod filter;
mod list;

pub use create::create_category_endpoint;
pub use db::{
    category_exists, create_category, create_category_table, delete_category,
    get_all_categories, get_category, update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryId, CategoryName, CategoryUpdate};
pub use edit::update_category_endpoint;
pub use filter::{resolve_category_filter, resolve_category_id};
pub use list::list_categories_endpoint;
