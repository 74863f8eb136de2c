//! Database operations for categories.
//!
//! Every query is scoped to the owning user: a category that belongs to
//! another user behaves exactly like one that does not exist.

use rusqlite::{Connection, Row, params_from_iter, types::Value};

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName, CategoryUpdate},
    db::SQL_NOW,
    user::UserID,
};

const CATEGORY_COLUMNS: &str = "id, name, color_hex, is_archived, created_at, updated_at";

/// Create a category and return it with its generated ID and timestamps.
///
/// # Errors
///
/// Returns an [Error::DuplicateCategory] if the user already has a category
/// with the same name, or an [Error::Sql] if another SQL error occurred.
pub fn create_category(
    user_id: UserID,
    name: CategoryName,
    color_hex: Option<String>,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO category (user_id, name, color_hex) VALUES (?1, ?2, ?3)
            RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row((user_id.as_i64(), name.as_ref(), color_hex), map_row)
        .map_err(Error::from)
}

/// Retrieve one of the user's categories by ID.
///
/// # Errors
///
/// Returns [Error::NOT_FOUND] if the category does not exist or belongs to
/// another user.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((category_id, user_id.as_i64()), map_row)
        .map_err(Error::from)
}

/// Whether `category_id` refers to one of the user's categories.
pub fn category_exists(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .prepare("SELECT EXISTS (SELECT 1 FROM category WHERE id = ?1 AND user_id = ?2)")?
        .query_row((category_id, user_id.as_i64()), |row| row.get(0))
        .map_err(Error::from)
}

/// Retrieve all of the user's categories ordered alphabetically by name.
pub fn get_all_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE user_id = ?1 ORDER BY name ASC"
        ))?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Apply a partial update to one of the user's categories.
///
/// # Errors
///
/// Returns:
/// - [Error::NoFieldsToUpdate] if `update` is empty,
/// - [Error::NOT_FOUND] if the category does not exist or belongs to another user,
/// - [Error::DuplicateCategory] if the new name is already used by another of
///   the user's categories.
pub fn update_category(
    category_id: CategoryId,
    user_id: UserID,
    update: &CategoryUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    if update.is_empty() {
        return Err(Error::NoFieldsToUpdate);
    }

    let mut assignments = Vec::new();
    let mut values = Vec::new();

    if let Some(name) = &update.name {
        assignments.push("name = ?");
        values.push(Value::Text(name.as_ref().to_owned()));
    }

    if let Some(color_hex) = &update.color_hex {
        assignments.push("color_hex = ?");
        values.push(color_hex.clone().map_or(Value::Null, Value::Text));
    }

    if let Some(is_archived) = update.is_archived {
        assignments.push("is_archived = ?");
        values.push(Value::Integer(is_archived.into()));
    }

    values.push(Value::Integer(category_id));
    values.push(Value::Integer(user_id.as_i64()));

    let query = format!(
        "UPDATE category SET {}, updated_at = {SQL_NOW} WHERE id = ? AND user_id = ?",
        assignments.join(", ")
    );

    let rows_affected = connection.execute(&query, params_from_iter(values))?;

    if rows_affected == 0 {
        return Err(Error::NOT_FOUND);
    }

    Ok(())
}

/// Delete one of the user's categories.
///
/// Transactions in the category are kept and become uncategorized.
///
/// # Errors
///
/// Returns [Error::NOT_FOUND] if the category does not exist or belongs to
/// another user.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NOT_FOUND);
    }

    Ok(())
}

/// Initialize the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            color_hex TEXT,
            is_archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT ({SQL_NOW}),
            updated_at TEXT NOT NULL DEFAULT ({SQL_NOW}),
            UNIQUE(user_id, name)
        );"
    ))?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(Category {
        id: row.get(0)?,
        name: CategoryName::new_unchecked(&raw_name),
        color_hex: row.get(2)?,
        is_archived: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
