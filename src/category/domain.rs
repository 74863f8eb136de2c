//! Core category domain types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseID, validation};

/// The longest category name, in characters.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;

/// A validated category name: trimmed and 1 to 100 characters long.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name from user input.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if `name` is empty or longer than
    /// [MAX_CATEGORY_NAME_LENGTH] characters after trimming.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if validation::string_len(name, 1, MAX_CATEGORY_NAME_LENGTH) {
            Ok(Self(name.to_owned()))
        } else {
            Err(Error::Validation("Invalid category name".to_owned()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the name is trimmed and within the length
    /// limits.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check an optional `#RRGGBB` colour. `None` means "no colour".
///
/// # Errors
///
/// Returns an [Error::Validation] if the colour is present but malformed.
pub fn parse_color(color_hex: Option<String>) -> Result<Option<String>, Error> {
    match color_hex {
        Some(color) if !validation::color_hex(&color) => {
            Err(Error::Validation("Invalid color_hex".to_owned()))
        }
        color => Ok(color),
    }
}

/// Database identifier for a category.
pub type CategoryId = DatabaseID;

/// A user's spending or income category (e.g., 'Groceries', 'Salary').
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: CategoryName,
    pub color_hex: Option<String>,
    pub is_archived: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// The changes requested by a partial category update.
///
/// `None` leaves a field unchanged. For `color_hex`, `Some(None)` clears the
/// colour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub name: Option<CategoryName>,
    pub color_hex: Option<Option<String>>,
    pub is_archived: Option<bool>,
}

impl CategoryUpdate {
    /// Whether the update would not change anything.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color_hex.is_none() && self.is_archived.is_none()
    }
}


#[cfg(test)]
mod parse_color_tests {
    use crate::Error;

    use super::parse_color;

    #[test]
    fn no_color_is_allowed() {
        assert_eq!(parse_color(None), Ok(None));
    }

    #[test]
    fn valid_color_is_kept() {
        assert_eq!(
            parse_color(Some("#10B981".to_owned())),
            Ok(Some("#10B981".to_owned()))
        );
    }

    #[test]
    fn malformed_color_is_rejected() {
        for color in ["10B981", "#10B98", "#GGGGGG", ""] {
            assert_eq!(
                parse_color(Some(color.to_owned())),
                Err(Error::Validation("Invalid color_hex".to_owned()))
            );
        }
    }
}
