use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::validation::is_present;

/// A user-owned category of todo items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Assigned by storage; must be null on creation
    #[schema(example = "null")]
    pub id: Option<i64>,

    #[schema(example = "Work")]
    pub title: Option<String>,

    #[schema(example = "0")]
    pub completed_count: Option<i64>,

    #[schema(example = "0")]
    pub uncompleted_count: Option<i64>,

    /// Owner, always taken from the access token
    #[schema(example = "0b9e3d2c-8f1f-4bb6-9a51-3c2f6c7d9e10")]
    pub user_id: Option<String>,
}

impl Category {
    /// Ids of 0 count as unset
    pub fn has_id(&self) -> bool {
        matches!(self.id, Some(id) if id != 0)
    }

    pub fn has_title(&self) -> bool {
        is_present(self.title.as_deref())
    }
}

/// Search filter for `/category/search`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategorySearchValues {
    #[schema(example = "wo")]
    pub title: Option<String>,

    /// Ignored on input, replaced by the token subject
    pub user_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("id={0} not found")]
    NotFound(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_json_uses_camel_case() {
        let category = Category {
            id: Some(3),
            title: Some("Work".to_string()),
            completed_count: Some(1),
            uncompleted_count: Some(2),
            user_id: Some("u1".to_string()),
        };

        let json = serde_json::to_value(&category).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["completedCount"], 1);
        assert_eq!(json["uncompletedCount"], 2);
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let category: Category = serde_json::from_str(r#"{"title":"Work"}"#).unwrap();
        assert!(!category.has_id());
        assert!(category.has_title());
        assert!(category.user_id.is_none());
    }

    #[test]
    fn test_zero_id_counts_as_unset() {
        let category = Category {
            id: Some(0),
            ..Default::default()
        };
        assert!(!category.has_id());
    }

    #[test]
    fn test_blank_title_is_not_present() {
        let category = Category {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(!category.has_title());
    }
}
