use std::sync::Arc;

use tracing::{error, info};

use crate::category::model::{Category, CategoryError};
use crate::category::repository::CategoryRepository;

#[derive(Clone)]
pub struct CategoryService {
    repository: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repository: Arc<dyn CategoryRepository>) -> Self {
        Self { repository }
    }

    pub async fn find_all(&self, user_id: &str) -> Result<Vec<Category>, CategoryError> {
        Ok(self.repository.find_by_user_id(user_id).await?)
    }

    pub async fn add(&self, category: Category) -> Result<Category, CategoryError> {
        let created = self.repository.insert(&category).await.map_err(|e| {
            error!("Failed to insert category: {}", e);
            CategoryError::DatabaseError(e)
        })?;

        info!("Created category with ID: {:?}", created.id);
        Ok(created)
    }

    /// Saves over the row with the same id. An unknown id stores a new row
    /// with a generated id; ids are never taken from the client.
    pub async fn update(&self, category: Category) -> Result<Category, CategoryError> {
        let updated = self.repository.update(&category).await.map_err(|e| {
            error!("Failed to save category {:?}: {}", category.id, e);
            CategoryError::DatabaseError(e)
        })?;

        match updated {
            Some(updated) => Ok(updated),
            None => {
                info!("Category {:?} not found, storing as new", category.id);
                self.add(category).await
            }
        }
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<(), CategoryError> {
        match self.repository.delete_by_id(id).await? {
            0 => Err(CategoryError::NotFound(id)),
            _ => {
                info!("Deleted category with ID: {}", id);
                Ok(())
            }
        }
    }

    pub async fn find_by_title(
        &self,
        title: Option<String>,
        user_id: &str,
    ) -> Result<Vec<Category>, CategoryError> {
        Ok(self.repository.find_by_title(title, user_id).await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Category, CategoryError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound(id))
    }
}
