use axum::async_trait;
use sqlx::PgPool;

use crate::category::model::Category;

const CATEGORY_COLUMNS: &str = "id, title, completed_count, uncompleted_count, user_id";

/// Storage of categories
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories of a user, ordered by title
    async fn find_by_user_id(&self, user_id: &str) -> Result<Vec<Category>, sqlx::Error>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, sqlx::Error>;

    /// Case-insensitive title substring match within one user's categories.
    /// A missing or empty title matches everything.
    async fn find_by_title(
        &self,
        title: Option<String>,
        user_id: &str,
    ) -> Result<Vec<Category>, sqlx::Error>;

    /// Insert a new row; the id of `category` is ignored
    async fn insert(&self, category: &Category) -> Result<Category, sqlx::Error>;

    /// Update the row with the id of `category`; `None` when no such row exists
    async fn update(&self, category: &Category) -> Result<Option<Category>, sqlx::Error>;

    /// Returns the number of deleted rows
    async fn delete_by_id(&self, id: i64) -> Result<u64, sqlx::Error>;
}

pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM todo.category WHERE user_id = $1 ORDER BY title ASC",
            CATEGORY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM todo.category WHERE id = $1",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_by_title(
        &self,
        title: Option<String>,
        user_id: &str,
    ) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            SELECT {} FROM todo.category
            WHERE ($1::text IS NULL OR $1 = '' OR LOWER(title) LIKE '%' || LOWER($1) || '%')
              AND user_id = $2
            ORDER BY title ASC
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(title)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn insert(&self, category: &Category) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO todo.category (title, completed_count, uncompleted_count, user_id)
            VALUES ($1, COALESCE($2, 0), COALESCE($3, 0), $4)
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(&category.title)
        .bind(category.completed_count)
        .bind(category.uncompleted_count)
        .bind(&category.user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn update(&self, category: &Category) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE todo.category SET
                title = $2,
                completed_count = COALESCE($3, completed_count),
                uncompleted_count = COALESCE($4, uncompleted_count),
                user_id = $5
            WHERE id = $1
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(category.id)
        .bind(&category.title)
        .bind(category.completed_count)
        .bind(category.uncompleted_count)
        .bind(&category.user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_by_id(&self, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todo.category WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
