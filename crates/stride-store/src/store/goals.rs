//! Goal categories and goal records.

use super::Store;
use chrono::{DateTime, Utc};
use stride_core::error::StrideError;
use stride_core::types::{Goal, GoalCategory};

impl Store {
    /// Create a goal category for an account.
    pub async fn create_category(
        &self,
        user_id: i64,
        title: &str,
    ) -> Result<GoalCategory, StrideError> {
        let result = sqlx::query("INSERT INTO goal_categories (user_id, title) VALUES (?, ?)")
            .bind(user_id)
            .bind(title)
            .execute(&self.pool)
            .await
            .map_err(|e| StrideError::Store(format!("create category failed: {e}")))?;

        Ok(GoalCategory {
            id: result.last_insert_rowid(),
            user_id,
            title: title.to_string(),
            is_deleted: false,
        })
    }

    /// Soft-delete a category. Returns `true` if a row changed.
    pub async fn delete_category(&self, category_id: i64) -> Result<bool, StrideError> {
        let result = sqlx::query("UPDATE goal_categories SET is_deleted = 1 WHERE id = ?")
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StrideError::Store(format!("delete category failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// List an account's categories, excluding soft-deleted ones.
    pub async fn list_categories(&self, user_id: i64) -> Result<Vec<GoalCategory>, StrideError> {
        let rows: Vec<(i64, i64, String)> = sqlx::query_as(
            "SELECT id, user_id, title FROM goal_categories \
             WHERE user_id = ? AND is_deleted = 0 \
             ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StrideError::Store(format!("list categories failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(id, user_id, title)| GoalCategory {
                id,
                user_id,
                title,
                is_deleted: false,
            })
            .collect())
    }

    /// Create a goal record.
    pub async fn create_goal(
        &self,
        user_id: i64,
        category_id: i64,
        title: &str,
        description: &str,
        due_date: DateTime<Utc>,
    ) -> Result<Goal, StrideError> {
        let result = sqlx::query(
            "INSERT INTO goals (user_id, category_id, title, description, due_date) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(category_id)
        .bind(title)
        .bind(description)
        .bind(due_date)
        .execute(&self.pool)
        .await
        .map_err(|e| StrideError::Store(format!("create goal failed: {e}")))?;

        Ok(Goal {
            id: result.last_insert_rowid(),
            user_id,
            category_id,
            title: title.to_string(),
            description: description.to_string(),
            due_date,
        })
    }

    /// List an account's goals in creation order.
    pub async fn list_goals(&self, user_id: i64) -> Result<Vec<Goal>, StrideError> {
        let rows: Vec<(i64, i64, i64, String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, user_id, category_id, title, description, due_date \
             FROM goals WHERE user_id = ? ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StrideError::Store(format!("list goals failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, user_id, category_id, title, description, due_date)| Goal {
                    id,
                    user_id,
                    category_id,
                    title,
                    description,
                    due_date,
                },
            )
            .collect())
    }
}
