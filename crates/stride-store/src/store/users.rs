//! Minimal account surface. Account management (registration, passwords,
//! sessions) belongs to the web application; the bot only needs ids and
//! usernames.

use super::Store;
use stride_core::error::StrideError;
use stride_core::types::User;

impl Store {
    /// Create an account. Used by the linking endpoint's tests and local
    /// setups; production accounts come from the web application.
    pub async fn create_user(&self, username: &str) -> Result<User, StrideError> {
        let result = sqlx::query("INSERT INTO users (username) VALUES (?)")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| StrideError::Store(format!("create user failed: {e}")))?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
        })
    }

    /// Look up an account by id.
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, StrideError> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, username FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StrideError::Store(format!("get user failed: {e}")))?;

        Ok(row.map(|(id, username)| User { id, username }))
    }
}
