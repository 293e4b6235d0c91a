//! Chat identity lifecycle: get-or-create, verification codes, linking.

use super::Store;
use stride_core::error::StrideError;
use stride_core::types::TgUser;

impl Store {
    /// Fetch the identity for a chat, creating an unlinked one on first
    /// contact. Returns the identity and whether it was just created.
    ///
    /// chat_id is the primary key, so repeated calls never duplicate.
    pub async fn get_or_create_tg_user(&self, chat_id: i64) -> Result<(TgUser, bool), StrideError> {
        if let Some(existing) = self.get_tg_user(chat_id).await? {
            return Ok((existing, false));
        }

        sqlx::query("INSERT INTO tg_users (chat_id) VALUES (?)")
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StrideError::Store(format!("create tg_user failed: {e}")))?;

        Ok((
            TgUser {
                chat_id,
                user_id: None,
                verification_code: None,
            },
            true,
        ))
    }

    /// Look up an identity by chat id.
    pub async fn get_tg_user(&self, chat_id: i64) -> Result<Option<TgUser>, StrideError> {
        let row: Option<(i64, Option<i64>, Option<String>)> = sqlx::query_as(
            "SELECT chat_id, user_id, verification_code FROM tg_users WHERE chat_id = ?",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StrideError::Store(format!("get tg_user failed: {e}")))?;

        Ok(row.map(|(chat_id, user_id, verification_code)| TgUser {
            chat_id,
            user_id,
            verification_code,
        }))
    }

    /// Store a pending verification code for a chat, overwriting (and thereby
    /// invalidating) any previous one.
    pub async fn set_verification_code(
        &self,
        chat_id: i64,
        code: &str,
    ) -> Result<(), StrideError> {
        sqlx::query("UPDATE tg_users SET verification_code = ? WHERE chat_id = ?")
            .bind(code)
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StrideError::Store(format!("set verification code failed: {e}")))?;
        Ok(())
    }

    /// Link the identity holding `code` to the given account, consuming the
    /// code. The link and the code clear happen in one UPDATE, so a consumed
    /// code can never link a second time.
    ///
    /// Fails with [`StrideError::CodeNotFound`] — without mutating anything —
    /// when no identity holds the code.
    pub async fn link_account(&self, code: &str, user_id: i64) -> Result<TgUser, StrideError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT chat_id FROM tg_users WHERE verification_code = ?")
                .bind(code)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StrideError::Store(format!("code lookup failed: {e}")))?;

        let chat_id = match row {
            Some((chat_id,)) => chat_id,
            None => return Err(StrideError::CodeNotFound),
        };

        sqlx::query(
            "UPDATE tg_users SET user_id = ?, verification_code = NULL \
             WHERE chat_id = ? AND verification_code = ?",
        )
        .bind(user_id)
        .bind(chat_id)
        .bind(code)
        .execute(&self.pool)
        .await
        .map_err(|e| StrideError::Store(format!("link account failed: {e}")))?;

        Ok(TgUser {
            chat_id,
            user_id: Some(user_id),
            verification_code: None,
        })
    }
}
