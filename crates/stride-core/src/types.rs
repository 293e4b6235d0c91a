use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat identity: one external Telegram chat, lazily created on the first
/// inbound message and optionally linked to a web account.
///
/// The identity is in exactly one of two states: unlinked (`user_id` is
/// `None`, possibly holding a pending verification code) or linked
/// (`user_id` set, code cleared). The bot never deletes identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TgUser {
    /// Telegram chat id — the natural key.
    pub chat_id: i64,
    /// Linked web account, set exactly once upon successful verification.
    pub user_id: Option<i64>,
    /// Pending one-time verification code. A single active code at a time;
    /// issuing a new one overwrites the previous.
    pub verification_code: Option<String>,
}

impl TgUser {
    /// Whether this chat has been linked to a web account.
    pub fn is_linked(&self) -> bool {
        self.user_id.is_some()
    }
}

/// A web account. Account management is owned by the web application; the
/// bot only needs the id for ownership and the username for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// A goal category, owned by one account. Categories are soft-deleted by the
/// web application; the bot never offers deleted ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalCategory {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub is_deleted: bool,
}

/// A goal record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
}
