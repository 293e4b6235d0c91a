//! Gateway — the dispatch loop connecting the Telegram client, the store,
//! and the goal-creation dialogue.
//!
//! One loop owns the update cursor and all dialogue sessions. Each inbound
//! message is routed by identity state: unlinked chats get the verification
//! handshake, linked chats go to their active dialogue or the command
//! router.

use crate::commands::{self, Command};
use crate::dialogue::{Dialogue, DialogueOutcome, GoalDraft};
use std::collections::HashMap;
use std::time::Duration;
use stride_channels::telegram::{TgClient, TgUpdate};
use stride_core::config::Config;
use stride_core::error::StrideError;
use stride_core::types::TgUser;
use stride_store::Store;
use tracing::{error, info, warn};
use uuid::Uuid;

/// The central dispatch loop.
pub struct Gateway {
    client: TgClient,
    store: Store,
    /// Sequence number of the next unseen update. Advancing it acknowledges
    /// prior updates to the gateway. Not persisted: a restart resumes from
    /// the gateway default, so updates arriving exactly during a restart
    /// window are lost (documented limitation).
    offset: i64,
    /// Active goal-creation dialogues, keyed by chat id. Owned exclusively
    /// by this loop; there is no concurrent mutation.
    sessions: HashMap<i64, Dialogue>,
    poll_timeout_secs: u64,
    idle_timeout: Option<Duration>,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(client: TgClient, store: Store, config: &Config) -> Self {
        let idle_secs = config.dialogue.idle_timeout_secs;
        Self {
            client,
            store,
            offset: 0,
            sessions: HashMap::new(),
            poll_timeout_secs: config.telegram.poll_timeout_secs,
            idle_timeout: (idle_secs > 0).then(|| Duration::from_secs(idle_secs)),
        }
    }

    /// Run the dispatch loop until ctrl-c.
    ///
    /// No single event's failure is fatal: poll errors back off and retry,
    /// send failures are logged and skipped.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        info!(
            "Stride gateway running | poll timeout: {}s | dialogue expiry: {}",
            self.poll_timeout_secs,
            match self.idle_timeout {
                Some(t) => format!("{}s", t.as_secs()),
                None => "off".to_string(),
            }
        );

        let mut backoff_secs: u64 = 1;

        loop {
            let client = self.client.clone();
            let offset = self.offset;
            let timeout = self.poll_timeout_secs;

            tokio::select! {
                result = client.get_updates(offset, timeout) => {
                    match result {
                        Ok(updates) => {
                            backoff_secs = 1;
                            for update in updates {
                                self.advance_cursor(update.update_id);
                                self.handle_update(update).await;
                            }
                        }
                        Err(e) => {
                            error!("poll failed (retry in {backoff_secs}s): {e}");
                            tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                            backoff_secs = (backoff_secs * 2).min(60);
                        }
                    }
                    self.expire_idle_sessions().await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        info!("Shutdown complete.");
        Ok(())
    }

    /// Acknowledge an update before handling it: a crash mid-processing may
    /// redeliver the event, but never silently skips one.
    fn advance_cursor(&mut self, update_id: i64) {
        self.offset = update_id + 1;
    }

    /// Route one update by the sender's identity state.
    async fn handle_update(&mut self, update: TgUpdate) {
        let Some(message) = update.message else {
            return;
        };
        // Non-text payloads (stickers, photos) are ignored.
        let Some(text) = message.text else {
            return;
        };
        let chat_id = message.chat.id;

        let (tg_user, created) = match self.store.get_or_create_tg_user(chat_id).await {
            Ok(pair) => pair,
            Err(e) => {
                error!("identity lookup for chat {chat_id} failed: {e}");
                return;
            }
        };

        match tg_user.user_id {
            Some(user_id) => self.handle_linked(chat_id, user_id, &text).await,
            None => self.handle_unlinked(&tg_user, created).await,
        }
    }

    /// Verification handshake for chats without a linked account.
    ///
    /// Greets once, on identity creation. Every unlinked message gets the
    /// verification prompt; the pending code is reused so a code the user is
    /// already typing into the site stays valid, and a fresh one is minted
    /// only when none is pending.
    async fn handle_unlinked(&self, tg_user: &TgUser, created: bool) {
        let chat_id = tg_user.chat_id;

        if created {
            info!("new chat identity {chat_id}");
            self.send(chat_id, "Hello! I'm the Stride goal bot.").await;
        }

        let code = match self.ensure_verification_code(tg_user).await {
            Ok(code) => code,
            Err(e) => {
                error!("failed to store verification code for chat {chat_id}: {e}");
                return;
            }
        };

        self.send(
            chat_id,
            &format!(
                "Please confirm your account: enter the code {code} \
                 on the site to link this chat."
            ),
        )
        .await;
    }

    /// Reuse the chat's pending verification code, or mint and persist a
    /// fresh one when none is pending.
    async fn ensure_verification_code(&self, tg_user: &TgUser) -> Result<String, StrideError> {
        if let Some(code) = &tg_user.verification_code {
            return Ok(code.clone());
        }
        let code = generate_verification_code();
        self.store
            .set_verification_code(tg_user.chat_id, &code)
            .await?;
        Ok(code)
    }

    /// Dispatch for linked chats: an active dialogue consumes the message;
    /// otherwise it goes to the command router.
    async fn handle_linked(&mut self, chat_id: i64, user_id: i64, text: &str) {
        if let Some(session) = self.sessions.get_mut(&chat_id) {
            let outcome = session.handle(text);
            match outcome {
                DialogueOutcome::Continue(reply) => {
                    self.send(chat_id, &reply).await;
                }
                DialogueOutcome::Cancelled(reply) => {
                    self.sessions.remove(&chat_id);
                    self.send(chat_id, &reply).await;
                }
                DialogueOutcome::Commit(draft) => {
                    self.sessions.remove(&chat_id);
                    self.commit_goal(chat_id, draft).await;
                }
            }
            return;
        }

        match Command::parse(text) {
            Some(Command::Goals) => {
                match self.store.list_goals(user_id).await {
                    Ok(goals) => self.send(chat_id, &commands::render_goals(&goals)).await,
                    Err(e) => {
                        error!("failed to list goals for chat {chat_id}: {e}");
                        self.send(chat_id, "Could not load your goals, please try again later.")
                            .await;
                    }
                }
            }
            Some(Command::Create) => {
                let categories = match self.store.list_categories(user_id).await {
                    Ok(categories) => categories,
                    Err(e) => {
                        error!("failed to list categories for chat {chat_id}: {e}");
                        self.send(chat_id, "Could not start, please try again later.")
                            .await;
                        return;
                    }
                };
                let (session, prompt) = Dialogue::new(user_id, categories);
                self.sessions.insert(chat_id, session);
                self.send(chat_id, &prompt).await;
            }
            Some(Command::Cancel) => {
                self.send(chat_id, "Nothing to cancel.").await;
            }
            Some(Command::Help) => {
                self.send(chat_id, &commands::help()).await;
            }
            None => {
                self.send(chat_id, "Unknown command. Send /help for the list of commands.")
                    .await;
            }
        }
    }

    /// Persist a finished dialogue as a goal due two weeks out and confirm.
    async fn commit_goal(&self, chat_id: i64, draft: GoalDraft) {
        let due_date = goal_due_date();
        match self
            .store
            .create_goal(
                draft.user_id,
                draft.category.id,
                &draft.title,
                &draft.description,
                due_date,
            )
            .await
        {
            Ok(goal) => {
                info!("goal #{} created for chat {chat_id}", goal.id);
                self.send(chat_id, &format!("Goal created: #{} {}", goal.id, goal.title))
                    .await;
            }
            Err(e) => {
                error!("failed to create goal for chat {chat_id}: {e}");
                self.send(chat_id, "Could not save the goal, please try again later.")
                    .await;
            }
        }
    }

    /// Auto-cancel dialogues idle past the configured timeout.
    async fn expire_idle_sessions(&mut self) {
        let Some(timeout) = self.idle_timeout else {
            return;
        };

        let expired: Vec<i64> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.idle_for() >= timeout)
            .map(|(chat_id, _)| *chat_id)
            .collect();

        for chat_id in expired {
            self.sessions.remove(&chat_id);
            info!("dialogue in chat {chat_id} expired after inactivity");
            self.send(chat_id, "Goal creation cancelled after inactivity.")
                .await;
        }
    }

    /// Best-effort send: delivery failure is logged and the loop carries on.
    async fn send(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.client.send_message(chat_id, text).await {
            warn!("send to chat {chat_id} failed: {e}");
        }
    }
}

/// Mint a one-time verification code: 32 hex chars of OS randomness.
/// Uniqueness is not enforced; collisions are astronomically unlikely.
pub fn generate_verification_code() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Due date for a goal created through the bot: two weeks out.
fn goal_due_date() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now() + chrono::Duration::days(14)
}
