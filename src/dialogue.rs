//! Goal-creation dialogue — a per-chat, strictly linear state machine.
//!
//! Steps: choose category → enter title → enter description → commit.
//! `/cancel` aborts at any input step. Sessions are keyed by chat id in the
//! gateway, so one chat's dialogue never consumes another chat's messages
//! and the dispatch loop keeps serving everyone else.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use stride_core::types::GoalCategory;

/// The literal token that aborts a dialogue at any input step.
pub const CANCEL_TOKEN: &str = "/cancel";

const CANCELLED_REPLY: &str = "Goal creation cancelled.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    ChooseCategory,
    EnterTitle,
    EnterDescription,
}

/// What the gateway should do after feeding one message to a dialogue.
#[derive(Debug)]
pub enum DialogueOutcome {
    /// Send the reply and keep the session.
    Continue(String),
    /// Send the acknowledgement and drop the session. No goal is created,
    /// regardless of input accumulated so far.
    Cancelled(String),
    /// All fields collected: create the goal, confirm, drop the session.
    Commit(GoalDraft),
}

/// The collected fields of a finished dialogue.
#[derive(Debug, Clone)]
pub struct GoalDraft {
    pub user_id: i64,
    pub category: GoalCategory,
    pub title: String,
    pub description: String,
}

/// One in-flight goal-creation dialogue.
///
/// Holds a snapshot of the account's categories taken at entry; category
/// input is matched case-sensitively against that snapshot.
pub struct Dialogue {
    user_id: i64,
    categories: HashMap<String, GoalCategory>,
    step: Step,
    category: Option<GoalCategory>,
    title: Option<String>,
    last_activity: Instant,
}

impl Dialogue {
    /// Start a dialogue for a linked account. Returns the session and the
    /// entry prompt listing the category choices.
    ///
    /// An empty category list still prompts — selection can then only end
    /// in `/cancel`, which is acceptable.
    pub fn new(user_id: i64, categories: Vec<GoalCategory>) -> (Self, String) {
        let mut list = String::new();
        for category in &categories {
            list.push_str(&category.title);
            list.push('\n');
        }
        let prompt = format!("Choose a category:\n{list}\nSend {CANCEL_TOKEN} to abort.");

        let dialogue = Self {
            user_id,
            categories: categories
                .into_iter()
                .map(|c| (c.title.clone(), c))
                .collect(),
            step: Step::ChooseCategory,
            category: None,
            title: None,
            last_activity: Instant::now(),
        };

        (dialogue, prompt)
    }

    /// Feed one inbound message to the dialogue.
    pub fn handle(&mut self, text: &str) -> DialogueOutcome {
        self.last_activity = Instant::now();

        if text == CANCEL_TOKEN {
            return DialogueOutcome::Cancelled(CANCELLED_REPLY.to_string());
        }

        match self.step {
            Step::ChooseCategory => match self.categories.get(text) {
                Some(category) => {
                    self.category = Some(category.clone());
                    self.step = Step::EnterTitle;
                    DialogueOutcome::Continue(format!(
                        "Enter a title for the goal.\nSend {CANCEL_TOKEN} to abort."
                    ))
                }
                None => DialogueOutcome::Continue(format!(
                    "No such category. Choose one of the listed categories, \
                     or send {CANCEL_TOKEN} to abort."
                )),
            },
            Step::EnterTitle => {
                // Accepted verbatim, no validation.
                self.title = Some(text.to_string());
                self.step = Step::EnterDescription;
                DialogueOutcome::Continue(format!(
                    "Enter a description.\nSend {CANCEL_TOKEN} to abort."
                ))
            }
            Step::EnterDescription => {
                let (Some(category), Some(title)) = (self.category.take(), self.title.take())
                else {
                    // Unreachable by construction: both fields are set before
                    // this step. Treat as a cancelled session rather than
                    // panicking in the loop path.
                    return DialogueOutcome::Cancelled(CANCELLED_REPLY.to_string());
                };
                DialogueOutcome::Commit(GoalDraft {
                    user_id: self.user_id,
                    category,
                    title,
                    description: text.to_string(),
                })
            }
        }
    }

    /// Time since the last inbound message for this session.
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: i64, title: &str) -> GoalCategory {
        GoalCategory {
            id,
            user_id: 1,
            title: title.to_string(),
            is_deleted: false,
        }
    }

    fn dialogue() -> Dialogue {
        let (dialogue, _) = Dialogue::new(1, vec![category(10, "Work"), category(11, "Home")]);
        dialogue
    }

    #[test]
    fn test_entry_prompt_lists_categories() {
        let (_, prompt) = Dialogue::new(1, vec![category(10, "Work"), category(11, "Home")]);
        assert!(prompt.contains("Work\n"));
        assert!(prompt.contains("Home\n"));
        assert!(prompt.contains(CANCEL_TOKEN));
    }

    #[test]
    fn test_happy_path_creates_draft() {
        // Chat 555 with categories {Work, Home}: /create, Work,
        // "Finish report", "Draft outline" → one draft with those fields.
        let mut d = dialogue();

        assert!(matches!(d.handle("Work"), DialogueOutcome::Continue(_)));
        assert!(matches!(
            d.handle("Finish report"),
            DialogueOutcome::Continue(_)
        ));

        match d.handle("Draft outline") {
            DialogueOutcome::Commit(draft) => {
                assert_eq!(draft.user_id, 1);
                assert_eq!(draft.category.title, "Work");
                assert_eq!(draft.category.id, 10);
                assert_eq!(draft.title, "Finish report");
                assert_eq!(draft.description, "Draft outline");
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_category_does_not_advance() {
        let mut d = dialogue();

        match d.handle("Unknown") {
            DialogueOutcome::Continue(reply) => assert!(reply.contains("No such category")),
            other => panic!("expected re-prompt, got {other:?}"),
        }
        // Still at category selection: a valid title-looking input is
        // rejected too.
        assert!(matches!(d.handle("Groceries"), DialogueOutcome::Continue(_)));
        // A valid choice still works after any number of misses.
        match d.handle("Home") {
            DialogueOutcome::Continue(reply) => assert!(reply.contains("title")),
            other => panic!("expected title prompt, got {other:?}"),
        }
    }

    #[test]
    fn test_category_match_is_case_sensitive() {
        let mut d = dialogue();
        match d.handle("work") {
            DialogueOutcome::Continue(reply) => assert!(reply.contains("No such category")),
            other => panic!("expected re-prompt, got {other:?}"),
        }
    }

    #[test]
    fn test_cancel_at_each_step() {
        // At category selection.
        let mut d = dialogue();
        assert!(matches!(d.handle("/cancel"), DialogueOutcome::Cancelled(_)));

        // At title entry.
        let mut d = dialogue();
        d.handle("Work");
        assert!(matches!(d.handle("/cancel"), DialogueOutcome::Cancelled(_)));

        // At description entry, with valid input accumulated.
        let mut d = dialogue();
        d.handle("Work");
        d.handle("T");
        assert!(matches!(d.handle("/cancel"), DialogueOutcome::Cancelled(_)));
    }

    #[test]
    fn test_retry_then_cancel_scenario() {
        // /create, Unknown, Work, T, /cancel → no goal.
        let mut d = dialogue();
        assert!(matches!(d.handle("Unknown"), DialogueOutcome::Continue(_)));
        assert!(matches!(d.handle("Work"), DialogueOutcome::Continue(_)));
        assert!(matches!(d.handle("T"), DialogueOutcome::Continue(_)));
        assert!(matches!(d.handle("/cancel"), DialogueOutcome::Cancelled(_)));
    }

    #[test]
    fn test_title_and_description_accepted_verbatim() {
        let mut d = dialogue();
        d.handle("Home");
        // Even command-looking or odd text is a valid title.
        assert!(matches!(d.handle("/goals"), DialogueOutcome::Continue(_)));
        match d.handle("  spaced  ") {
            DialogueOutcome::Commit(draft) => {
                assert_eq!(draft.title, "/goals");
                assert_eq!(draft.description, "  spaced  ");
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_categories_still_prompts() {
        let (mut d, prompt) = Dialogue::new(1, Vec::new());
        assert!(prompt.contains("Choose a category"));
        // Nothing can match; only cancel ends the session.
        assert!(matches!(d.handle("Work"), DialogueOutcome::Continue(_)));
        assert!(matches!(d.handle("/cancel"), DialogueOutcome::Cancelled(_)));
    }

    #[test]
    fn test_idle_clock_resets_on_input() {
        let mut d = dialogue();
        d.handle("Work");
        assert!(d.idle_for() < Duration::from_secs(1));
    }
}
