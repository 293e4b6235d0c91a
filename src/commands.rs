//! Built-in bot commands for linked chats.

use stride_core::types::Goal;

/// Known bot commands.
pub enum Command {
    /// List the account's goals.
    Goals,
    /// Start the goal-creation dialogue.
    Create,
    /// Cancel — only meaningful inside a dialogue; outside one it gets a
    /// short notice.
    Cancel,
    Help,
}

impl Command {
    /// Parse a command from message text. Returns `None` for anything else,
    /// which the gateway answers with an unknown-command reply.
    pub fn parse(text: &str) -> Option<Self> {
        let cmd = text.split_whitespace().next()?;
        match cmd {
            "/goals" => Some(Self::Goals),
            "/create" => Some(Self::Create),
            "/cancel" => Some(Self::Cancel),
            "/help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Render a goal list, one line per goal.
pub fn render_goals(goals: &[Goal]) -> String {
    if goals.is_empty() {
        return "You have no goals yet. Send /create to add one.".to_string();
    }
    let mut out = String::new();
    for goal in goals {
        out.push_str(&format!("#{} {}\n", goal.id, goal.title));
    }
    out
}

pub fn help() -> String {
    "\
Stride commands\n\n\
/goals  — List your goals\n\
/create — Create a goal step by step\n\
/cancel — Abort goal creation\n\
/help   — This message"
        .to_string()
}
