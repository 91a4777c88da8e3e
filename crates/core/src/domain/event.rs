// Event Domain Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sequence identifier assigned by the source (monotonic per source)
pub type EventId = i64;

/// Conversation the event came from (and replies go to)
pub type ChatId = i64;

/// Platform user who sent the event
pub type UserId = i64;

/// A command extracted from message text: `/name[@bot] args...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    pub args: String,
}

impl Command {
    /// Parse a command out of message text.
    ///
    /// Returns `None` for plain text and for malformed commands (a bare `/`
    /// or `/@bot`).
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.strip_prefix('/')?;
        let (head, args) = match rest.find(char::is_whitespace) {
            Some(idx) => (&rest[..idx], rest[idx..].trim()),
            None => (rest, ""),
        };
        // Addressed form: /stat@herald_bot
        let name = head.split('@').next().unwrap_or_default();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            args: args.to_string(),
        })
    }
}

/// Inbound unit of work.
///
/// Immutable once built; queues move it, the dispatch core never copies it.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub chat_id: ChatId,
    pub sender_id: Option<UserId>,
    pub arrived_at: DateTime<Utc>,
    pub command: Option<Command>,
    pub text: Option<String>,
    pub raw: serde_json::Value,
}

impl Event {
    /// Build an event from message text, extracting the command if present
    pub fn new(
        id: EventId,
        chat_id: ChatId,
        arrived_at: DateTime<Utc>,
        text: Option<String>,
    ) -> Self {
        let command = text.as_deref().and_then(Command::parse);
        Self {
            id,
            chat_id,
            sender_id: None,
            arrived_at,
            command,
            text,
            raw: serde_json::Value::Null,
        }
    }

    pub fn with_sender(mut self, sender_id: UserId) -> Self {
        self.sender_id = Some(sender_id);
        self
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = raw;
        self
    }

    /// Command name, if this event carries a well-formed command
    pub fn command_name(&self) -> Option<&str> {
        self.command.as_ref().map(|c| c.name.as_str())
    }

    /// Argument text of the command (empty when there is none)
    pub fn command_args(&self) -> &str {
        self.command.as_ref().map(|c| c.args.as_str()).unwrap_or("")
    }
}
