//! Conversation Turns
//!
//! Append-only, ordered conversation history. Each turn is tagged by role;
//! tool-call turns carry the structured request and tool-result turns carry
//! the correlated payload, so the backend adapter can reconstruct the wire
//! messages without re-parsing content strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tool::{ToolCallRequest, ToolResult};

/// Role of a conversation turn
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// User input
    User,
    /// Final assistant text
    Assistant,
    /// A tool invocation requested by the model
    ToolCall,
    /// The result answering a tool-call turn
    ToolResult,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::ToolCall => write!(f, "tool-call"),
            Role::ToolResult => write!(f, "tool-result"),
        }
    }
}

/// A single turn in a conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Turn {
    /// Turn role
    pub role: Role,

    /// Text content (for tool turns, a rendered summary the model can read)
    pub content: String,

    /// Structured request, present on tool-call turns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<ToolCallRequest>,

    /// Structured result, present on tool-result turns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ToolResult>,

    /// Append timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            call: None,
            result: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a final assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a tool-call turn from a request
    pub fn tool_call(call: ToolCallRequest) -> Self {
        let mut turn = Self::new(Role::ToolCall, format!("[calling tool '{}']", call.name));
        turn.call = Some(call);
        turn
    }

    /// Create a tool-result turn from a result
    pub fn tool_result(result: ToolResult) -> Self {
        let mut turn = Self::new(Role::ToolResult, result.render());
        turn.result = Some(result);
        turn
    }

    /// Call id, for tool-call and tool-result turns
    pub fn call_id(&self) -> Option<&str> {
        self.call
            .as_ref()
            .map(|c| c.id.as_str())
            .or_else(|| self.result.as_ref().map(|r| r.id.as_str()))
    }
}

/// Ordered, append-only conversation history
///
/// Exclusively owned by one agent loop; insertion order is the only
/// meaningful order. `truncate` exists solely for the cancellation path,
/// which discards an incomplete tool-call/tool-result pairing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns, in append order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent turn
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Roll back to a previously recorded length
    ///
    /// Only called when a turn is abandoned mid-flight (backend failure or
    /// cancellation), so no dangling tool-call turn survives.
    pub fn truncate(&mut self, len: usize) {
        self.turns.truncate(len);
    }

    /// True when every tool-call turn has a later tool-result turn with the
    /// same call id
    pub fn all_calls_resolved(&self) -> bool {
        self.turns
            .iter()
            .enumerate()
            .filter(|(_, t)| t.role == Role::ToolCall)
            .all(|(i, t)| {
                let id = t.call_id();
                self.turns[i + 1..]
                    .iter()
                    .any(|u| u.role == Role::ToolResult && u.call_id() == id)
            })
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
