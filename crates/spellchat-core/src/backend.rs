//! Chat Backend Boundary
//!
//! The agent loop consumes any model backend through this trait: it submits
//! the full history plus the registered tool descriptors and receives either
//! a final text turn or a batch of tool-call requests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tool::{ToolCallRequest, ToolDescriptor};
use crate::turn::Turn;

/// Options for one completion request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatOptions {
    /// System prompt, injected by the backend adapter (history carries only
    /// user/assistant/tool turns)
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Whether to advertise the tool list and accept tool-call replies
    #[serde(default = "default_true")]
    pub auto_invoke_tools: bool,
}

fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_true() -> bool {
    true
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            system_prompt: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            auto_invoke_tools: true,
        }
    }
}

/// One model response: final text, or tool calls to resolve first
///
/// Tool calls are kept in the order the model declared them; the loop
/// dispatches in that order.
#[derive(Clone, Debug)]
pub enum BackendReply {
    /// Final answer for the current user input
    Text(String),

    /// One or more tool invocations to resolve before resubmitting
    ToolCalls(Vec<ToolCallRequest>),
}

/// Strategy trait for chat-completion backends
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name, for logs and error messages
    fn name(&self) -> &str;

    /// Submit history plus tool descriptors, get one reply
    async fn complete(
        &self,
        turns: &[Turn],
        tools: &[ToolDescriptor],
        options: &ChatOptions,
    ) -> Result<BackendReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_options_defaults() {
        let opts = ChatOptions::default();
        assert!(opts.auto_invoke_tools);
        assert_eq!(opts.max_tokens, 1024);
        assert!(opts.system_prompt.is_none());
    }
}
