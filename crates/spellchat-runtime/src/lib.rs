//! # spellchat-runtime
//!
//! Runtime integrations for SpellChat:
//!
//! - **Azure OpenAI** chat backend (`azure`)
//! - **MCP discovery client** consuming the server's SSE endpoint and
//!   producing remote tool stubs (`discovery`)

pub mod azure;
pub mod discovery;

pub use azure::{AzureOpenAiBackend, AzureOpenAiConfig};
pub use discovery::{discover_tools, RemoteTool};

// Re-export core types for convenience
pub use spellchat_core::{
    Agent, AgentError, ChatBackend, Conversation, Result, Role, Tool, ToolRegistry, Turn,
};
