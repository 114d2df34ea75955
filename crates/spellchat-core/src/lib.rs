//! # spellchat-core
//!
//! Core agent logic for SpellChat: conversation model, tool registry, and
//! the multi-turn tool-calling loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Agent                                │
//! │  ┌─────────────┐  ┌──────────────┐  ┌─────────────────────┐  │
//! │  │  Turn Loop  │──│ ToolRegistry │  │   ChatBackend       │  │
//! │  │ (per turn)  │  │ (name→tool)  │──│   (Strategy)        │  │
//! │  └─────────────┘  └──────────────┘  └─────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ChatBackend` trait abstracts the model backend; the `Tool` trait is
//! implemented both by local handlers (the spell tools in `spellbook`) and
//! by remote stubs discovered over the MCP SSE endpoint (`spellchat-runtime`).

pub mod agent;
pub mod backend;
pub mod error;
pub mod tool;
pub mod turn;

pub use agent::{Agent, AgentBuilder, AgentConfig};
pub use backend::{BackendReply, ChatBackend, ChatOptions};
pub use error::{AgentError, Result};
pub use tool::{
    ParameterSpec, Tool, ToolCallRequest, ToolDescriptor, ToolPayload, ToolRegistry, ToolResult,
};
pub use turn::{Conversation, Role, Turn};
