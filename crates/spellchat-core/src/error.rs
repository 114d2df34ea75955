//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Missing or invalid startup configuration; fatal before session start
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tool discovery failed; fatal to session start
    #[error("Discovery failed for {endpoint}: {hint}")]
    Discovery { endpoint: String, hint: String },

    /// Chat backend call failed; surfaced to the user, session continues
    #[error("Inference error: {0}")]
    Inference(String),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool call did not match the declared parameter schema
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Remote tool call failed at the transport level
    #[error("Tool transport error: {0}")]
    ToolTransport(String),

    /// Maximum iterations reached in the tool-calling loop
    #[error("Maximum iterations ({0}) reached")]
    MaxIterations(usize),

    /// Caller-initiated stop; history is left at the last complete turn
    #[error("Cancelled")]
    Cancelled,

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// True for failures that abort startup rather than a single turn
    pub fn is_fatal(&self) -> bool {
        matches!(self, AgentError::Config(_) | AgentError::Discovery { .. })
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Config(msg) => format!("Configuration problem: {}", msg),
            AgentError::Discovery { endpoint, hint } => {
                format!("Could not discover tools at {}. {}", endpoint, hint)
            }
            AgentError::Inference(msg) => {
                format!("The model backend encountered an error: {}", msg)
            }
            AgentError::ToolNotFound(name) => format!("The tool '{}' is not available.", name),
            AgentError::ToolValidation(msg) => format!("Invalid tool input: {}", msg),
            AgentError::ToolTransport(msg) => format!("Tool call failed: {}", msg),
            AgentError::MaxIterations(_) => {
                "The request took too many tool-calling rounds. Please try a simpler query.".into()
            }
            AgentError::Cancelled => "Cancelled.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}
