//! Startup Configuration
//!
//! The three settings the session cannot start without. Each is read from
//! the environment (after `.env` loading) and the process fails fast with
//! the missing key named.

use spellchat_core::{AgentError, Result};

/// Required SpellChat settings
#[derive(Clone, Debug)]
pub struct SpellChatConfig {
    /// Azure OpenAI resource endpoint
    pub azure_openai_endpoint: String,

    /// Azure OpenAI deployment (model) name
    pub azure_openai_deployment: String,

    /// Discovery endpoint of the tool invocation server
    pub mcp_sse_url: String,
}

impl SpellChatConfig {
    pub const KEY_ENDPOINT: &'static str = "AZURE_OPENAI_ENDPOINT";
    pub const KEY_DEPLOYMENT: &'static str = "AZURE_OPENAI_DEPLOYMENT";
    pub const KEY_MCP_SSE_URL: &'static str = "MCP_SSE_URL";

    /// Load from the environment, failing fast on any missing value
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            azure_openai_endpoint: required(Self::KEY_ENDPOINT)?
                .trim_end_matches('/')
                .to_string(),
            azure_openai_deployment: required(Self::KEY_DEPLOYMENT)?,
            mcp_sse_url: required(Self::KEY_MCP_SSE_URL)?,
        })
    }
}

fn required(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(AgentError::Config(format!(
            "Missing required configuration: {key}. Provide it in .env or as an environment variable."
        ))),
    }
}
