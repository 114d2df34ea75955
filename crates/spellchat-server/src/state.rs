//! Application State

use std::sync::Arc;

use spellchat_core::ToolRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Registry of the local spell tools, built once at startup
    pub registry: Arc<ToolRegistry>,
}
