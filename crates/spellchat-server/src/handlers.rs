//! HTTP Handlers
//!
//! The wire surface of the tool invocation server: discovery over a
//! long-lived SSE stream and invocation over plain JSON POST. Known tools
//! always answer 200 with a payload; only registry mismatches (unknown tool,
//! schema violation) surface as HTTP errors, which the client treats as
//! transport faults.

use std::collections::HashMap;
use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::{Deserialize, Serialize};

use spellchat_core::{AgentError, ToolCallRequest, ToolDescriptor, ToolPayload, ToolRegistry};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub tool_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    pub tool: String,
    #[serde(default)]
    pub arguments: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        tool_count: state.registry.len(),
    })
}

/// Discovery events for the current registry: one `tool` event per
/// descriptor in registration order, then a `ready` event with the count
pub fn discovery_events(descriptors: &[ToolDescriptor]) -> Vec<(&'static str, String)> {
    let mut events: Vec<_> = descriptors
        .iter()
        .map(|d| {
            (
                "tool",
                serde_json::to_string(d).expect("descriptor serializes"),
            )
        })
        .collect();
    events.push((
        "ready",
        serde_json::json!({ "count": descriptors.len() }).to_string(),
    ));
    events
}

/// Discovery endpoint: streams the tool descriptors over SSE
pub async fn discover_tools(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let descriptors = state.registry.descriptors();
    tracing::info!(count = descriptors.len(), "streaming tool descriptors");

    let events = discovery_events(&descriptors)
        .into_iter()
        .map(|(name, data)| Ok(Event::default().event(name).data(data)));

    Sse::new(futures::stream::iter(events)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Invocation endpoint: dispatches one tool call through the registry
pub async fn invoke_tool(
    State(state): State<AppState>,
    Json(payload): Json<InvokeRequest>,
) -> Result<Json<ToolPayload>, (StatusCode, Json<ErrorResponse>)> {
    let call = ToolCallRequest {
        id: uuid::Uuid::new_v4().to_string(),
        name: payload.tool,
        arguments: payload.arguments,
    };

    tracing::info!(tool = %call.name, "invoking tool");

    match state.registry.dispatch(&call).await {
        Ok(result) => Ok(Json(result.payload)),
        Err(e) => Err(error_response(&e)),
    }
}

fn error_response(error: &AgentError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match error {
        AgentError::ToolNotFound(_) => (StatusCode::NOT_FOUND, "TOOL_NOT_FOUND"),
        AgentError::ToolValidation(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENTS"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "TOOL_ERROR"),
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: code.into(),
        }),
    )
}

/// Build the registry of local spell tools over one store handle
pub fn build_registry(store: std::sync::Arc<spellbook::SpellStore>) -> anyhow::Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    spellbook::register_spell_tools(&mut registry, store)?;
    Ok(registry)
}
