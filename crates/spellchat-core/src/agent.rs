//! Agent Loop
//!
//! Per-session orchestration: submit history plus tool descriptors to the
//! backend, resolve every tool call the reply requests, resubmit, and stop
//! at the first text reply. One user turn runs to completion before the
//! next is accepted.
//!
//! Tool calls within one reply are dispatched sequentially in declaration
//! order, each as its own tool-call/tool-result pairing, and all of them are
//! resolved before the history goes back to the backend. Cancellation is
//! honored at the backend boundary and at every dispatch boundary; an
//! incomplete pairing is truncated away, never left dangling.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::backend::{BackendReply, ChatBackend, ChatOptions};
use crate::error::{AgentError, Result};
use crate::tool::{ToolPayload, ToolRegistry, ToolResult};
use crate::turn::{Conversation, Turn};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Completion options, including the system prompt
    pub options: ChatOptions,

    /// Maximum model round-trips per user turn before giving up
    pub max_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self {
            options: ChatOptions::default(),
            max_iterations: 10,
        }
    }
}

/// The agent: owns the backend handle, the tool registry, and the loop
pub struct Agent {
    backend: Arc<dyn ChatBackend>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            backend,
            tools,
            config,
        }
    }

    pub fn with_defaults(backend: Arc<dyn ChatBackend>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(backend, tools, AgentConfig::new())
    }

    /// Run one user turn to completion
    ///
    /// Appends the user turn, loops through backend replies resolving tool
    /// calls, and returns the final assistant text. On backend failure the
    /// error is returned and the session stays usable; on cancellation the
    /// history is left at the last complete turn.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        conversation.push(Turn::user(input));

        let descriptors = self.tools.descriptors();
        let mut iterations = 0;

        loop {
            iterations += 1;
            if iterations > self.config.max_iterations {
                return Err(AgentError::MaxIterations(self.config.max_iterations));
            }

            let reply = tokio::select! {
                () = cancel.cancelled() => return Err(AgentError::Cancelled),
                reply = self.backend.complete(
                    conversation.turns(),
                    &descriptors,
                    &self.config.options,
                ) => reply?,
            };

            match reply {
                BackendReply::Text(text) => {
                    conversation.push(Turn::assistant(&text));
                    return Ok(text);
                }
                BackendReply::ToolCalls(calls) if calls.is_empty() => {
                    return Err(AgentError::Inference(format!(
                        "backend '{}' returned neither text nor tool calls",
                        self.backend.name()
                    )));
                }
                BackendReply::ToolCalls(mut calls) => {
                    for call in &mut calls {
                        if call.id.trim().is_empty() {
                            call.id = uuid::Uuid::new_v4().to_string();
                        }
                    }

                    // Declaration order; every pairing commits before the
                    // next dispatch, and the whole batch resolves before
                    // resubmission.
                    for call in &calls {
                        let pair_start = conversation.len();
                        conversation.push(Turn::tool_call(call.clone()));

                        tracing::debug!(tool = %call.name, id = %call.id, "dispatching tool call");

                        let outcome = tokio::select! {
                            () = cancel.cancelled() => {
                                conversation.truncate(pair_start);
                                return Err(AgentError::Cancelled);
                            }
                            outcome = self.tools.dispatch(call) => outcome,
                        };

                        let result = match outcome {
                            Ok(result) => result,
                            Err(e) => {
                                // Registry mismatches and transport faults
                                // become error-carrying results so the model
                                // can react on its next turn.
                                tracing::warn!(tool = %call.name, error = %e, "tool dispatch failed");
                                ToolResult {
                                    id: call.id.clone(),
                                    name: call.name.clone(),
                                    payload: ToolPayload::message(format!(
                                        "Error: {}",
                                        e.user_message()
                                    )),
                                }
                            }
                        };

                        conversation.push(Turn::tool_result(result));
                    }

                    debug_assert!(conversation.all_calls_resolved());
                }
            }
        }
    }

    /// The tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Agent configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    backend: Option<Arc<dyn ChatBackend>>,
    tools: Option<Arc<ToolRegistry>>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            backend: None,
            tools: None,
            config: AgentConfig::new(),
        }
    }

    pub fn backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.options.system_prompt = Some(prompt.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.options.temperature = temperature;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let backend = self
            .backend
            .ok_or_else(|| AgentError::Config("chat backend is required".into()))?;
        let tools = self
            .tools
            .ok_or_else(|| AgentError::Config("tool registry is required".into()))?;

        Ok(Agent::new(backend, tools, self.config))
    }
}
