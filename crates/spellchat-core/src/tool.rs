//! Tool System
//!
//! Descriptors, call/result correlation, and the registry the agent loop
//! dispatches through. Handlers are total functions: validation failures and
//! lookup misses come back as payloads, never as errors. The only `Err`
//! paths out of a dispatch are registry mismatches and transport faults,
//! which the agent loop converts into error-carrying tool-result turns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// One declared parameter of a tool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

impl ParameterSpec {
    /// A required string parameter (the common case for spell tools)
    pub fn required_string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: "string".into(),
            description: description.into(),
            required: true,
        }
    }
}

/// Declaration of an invocable tool, immutable after registration
///
/// Parameter order is declaration order and is preserved through discovery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// Ordered parameter declarations
    pub parameters: Vec<ParameterSpec>,
}

/// Tool invocation requested by the model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Correlation id linking this request to its result
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Arguments by declared parameter name
    pub arguments: HashMap<String, String>,
}

/// Structured outcome of a tool invocation
///
/// Matches the wire contract: informational/error message, field payload,
/// or a (possibly empty) list of items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolPayload {
    /// List results; zero items plus a message is still a success
    Items {
        items: Vec<serde_json::Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Informational, validation, or not-found outcome
    Message { message: String },

    /// Tool-specific success fields
    Fields(serde_json::Map<String, serde_json::Value>),
}

impl ToolPayload {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message {
            message: text.into(),
        }
    }

    pub fn items(items: Vec<serde_json::Value>) -> Self {
        Self::Items {
            items,
            message: None,
        }
    }

    pub fn items_with_message(items: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::Items {
            items,
            message: Some(message.into()),
        }
    }

    pub fn fields(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::Fields(fields)
    }

    /// Render the payload as text for the model's next turn
    pub fn render(&self) -> String {
        match self {
            Self::Message { message } => message.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

/// Result answering a tool-call request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Correlation id copied from the request
    pub id: String,

    /// Tool that was called
    pub name: String,

    /// Structured outcome
    pub payload: ToolPayload,
}

impl ToolResult {
    /// Render the result for the conversation history
    pub fn render(&self) -> String {
        format!("[tool '{}' returned] {}", self.name, self.payload.render())
    }
}

/// Tool trait - implement to expose a capability to the agent
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's declaration
    fn descriptor(&self) -> ToolDescriptor;

    /// Invoke the tool; total over malformed input, `Err` only for faults
    /// below the tool contract (transport, protocol)
    async fn invoke(&self, call: &ToolCallRequest) -> Result<ToolPayload>;
}

/// Registry mapping tool names to handlers plus their declared schemas
///
/// Bindings are validated twice: at registration (usable descriptor, no
/// duplicate) and at call time (arguments match the schema).
pub struct ToolRegistry {
    tools: Vec<(ToolDescriptor, Arc<dyn Tool>)>,
    index: HashMap<String, usize>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool, validating its descriptor
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool handle
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let descriptor = tool.descriptor();

        if descriptor.name.trim().is_empty() {
            return Err(AgentError::ToolValidation(
                "tool descriptor has an empty name".into(),
            ));
        }
        if self.index.contains_key(&descriptor.name) {
            return Err(AgentError::ToolValidation(format!(
                "tool '{}' is already registered",
                descriptor.name
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for param in &descriptor.parameters {
            if !seen.insert(param.name.as_str()) {
                return Err(AgentError::ToolValidation(format!(
                    "tool '{}' declares parameter '{}' twice",
                    descriptor.name, param.name
                )));
            }
        }

        self.index
            .insert(descriptor.name.clone(), self.tools.len());
        self.tools.push((descriptor, tool));
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].1.clone())
    }

    /// Validate a call against the declared schema
    fn validate(&self, descriptor: &ToolDescriptor, call: &ToolCallRequest) -> Result<()> {
        for param in &descriptor.parameters {
            if param.required && !call.arguments.contains_key(&param.name) {
                return Err(AgentError::ToolValidation(format!(
                    "tool '{}': missing required argument '{}'",
                    call.name, param.name
                )));
            }
        }
        for arg in call.arguments.keys() {
            if !descriptor.parameters.iter().any(|p| &p.name == arg) {
                return Err(AgentError::ToolValidation(format!(
                    "tool '{}': undeclared argument '{}'",
                    call.name, arg
                )));
            }
        }
        Ok(())
    }

    /// Dispatch a call: look up the binding, check the schema, invoke
    pub async fn dispatch(&self, call: &ToolCallRequest) -> Result<ToolResult> {
        let (descriptor, tool) = self
            .index
            .get(&call.name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        self.validate(descriptor, call)?;

        let payload = tool.invoke(call).await?;
        Ok(ToolResult {
            id: call.id.clone(),
            name: call.name.clone(),
            payload,
        })
    }

    /// All descriptors, in registration order
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|(d, _)| d.clone()).collect()
    }

    /// Registered tool names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|(d, _)| d.name.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
