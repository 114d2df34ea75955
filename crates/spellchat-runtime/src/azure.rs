//! Azure OpenAI Chat Backend
//!
//! Implementation of `ChatBackend` against the Azure OpenAI chat-completions
//! REST API. Tool-call turns are folded back into assistant messages with
//! `tool_calls`, tool-result turns become `role: tool` messages carrying the
//! correlation id, so the wire history mirrors the conversation exactly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use spellchat_core::{
    AgentError, BackendReply, ChatBackend, ChatOptions, Result, Role, ToolCallRequest,
    ToolDescriptor, Turn,
};

const DEFAULT_API_VERSION: &str = "2024-06-01";

/// Azure OpenAI backend configuration
#[derive(Clone, Debug)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,

    /// Deployment (model) name
    pub deployment: String,

    /// API key sent in the `api-key` header
    pub api_key: String,

    /// API version query parameter
    pub api_version: String,
}

impl AzureOpenAiConfig {
    /// Build from an endpoint/deployment pair, reading the key (and an
    /// optional API version override) from the environment
    pub fn from_env(endpoint: impl Into<String>, deployment: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("AZURE_OPENAI_API_KEY").map_err(|_| {
            AgentError::Config(
                "Missing required configuration: AZURE_OPENAI_API_KEY. \
                 Provide it as an environment variable."
                    .into(),
            )
        })?;
        let api_version = std::env::var("AZURE_OPENAI_API_VERSION")
            .unwrap_or_else(|_| DEFAULT_API_VERSION.into());

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            deployment: deployment.into(),
            api_key,
            api_version,
        })
    }
}

/// Azure OpenAI chat backend
pub struct AzureOpenAiBackend {
    client: reqwest::Client,
    config: AzureOpenAiConfig,
}

impl AzureOpenAiBackend {
    pub fn new(config: AzureOpenAiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint, self.config.deployment, self.config.api_version
        )
    }

    /// Convert conversation turns to wire messages
    ///
    /// Consecutive tool-call turns (one batch from a single model reply)
    /// collapse into one assistant message with a `tool_calls` array.
    fn convert_turns(system_prompt: Option<&str>, turns: &[Turn]) -> Vec<WireMessage> {
        let mut messages = Vec::new();
        if let Some(prompt) = system_prompt {
            messages.push(WireMessage::text("system", prompt));
        }

        let mut i = 0;
        while i < turns.len() {
            let turn = &turns[i];
            match turn.role {
                Role::User => {
                    messages.push(WireMessage::text("user", &turn.content));
                    i += 1;
                }
                Role::Assistant => {
                    messages.push(WireMessage::text("assistant", &turn.content));
                    i += 1;
                }
                Role::ToolCall => {
                    let mut calls = Vec::new();
                    while i < turns.len() && turns[i].role == Role::ToolCall {
                        if let Some(call) = &turns[i].call {
                            calls.push(WireToolCall::from_request(call));
                        }
                        i += 1;
                    }
                    messages.push(WireMessage {
                        role: "assistant".into(),
                        content: None,
                        tool_calls: Some(calls),
                        tool_call_id: None,
                    });
                }
                Role::ToolResult => {
                    let id = turn.call_id().unwrap_or_default().to_string();
                    let content = turn
                        .result
                        .as_ref()
                        .map_or_else(|| turn.content.clone(), |r| r.payload.render());
                    messages.push(WireMessage {
                        role: "tool".into(),
                        content: Some(content),
                        tool_calls: None,
                        tool_call_id: Some(id),
                    });
                    i += 1;
                }
            }
        }

        messages
    }

    /// Convert a descriptor to the wire function declaration
    fn convert_descriptor(descriptor: &ToolDescriptor) -> WireTool {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in &descriptor.parameters {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.param_type,
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(param.name.clone());
            }
        }

        WireTool {
            tool_type: "function".into(),
            function: WireFunctionDef {
                name: descriptor.name.clone(),
                description: descriptor.description.clone(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }),
            },
        }
    }

    /// Parse the first choice into a backend reply
    fn parse_reply(response: ChatCompletionResponse) -> Result<BackendReply> {
        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| AgentError::Inference("response contained no choices".into()))?;

        if let Some(calls) = message.tool_calls.filter(|c| !c.is_empty()) {
            let requests = calls
                .into_iter()
                .map(|c| c.into_request())
                .collect::<Result<Vec<_>>>()?;
            return Ok(BackendReply::ToolCalls(requests));
        }

        match message.content {
            Some(content) if !content.trim().is_empty() => Ok(BackendReply::Text(content)),
            _ => Err(AgentError::Inference(
                "response contained neither content nor tool calls".into(),
            )),
        }
    }
}

#[async_trait]
impl ChatBackend for AzureOpenAiBackend {
    fn name(&self) -> &str {
        "azure-openai"
    }

    async fn complete(
        &self,
        turns: &[Turn],
        tools: &[ToolDescriptor],
        options: &ChatOptions,
    ) -> Result<BackendReply> {
        let messages = Self::convert_turns(options.system_prompt.as_deref(), turns);

        let advertise_tools = options.auto_invoke_tools && !tools.is_empty();
        let body = ChatCompletionRequest {
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            tools: advertise_tools.then(|| tools.iter().map(Self::convert_descriptor).collect()),
            tool_choice: advertise_tools.then(|| "auto".into()),
        };

        tracing::debug!(deployment = %self.config.deployment, "requesting completion");

        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Inference(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::Inference(format!("{status}: {detail}")));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Inference(e.to_string()))?;

        Self::parse_reply(completion)
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl WireMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: WireFunctionDef,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded argument object, as the API transmits it
    arguments: String,
}

impl WireToolCall {
    fn from_request(call: &ToolCallRequest) -> Self {
        Self {
            id: call.id.clone(),
            call_type: "function".into(),
            function: WireFunctionCall {
                name: call.name.clone(),
                arguments: serde_json::to_string(&call.arguments).unwrap_or_default(),
            },
        }
    }

    fn into_request(self) -> Result<ToolCallRequest> {
        let raw: HashMap<String, serde_json::Value> =
            serde_json::from_str(&self.function.arguments).map_err(|e| {
                AgentError::Inference(format!(
                    "tool call '{}' carried malformed arguments: {e}",
                    self.function.name
                ))
            })?;

        let arguments = raw
            .into_iter()
            .map(|(k, v)| {
                let value = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, value)
            })
            .collect();

        Ok(ToolCallRequest {
            id: self.id,
            name: self.function.name,
            arguments,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use spellchat_core::{ParameterSpec, ToolPayload, ToolResult};

    fn request(id: &str, name: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: id.into(),
            name: name.into(),
            arguments: HashMap::from([("name".to_string(), "lumos".to_string())]),
        }
    }

    #[test]
    fn test_completions_url() {
        let backend = AzureOpenAiBackend::new(AzureOpenAiConfig {
            endpoint: "https://res.openai.azure.com".into(),
            deployment: "gpt-4o".into(),
            api_key: "key".into(),
            api_version: "2024-06-01".into(),
        });

        assert_eq!(
            backend.completions_url(),
            "https://res.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-06-01"
        );
    }

    #[test]
    fn test_convert_turns_groups_tool_call_batch() {
        let turns = vec![
            Turn::user("look up two spells"),
            Turn::tool_call(request("c1", "get_spell")),
            Turn::tool_call(request("c2", "get_spell")),
            Turn::tool_result(ToolResult {
                id: "c1".into(),
                name: "get_spell".into(),
                payload: ToolPayload::message("found"),
            }),
            Turn::tool_result(ToolResult {
                id: "c2".into(),
                name: "get_spell".into(),
                payload: ToolPayload::message("found"),
            }),
        ];

        let messages = AzureOpenAiBackend::convert_turns(Some("You are SpellChat."), &turns);

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[2].tool_calls.as_ref().unwrap().len(), 2);
        assert_eq!(messages[3].role, "tool");
        assert_eq!(messages[3].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(messages[4].tool_call_id.as_deref(), Some("c2"));
    }

    #[test]
    fn test_convert_descriptor_schema_shape() {
        let descriptor = ToolDescriptor {
            name: "save_spell".into(),
            description: "Save a spell.".into(),
            parameters: vec![
                ParameterSpec::required_string("name", "Spell name"),
                ParameterSpec::required_string("incantation", "Spell incantation"),
            ],
        };

        let wire = AzureOpenAiBackend::convert_descriptor(&descriptor);
        assert_eq!(wire.function.name, "save_spell");
        assert_eq!(wire.function.parameters["type"], "object");
        assert_eq!(
            wire.function.parameters["required"],
            serde_json::json!(["name", "incantation"])
        );
        assert_eq!(
            wire.function.parameters["properties"]["name"]["type"],
            "string"
        );
    }

    #[test]
    fn test_parse_text_reply() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"Hello there."}}]}"#,
        )
        .unwrap();

        match AzureOpenAiBackend::parse_reply(response).unwrap() {
            BackendReply::Text(text) => assert_eq!(text, "Hello there."),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_tool_call_reply() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"tool_calls":[
                {"id":"c1","type":"function","function":{"name":"get_spell","arguments":"{\"name\":\"accio\"}"}}
            ]}}]}"#,
        )
        .unwrap();

        match AzureOpenAiBackend::parse_reply(response).unwrap() {
            BackendReply::ToolCalls(calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].id, "c1");
                assert_eq!(calls[0].name, "get_spell");
                assert_eq!(calls[0].arguments["name"], "accio");
            }
            other => panic!("expected tool calls, got {other:?}"),
        }
    }

    #[test]
    fn test_non_string_argument_values_stringified() {
        let call = WireToolCall {
            id: "c1".into(),
            call_type: "function".into(),
            function: WireFunctionCall {
                name: "save_spell".into(),
                arguments: r#"{"name":"hex","level":3}"#.into(),
            },
        };

        let request = call.into_request().unwrap();
        assert_eq!(request.arguments["name"], "hex");
        assert_eq!(request.arguments["level"], "3");
    }
}
