//! Tool Discovery Client
//!
//! One-time exchange at session start: connect to the server's SSE endpoint,
//! collect `tool` descriptor events until `ready`, and register a remote
//! stub per descriptor. Any failure here is fatal to session start; the
//! agent must never come up with a partial or empty tool set. The error
//! names the attempted endpoint plus the expected route shape so a
//! misconfigured provider is diagnosable.

use async_trait::async_trait;
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use spellchat_core::{
    AgentError, Result, Tool, ToolCallRequest, ToolDescriptor, ToolPayload, ToolRegistry,
};

const EXPECTED_ROUTE_HINT: &str = "Expected the SSE discovery route, e.g. \
http://localhost:7071/mcp/sse (GET streams `tool` descriptor events followed \
by `ready`; calls POST to the sibling /invoke route).";

fn discovery_error(endpoint: &str, detail: impl std::fmt::Display) -> AgentError {
    AgentError::Discovery {
        endpoint: endpoint.to_string(),
        hint: format!("{detail} {EXPECTED_ROUTE_HINT}"),
    }
}

/// Derive the invoke URL from the SSE URL
///
/// The invocation route is the sibling of the discovery route; any other
/// URL shape is a configuration problem, reported before connecting.
pub fn derive_invoke_url(sse_url: &str) -> Result<String> {
    sse_url
        .trim_end_matches('/')
        .strip_suffix("/sse")
        .map(|base| format!("{base}/invoke"))
        .ok_or_else(|| discovery_error(sse_url, "URL does not end in /sse."))
}

/// Discover the remote tool set and build a registry of remote stubs
///
/// Blocking boundary: honors cancellation while the connection and the
/// stream are open.
pub async fn discover_tools(sse_url: &str, cancel: &CancellationToken) -> Result<ToolRegistry> {
    let invoke_url = derive_invoke_url(sse_url)?;
    let client = reqwest::Client::new();

    tracing::info!(endpoint = %sse_url, "discovering tools");

    let response = tokio::select! {
        () = cancel.cancelled() => return Err(AgentError::Cancelled),
        response = client
            .get(sse_url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send() => response.map_err(|e| {
                discovery_error(sse_url, format!("Endpoint unreachable: {e}."))
            })?,
    };

    let status = response.status();
    if !status.is_success() {
        return Err(discovery_error(
            sse_url,
            format!("Endpoint answered {status}."),
        ));
    }

    let descriptors =
        collect_descriptors(response.bytes_stream().eventsource(), sse_url, cancel).await?;

    let mut registry = ToolRegistry::new();
    for descriptor in descriptors {
        tracing::info!(tool = %descriptor.name, "registering remote tool");
        registry.register(RemoteTool {
            descriptor,
            invoke_url: invoke_url.clone(),
            client: client.clone(),
        })?;
    }
    Ok(registry)
}

/// Collect descriptor events until `ready`
async fn collect_descriptors<S, E>(
    stream: S,
    endpoint: &str,
    cancel: &CancellationToken,
) -> Result<Vec<ToolDescriptor>>
where
    S: futures::Stream<Item = std::result::Result<Event, EventStreamError<E>>>,
    E: std::fmt::Display,
{
    futures::pin_mut!(stream);
    let mut descriptors = Vec::new();

    loop {
        let next = tokio::select! {
            () = cancel.cancelled() => return Err(AgentError::Cancelled),
            next = stream.next() => next,
        };

        match next {
            None => {
                return Err(discovery_error(
                    endpoint,
                    "Stream ended before the `ready` event.",
                ))
            }
            Some(Err(e)) => {
                return Err(discovery_error(
                    endpoint,
                    format!("Malformed descriptor stream: {e}."),
                ))
            }
            Some(Ok(event)) => match event.event.as_str() {
                "tool" => {
                    let descriptor = serde_json::from_str(&event.data).map_err(|e| {
                        discovery_error(endpoint, format!("Malformed tool descriptor: {e}."))
                    })?;
                    descriptors.push(descriptor);
                }
                "ready" => break,
                // Keep-alive and unknown events are ignored.
                _ => {}
            },
        }
    }

    if descriptors.is_empty() {
        return Err(discovery_error(
            endpoint,
            "Server reported ready with no usable descriptors.",
        ));
    }
    Ok(descriptors)
}

/// A discovered tool, invoked by POSTing to the server's invoke route
///
/// Argument binding happens by declared parameter name: the registry checks
/// the model's arguments against the descriptor before this stub ever runs.
pub struct RemoteTool {
    descriptor: ToolDescriptor,
    invoke_url: String,
    client: reqwest::Client,
}

#[async_trait]
impl Tool for RemoteTool {
    fn descriptor(&self) -> ToolDescriptor {
        self.descriptor.clone()
    }

    async fn invoke(&self, call: &ToolCallRequest) -> Result<ToolPayload> {
        let body = serde_json::json!({
            "tool": call.name,
            "arguments": call.arguments,
        });

        let response = self
            .client
            .post(&self.invoke_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::ToolTransport(format!("{}: {e}", self.invoke_url)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::ToolTransport(format!(
                "'{}' answered {status}: {detail}",
                call.name
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::ToolTransport(format!("unreadable payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sse_stream(
        text: &str,
    ) -> impl futures::Stream<Item = std::result::Result<Event, EventStreamError<std::io::Error>>>
    {
        futures::stream::iter(vec![Ok::<_, std::io::Error>(text.as_bytes().to_vec())])
            .eventsource()
    }

    #[test]
    fn test_derive_invoke_url() {
        assert_eq!(
            derive_invoke_url("http://localhost:7071/mcp/sse").unwrap(),
            "http://localhost:7071/mcp/invoke"
        );
        assert_eq!(
            derive_invoke_url("http://localhost:7071/mcp/sse/").unwrap(),
            "http://localhost:7071/mcp/invoke"
        );
    }

    #[test]
    fn test_bad_route_shape_names_endpoint_and_expectation() {
        let err = derive_invoke_url("http://localhost:7071/tools").unwrap_err();
        match err {
            AgentError::Discovery { endpoint, hint } => {
                assert_eq!(endpoint, "http://localhost:7071/tools");
                assert!(hint.contains("/mcp/sse"));
            }
            other => panic!("expected discovery error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_collect_descriptors_until_ready() {
        let text = concat!(
            "event: tool\n",
            "data: {\"name\":\"save_spell\",\"description\":\"Save a spell.\",\"parameters\":[]}\n\n",
            "event: tool\n",
            "data: {\"name\":\"list_spells\",\"description\":\"List spells.\",\"parameters\":[]}\n\n",
            "event: ready\n",
            "data: {\"count\":2}\n\n",
        );

        let descriptors =
            collect_descriptors(sse_stream(text), "http://x/mcp/sse", &CancellationToken::new())
                .await
                .unwrap();

        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].name, "save_spell");
        assert_eq!(descriptors[1].name, "list_spells");
    }

    #[tokio::test]
    async fn test_truncated_stream_is_fatal() {
        let text = concat!(
            "event: tool\n",
            "data: {\"name\":\"save_spell\",\"description\":\"Save a spell.\",\"parameters\":[]}\n\n",
        );

        let err =
            collect_descriptors(sse_stream(text), "http://x/mcp/sse", &CancellationToken::new())
                .await
                .unwrap_err();
        assert!(matches!(err, AgentError::Discovery { .. }));
    }

    #[tokio::test]
    async fn test_empty_descriptor_set_is_fatal() {
        let text = "event: ready\ndata: {\"count\":0}\n\n";

        let err =
            collect_descriptors(sse_stream(text), "http://x/mcp/sse", &CancellationToken::new())
                .await
                .unwrap_err();
        match err {
            AgentError::Discovery { hint, .. } => assert!(hint.contains("no usable descriptors")),
            other => panic!("expected discovery error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_descriptor_is_fatal() {
        let text = "event: tool\ndata: {not json}\n\n";

        let err =
            collect_descriptors(sse_stream(text), "http://x/mcp/sse", &CancellationToken::new())
                .await
                .unwrap_err();
        assert!(matches!(err, AgentError::Discovery { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_during_collection() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = collect_descriptors(
            futures::stream::pending::<std::result::Result<Event, EventStreamError<std::io::Error>>>(),
            "http://x/mcp/sse",
            &cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
    }
}
