//! HTTP model gateway implementation
//!
//! Async client for an Ollama-compatible chat endpoint with tool calling and
//! NDJSON streaming support.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::core::config::GatewayConfig;
use crate::core::{InsulaError, Message, Result, ToolCallRequest, ToolDefinition};
use crate::llm::traits::{DeltaStream, GatewayResponse, ModelGateway};

/// HTTP gateway to the model backend
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    model: String,
}

/// Chat request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    stream: bool,
}

/// Wire message format
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

/// Wire tool call format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    function: WireFunction,
}

/// Function within a wire tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    arguments: serde_json::Value,
}

/// Chat response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: WireMessage,
}

/// Streaming chunk response
#[derive(Debug, Deserialize)]
struct StreamChunkResponse {
    #[serde(default)]
    message: Option<StreamMessage>,
    #[serde(default)]
    done: bool,
}

/// Message in a streaming chunk
#[derive(Debug, Deserialize)]
struct StreamMessage {
    #[serde(default)]
    content: String,
}

impl HttpGateway {
    /// Create a gateway from configuration
    pub fn from_config(config: &GatewayConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }
    }

    /// Create a gateway with a custom base URL and model
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Convert internal Message to wire format
    fn to_wire_message(msg: &Message) -> WireMessage {
        WireMessage {
            role: msg.role.clone(),
            content: msg.content.clone(),
            tool_calls: None,
        }
    }

    /// Extract tool call requests, assigning ids where the backend omitted
    /// them
    fn to_requests(calls: Vec<WireToolCall>) -> Vec<ToolCallRequest> {
        calls
            .into_iter()
            .enumerate()
            .map(|(i, tc)| {
                let id = tc.id.unwrap_or_else(|| format!("call_{}", i));
                ToolCallRequest::new(id, tc.function.name, tc.function.arguments)
            })
            .collect()
    }

    async fn post_chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        stream: bool,
    ) -> Result<reqwest::Response> {
        let request = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(Self::to_wire_message).collect(),
            tools,
            stream,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    InsulaError::gateway(format!(
                        "Cannot connect to model gateway at {}. Is it running?",
                        self.base_url
                    ))
                } else {
                    InsulaError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(InsulaError::gateway(format!(
                "Gateway API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ModelGateway for HttpGateway {
    async fn complete(&self, history: &[Message]) -> Result<String> {
        let response = self.post_chat(history, None, false).await?;
        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| InsulaError::gateway(format!("Failed to parse response: {}", e)))?;

        Ok(chat_response.message.content)
    }

    async fn stream_complete(&self, history: &[Message]) -> Result<DeltaStream> {
        let response = self.post_chat(history, None, true).await?;

        let (tx, rx) = mpsc::channel::<Result<String>>(64);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = stream.next().await {
                let chunk = match chunk_result {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx
                            .send(Err(InsulaError::gateway(format!("Stream error: {}", e))))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // Process complete JSON lines from the buffer
                while let Some(newline_pos) = buffer.find('\n') {
                    let line = buffer[..newline_pos].trim().to_string();
                    buffer = buffer[newline_pos + 1..].to_string();

                    if line.is_empty() {
                        continue;
                    }

                    match serde_json::from_str::<StreamChunkResponse>(&line) {
                        Ok(chunk_response) => {
                            if chunk_response.done {
                                return;
                            }
                            if let Some(msg) = chunk_response.message {
                                if !msg.content.is_empty()
                                    && tx.send(Ok(msg.content)).await.is_err()
                                {
                                    // Receiver dropped; stop reading.
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            debug!(error = %e, line = %line, "unparseable stream line");
                        }
                    }
                }
            }

            // Process any remaining buffer content
            let trailing = buffer.trim();
            if !trailing.is_empty() {
                if let Ok(chunk_response) = serde_json::from_str::<StreamChunkResponse>(trailing) {
                    if let Some(msg) = chunk_response.message {
                        if !msg.content.is_empty() {
                            let _ = tx.send(Ok(msg.content)).await;
                        }
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn chat_with_tools(
        &self,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<GatewayResponse> {
        let tools = (!tools.is_empty()).then_some(tools);
        let response = self.post_chat(history, tools, false).await?;

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| InsulaError::gateway(format!("Failed to parse response: {}", e)))?;

        Ok(GatewayResponse {
            content: chat_response.message.content,
            tool_calls: Self::to_requests(chat_response.message.tool_calls.unwrap_or_default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_call_ids_are_assigned() {
        let calls = vec![
            WireToolCall {
                id: None,
                function: WireFunction {
                    name: "run_python_code".to_string(),
                    arguments: serde_json::json!({"python_code": "print(1)"}),
                },
            },
            WireToolCall {
                id: Some("abc".to_string()),
                function: WireFunction {
                    name: "run_python_code".to_string(),
                    arguments: serde_json::json!({}),
                },
            },
        ];

        let requests = HttpGateway::to_requests(calls);
        assert_eq!(requests[0].id, "call_0");
        assert_eq!(requests[1].id, "abc");
    }

    #[test]
    fn test_stream_chunk_parsing() {
        let line = r#"{"message":{"content":"hello"},"done":false}"#;
        let chunk: StreamChunkResponse = serde_json::from_str(line).unwrap();
        assert_eq!(chunk.message.unwrap().content, "hello");
        assert!(!chunk.done);

        let line = r#"{"done":true}"#;
        let chunk: StreamChunkResponse = serde_json::from_str(line).unwrap();
        assert!(chunk.done);
    }
}
