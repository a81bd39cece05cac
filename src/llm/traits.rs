//! Model gateway trait for abstracting the LLM backend
//!
//! The orchestration core only sees this boundary; prompt content, model
//! selection, and token limits are opaque configuration behind it.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::core::{Message, Result, ToolCallRequest, ToolDefinition};

/// A lazy, finite, non-restartable sequence of text deltas
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Response from a tool-capable chat turn
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    /// Text content of the response
    pub content: String,
    /// Tool calls the model wants to make, in request order
    pub tool_calls: Vec<ToolCallRequest>,
}

impl GatewayResponse {
    /// Whether the model requested any tool calls
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Boundary to the LLM backend
///
/// The chat history carries the prompt; callers append their user message to
/// memory before calling, then pass the full snapshot. Errors from this
/// boundary are fatal to the calling step unless that step explicitly
/// recovers.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Generate the full response text over the chat history
    async fn complete(&self, history: &[Message]) -> Result<String>;

    /// Generate a streaming response as a sequence of deltas
    async fn stream_complete(&self, history: &[Message]) -> Result<DeltaStream>;

    /// Chat turn with tool definitions; the response may request tool calls
    async fn chat_with_tools(
        &self,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<GatewayResponse>;
}
