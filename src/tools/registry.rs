//! Tool registry - manages and dispatches tool calls
//!
//! Central hub for registering tools and routing a batch of model-requested
//! calls to their handlers, each isolated from the others' failures.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::core::{Result, ToolCallRequest, ToolCallResult, ToolDefinition};

/// A capability the model can invoke by name
///
/// Parameter validation is the tool's own responsibility; the dispatcher only
/// routes calls and isolates failures.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to address this tool
    fn name(&self) -> &str;

    /// Definition (name, description, parameter schema) sent to the gateway
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given keyword arguments
    async fn invoke(&self, arguments: serde_json::Value) -> Result<String>;
}

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    /// Tools indexed by name
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool under its declared name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Get all tool definitions for the gateway
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a batch of tool call requests from one model turn
    ///
    /// Requests run in order; every request yields exactly one result. An
    /// unknown tool or a failing invocation becomes a failure result rather
    /// than an error, so the model can self-correct on the next turn.
    pub async fn dispatch(&self, requests: &[ToolCallRequest]) -> Vec<ToolCallResult> {
        let mut results = Vec::with_capacity(requests.len());

        for request in requests {
            results.push(self.execute(request).await);
        }

        results
    }

    /// Execute a single tool call request
    async fn execute(&self, request: &ToolCallRequest) -> ToolCallResult {
        let Some(tool) = self.tools.get(&request.name) else {
            return ToolCallResult::failure(
                &request.id,
                &request.name,
                format!("Tool '{}' does not exist", request.name),
            );
        };

        match tool.invoke(request.arguments.clone()).await {
            Ok(output) => ToolCallResult::success(&request.id, &request.name, output),
            Err(e) => {
                warn!(tool = %request.name, error = %e, "tool invocation failed");
                ToolCallResult::failure(
                    &request.id,
                    &request.name,
                    format!("Tool '{}' failed to execute: {}", request.name, e),
                )
            }
        }
    }
}
