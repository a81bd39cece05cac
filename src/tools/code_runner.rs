//! Code runner tool
//!
//! Submits Python code to an external sandbox service and returns the
//! captured output. The sandbox is an opaque "run this code, return
//! stdout/stderr" HTTP service; isolation and resource limits live there,
//! not here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::config::SandboxConfig;
use crate::core::{InsulaError, Result, ToolDefinition};
use crate::tools::Tool;

/// Tool that runs Python code in an external sandbox
pub struct CodeRunnerTool {
    client: Client,
    base_url: String,
}

/// Sandbox execution request
#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    code: &'a str,
}

/// Sandbox execution response
#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    #[serde(default)]
    output: String,
}

impl CodeRunnerTool {
    /// Create a code runner from sandbox configuration
    pub fn from_config(config: &SandboxConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }

    /// Create a code runner with a custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn run_code(&self, code: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/execute", self.base_url))
            .json(&ExecuteRequest { code })
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    InsulaError::tool(format!(
                        "Cannot connect to sandbox at {}. Is it running?",
                        self.base_url
                    ))
                } else {
                    InsulaError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(InsulaError::tool(format!(
                "Sandbox error ({}): {}",
                status, error_text
            )));
        }

        let result: ExecuteResponse = response.json().await?;
        Ok(result.output)
    }
}

#[async_trait]
impl Tool for CodeRunnerTool {
    fn name(&self) -> &str {
        "run_python_code"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "run_python_code",
            "Run python code in the analysis sandbox and return its output",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "python_code": {
                        "type": "string",
                        "description": "The generated python code only, without any preamble or postamble"
                    }
                },
                "required": ["python_code"]
            }),
        )
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<String> {
        let code = arguments
            .get("python_code")
            .and_then(|v| v.as_str())
            .ok_or_else(|| InsulaError::tool("Missing 'python_code' argument"))?;

        let result = self.run_code(code).await?;

        // Echo the code alongside its output so the reviewing model sees both.
        let payload = serde_json::json!({
            "python_code": code,
            "result": result,
        });

        Ok(payload.to_string())
    }
}
