//! Run events
//!
//! The internal step-transition event type, the observer-facing progress
//! events, and the terminal run result.

use tokio::sync::mpsc;
use tracing::debug;

use crate::core::ToolCallRequest;

/// Step-transition event driving the scheduler
///
/// Created and consumed within a single run; never persisted. The scheduler
/// loop matches exhaustively, so every variant has exactly one accepting
/// step.
#[derive(Debug)]
pub(crate) enum Event {
    /// Entry event built from the caller's input
    Start { input: String },
    /// The model requested tool calls
    ToolDispatch {
        requests: Vec<ToolCallRequest>,
        round: usize,
    },
    /// Tool results are in memory; re-submit to the model for review
    Validate { round: usize },
    /// Terminal event carrying the final response text
    Stop { response: String },
}

/// A closed tagged section from the response stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Tag name from the configured registry
    pub tag: String,
    /// Trimmed content between the tags
    pub content: String,
}

/// Terminal result of one run
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Full response text of the final model turn
    pub response: String,
    /// Sections recognized across the run, in close order
    pub sections: Vec<Section>,
    /// Tool-dispatch rounds executed
    pub rounds: usize,
}

/// Progress notification streamed to an external observer
///
/// Fire-and-forget; delivery is best-effort and never alters control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// Coarse lifecycle notice ("Starting query processing...")
    Status(String),
    /// One raw text delta from the model
    Delta(String),
    /// A tagged section closed
    Section { tag: String, content: String },
    /// One tool call finished
    ToolResult { tool_name: String, success: bool },
}

/// Non-blocking sender for progress events
///
/// Wraps an optional bounded channel; a full or closed channel drops the
/// event so a slow or absent observer can never stall the run. Events from
/// one run are emitted sequentially, preserving their order.
pub(crate) struct ProgressSink {
    tx: Option<mpsc::Sender<RunEvent>>,
}

impl ProgressSink {
    /// Sink that forwards to the given channel
    pub fn new(tx: mpsc::Sender<RunEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Sink that discards everything (non-streaming callers)
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Emit an event, best-effort
    pub fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.tx {
            if let Err(e) = tx.try_send(event) {
                debug!(error = %e, "dropping progress event");
            }
        }
    }

    pub fn status(&self, msg: impl Into<String>) {
        self.emit(RunEvent::Status(msg.into()));
    }

    pub fn delta(&self, delta: impl Into<String>) {
        self.emit(RunEvent::Delta(delta.into()));
    }

    pub fn section(&self, tag: impl Into<String>, content: impl Into<String>) {
        self.emit(RunEvent::Section {
            tag: tag.into(),
            content: content.into(),
        });
    }

    pub fn tool_result(&self, tool_name: impl Into<String>, success: bool) {
        self.emit(RunEvent::ToolResult {
            tool_name: tool_name.into(),
            success,
        });
    }
}
