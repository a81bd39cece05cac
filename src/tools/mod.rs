//! Tools module - tool implementations for the agent
//!
//! Contains the code runner tool and the tool registry/dispatcher.

pub mod code_runner;
pub mod registry;

pub use code_runner::CodeRunnerTool;
pub use registry::{Tool, ToolRegistry};
