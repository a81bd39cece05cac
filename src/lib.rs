//! insula - streaming multi-step agent runtime
//!
//! Coordinates conversational agents that call an LLM backend, optionally
//! invoke external tools, and stream partial output while incrementally
//! recognizing tagged sections inside that stream.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Model gateway abstraction with an HTTP implementation, plus
//!   the retrieval boundary
//! - **Extract**: Incremental tagged-section extractor over delta streams
//! - **Tools**: Tool registry/dispatcher and the sandbox code runner
//! - **Agent**: Step scheduler, conversation memory, and sessions
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use insula::agent::Agent;
//! use insula::core::Config;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut agent = Agent::from_config(Config::load());
//!
//!     let result = agent.run("Calculate heat loss for a 16 mm PB pipe").await.unwrap();
//!     println!("{}", result.response);
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod extract;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::{Agent, RunEvent, RunResult, SessionManager};
pub use cli::Repl;
pub use core::{Config, InsulaError, Result};
pub use extract::SectionExtractor;
