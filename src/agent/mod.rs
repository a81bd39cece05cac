//! Agent module - orchestration logic
//!
//! Contains the step scheduler, conversation memory, run events, and session
//! management.

pub mod events;
pub mod memory;
pub mod runner;
pub mod session;

pub use events::{RunEvent, RunResult, Section};
pub use memory::ConversationMemory;
pub use runner::Agent;
pub use session::SessionManager;
