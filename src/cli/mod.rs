//! CLI module - command-line interface
//!
//! Contains the REPL.

pub mod repl;

pub use repl::Repl;
