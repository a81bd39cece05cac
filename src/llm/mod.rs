//! LLM module - model gateway abstraction
//!
//! Contains the gateway trait, the HTTP implementation, and the retrieval
//! boundary.

pub mod http;
pub mod retrieval;
pub mod traits;

pub use http::HttpGateway;
pub use retrieval::{format_context, RetrievedChunk, Retriever};
pub use traits::{DeltaStream, GatewayResponse, ModelGateway};
