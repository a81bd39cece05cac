//! Extract module - incremental tagged-section recognition
//!
//! Turns a stream of text deltas into discrete section events.

pub mod extractor;

pub use extractor::{ExtractorEvent, SectionExtractor};
