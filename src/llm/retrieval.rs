//! Retrieval boundary
//!
//! The orchestration core only consumes ranked text and metadata to build a
//! prompt; embedding, ranking, and storage are someone else's problem.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::core::Result;

/// One ranked chunk of retrieved context
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    /// Text content of the chunk
    pub text: String,
    /// Source metadata (page number, file, etc.)
    pub metadata: HashMap<String, String>,
}

/// Document retrieval boundary
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve ranked context chunks for a query
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>>;
}

/// Wrap retrieved chunks in the documentation-extract block the prompts
/// expect
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    let mut block = String::from("<technical_documentation_extract>\n\n");

    for chunk in chunks {
        if let Some(page) = chunk.metadata.get("page_number") {
            block.push_str(&format!("Page_{}:\n{}\n\n", page, chunk.text));
        } else {
            block.push_str(&format!("{}\n\n", chunk.text));
        }
    }

    block.push_str("</technical_documentation_extract>");
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_context() {
        let chunks = vec![
            RetrievedChunk {
                text: "Compressor specs".to_string(),
                metadata: HashMap::from([("page_number".to_string(), "12".to_string())]),
            },
            RetrievedChunk {
                text: "No page".to_string(),
                metadata: HashMap::new(),
            },
        ];

        let block = format_context(&chunks);
        assert!(block.starts_with("<technical_documentation_extract>"));
        assert!(block.contains("Page_12:\nCompressor specs"));
        assert!(block.contains("No page"));
        assert!(block.ends_with("</technical_documentation_extract>"));
    }
}
