//! Retrieval trait over the indexed repository.
//!
//! Abstracts the RAG index that turns a search string into ranked
//! documents. The orchestrator treats absence of results as a normal,
//! narrated outcome, never an error.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::research::Document;

/// Retrieval over an indexed repository.
///
/// # Implementations
///
/// Implementations typically wrap a vector index or hybrid search service.
/// `MockRetriever` in [`crate::testing`] scripts responses for tests.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve ranked documents for a search string.
    ///
    /// An empty vector means the index has nothing relevant; this is not
    /// an error. `language` selects the retrieval language where the
    /// backing index supports it.
    async fn retrieve(&self, query: &str, language: &str) -> Result<Vec<Document>>;
}
