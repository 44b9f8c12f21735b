//! Core data types for research runs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::traits::progress::ProgressSink;

/// A research request against an indexed repository.
///
/// `breadth` and `depth` are requests, not guarantees: the orchestrator
/// clamps both to its configured ceilings.
#[derive(Clone)]
pub struct ResearchRequest {
    /// The original research question.
    pub question: String,

    /// Queries to generate per round.
    pub breadth: usize,

    /// Research rounds to perform.
    pub depth: usize,

    /// Language tag passed through to retrieval.
    pub language: String,

    /// Optional sink for progress narration and report fragments.
    pub progress: Option<Arc<dyn ProgressSink>>,

    /// Optional cooperative cancellation probe. Checked before each round
    /// and before each query; an in-flight capability call is never
    /// interrupted.
    pub cancel: Option<CancellationToken>,
}

impl ResearchRequest {
    /// Create a request with the default breadth (3), depth (2) and
    /// language ("en").
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            breadth: 3,
            depth: 2,
            language: "en".to_string(),
            progress: None,
            cancel: None,
        }
    }

    /// Set queries per round.
    pub fn with_breadth(mut self, breadth: usize) -> Self {
        self.breadth = breadth;
        self
    }

    /// Set the number of rounds.
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Set the retrieval language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Attach a progress sink.
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl std::fmt::Debug for ResearchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchRequest")
            .field("question", &self.question)
            .field("breadth", &self.breadth)
            .field("depth", &self.depth)
            .field("language", &self.language)
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

/// A generated search query with its research goal.
///
/// Produced fresh each round and discarded after the round completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateQuery {
    /// Search string to run against the retrieval index.
    pub query: String,

    /// What this query is trying to learn and how it advances the
    /// investigation.
    pub goal: String,
}

impl CandidateQuery {
    /// Create a candidate query.
    pub fn new(query: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            goal: goal.into(),
        }
    }
}

/// A retrieved unit of repository content.
///
/// Owned by the retrieval side; the orchestrator only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document body (code or text).
    pub text: String,

    /// Source file the content came from.
    pub file_path: String,

    /// Relevance score, if the retriever provides one.
    pub score: Option<f32>,
}

impl Document {
    /// Create a document.
    pub fn new(file_path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            file_path: file_path.into(),
            score: None,
        }
    }

    /// Attach a relevance score.
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Learnings and follow-up questions distilled from one query's documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedInsights {
    /// Distilled facts, each specific to the code that was read.
    pub learnings: Vec<String>,

    /// Follow-up questions for further investigation. Collected but not
    /// consumed by the current loop.
    pub follow_ups: Vec<String>,
}

/// Result of a deep research operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResult {
    /// Every learning gathered, in discovery order. Duplicates are kept.
    pub learnings: Vec<String>,

    /// The synthesized report (or the fallback message when research
    /// produced nothing usable).
    pub final_report: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = ResearchRequest::new("How does auth work?")
            .with_breadth(4)
            .with_depth(3)
            .with_language("de");

        assert_eq!(request.question, "How does auth work?");
        assert_eq!(request.breadth, 4);
        assert_eq!(request.depth, 3);
        assert_eq!(request.language, "de");
        assert!(request.progress.is_none());
        assert!(request.cancel.is_none());
    }

    #[test]
    fn test_document_builder() {
        let doc = Document::new("src/auth.rs", "fn login() {}").with_score(0.91);
        assert_eq!(doc.file_path, "src/auth.rs");
        assert_eq!(doc.score, Some(0.91));
    }
}
