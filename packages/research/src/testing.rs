//! Testing utilities including mock capability implementations.
//!
//! These are useful for testing applications that drive the research loop
//! without making real model or index calls. Responses are scripted with
//! builder methods; every call is recorded for assertions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ResearchError, Result};
use crate::traits::ai::{ReportStream, ResearchAI};
use crate::traits::progress::ProgressSink;
use crate::traits::retriever::Retriever;
use crate::types::events::ProgressEvent;
use crate::types::research::{CandidateQuery, Document, ExtractedInsights};

/// Record of a call made to [`MockResearchAI`].
#[derive(Debug, Clone)]
pub enum MockAICall {
    GenerateQueries {
        question: String,
        prior_learnings: Option<Vec<String>>,
        max_queries: usize,
    },
    ExtractLearnings {
        query: String,
        document_count: usize,
        max_learnings: usize,
        max_follow_ups: usize,
    },
    StreamReport {
        question: String,
        learning_count: usize,
    },
}

/// A mock model capability with scripted, deterministic responses.
///
/// Query generation is scripted per call: the first `generate_queries`
/// call returns the first scripted round, the second call the second, and
/// so on. Once the script runs out an empty list is returned, which ends
/// the research loop naturally.
///
/// The mock is cheaply cloneable; clones share scripts and call records,
/// so a test can keep a handle for assertions after handing the mock to a
/// [`Researcher`](crate::Researcher).
#[derive(Default, Clone)]
pub struct MockResearchAI {
    /// Scripted candidate queries, one entry per generation call
    rounds: Arc<RwLock<Vec<Vec<CandidateQuery>>>>,

    /// Scripted insights by search query
    insights: Arc<RwLock<HashMap<String, ExtractedInsights>>>,

    /// Scripted report fragments
    fragments: Arc<RwLock<Option<Vec<String>>>>,

    /// Queries whose extraction should fail
    failing_extractions: Arc<RwLock<Vec<String>>>,

    /// Whether query generation fails
    fail_generation: bool,

    /// Whether report synthesis fails at the initial call
    fail_report: bool,

    /// Fail the report stream after yielding this many fragments
    fail_report_after: Option<usize>,

    /// Simulated latency for query generation
    generation_delay: Option<Duration>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockAICall>>>,
}

impl MockResearchAI {
    /// Create a new mock with default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the candidate queries for the next generation call.
    pub fn with_round_queries(self, queries: Vec<CandidateQuery>) -> Self {
        self.rounds.write().unwrap().push(queries);
        self
    }

    /// Script the insights returned for a search query.
    pub fn with_insights(self, query: impl Into<String>, insights: ExtractedInsights) -> Self {
        self.insights.write().unwrap().insert(query.into(), insights);
        self
    }

    /// Script learnings (no follow-ups) for a search query.
    pub fn with_learnings(self, query: impl Into<String>, learnings: &[&str]) -> Self {
        self.with_insights(
            query,
            ExtractedInsights {
                learnings: learnings.iter().map(|l| l.to_string()).collect(),
                follow_ups: vec![],
            },
        )
    }

    /// Script the report fragment sequence.
    pub fn with_report_fragments(self, fragments: &[&str]) -> Self {
        *self.fragments.write().unwrap() =
            Some(fragments.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Make every generation call fail.
    pub fn failing_generation(mut self) -> Self {
        self.fail_generation = true;
        self
    }

    /// Make extraction fail for a specific query.
    pub fn failing_extraction(self, query: impl Into<String>) -> Self {
        self.failing_extractions.write().unwrap().push(query.into());
        self
    }

    /// Make report synthesis fail at the initial call.
    pub fn failing_report(mut self) -> Self {
        self.fail_report = true;
        self
    }

    /// Make the report stream error out after `count` fragments.
    pub fn failing_report_after(mut self, count: usize) -> Self {
        self.fail_report_after = Some(count);
        self
    }

    /// Add simulated latency to generation calls.
    pub fn with_generation_delay(mut self, delay: Duration) -> Self {
        self.generation_delay = Some(delay);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockAICall> {
        self.calls.read().unwrap().clone()
    }

    fn generation_call_count(&self) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, MockAICall::GenerateQueries { .. }))
            .count()
    }
}

#[async_trait]
impl ResearchAI for MockResearchAI {
    async fn generate_queries(
        &self,
        question: &str,
        prior_learnings: Option<&[String]>,
        max_queries: usize,
    ) -> Result<Vec<CandidateQuery>> {
        // Call index before recording this call
        let index = self.generation_call_count();

        self.calls.write().unwrap().push(MockAICall::GenerateQueries {
            question: question.to_string(),
            prior_learnings: prior_learnings.map(|l| l.to_vec()),
            max_queries,
        });

        if let Some(delay) = self.generation_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_generation {
            return Err(ResearchError::AI("mock generation failure".into()));
        }

        Ok(self
            .rounds
            .read()
            .unwrap()
            .get(index)
            .cloned()
            .unwrap_or_default())
    }

    async fn extract_learnings(
        &self,
        query: &str,
        documents: &[Document],
        max_learnings: usize,
        max_follow_ups: usize,
    ) -> Result<ExtractedInsights> {
        self.calls.write().unwrap().push(MockAICall::ExtractLearnings {
            query: query.to_string(),
            document_count: documents.len(),
            max_learnings,
            max_follow_ups,
        });

        if self.failing_extractions.read().unwrap().iter().any(|q| q == query) {
            return Err(ResearchError::AI("mock extraction failure".into()));
        }

        Ok(self
            .insights
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn stream_report(&self, question: &str, learnings: &[String]) -> Result<ReportStream> {
        self.calls.write().unwrap().push(MockAICall::StreamReport {
            question: question.to_string(),
            learning_count: learnings.len(),
        });

        if self.fail_report {
            return Err(ResearchError::AI("mock report failure".into()));
        }

        let fragments = self
            .fragments
            .read()
            .unwrap()
            .clone()
            .unwrap_or_else(|| vec![format!("Report for: {question}")]);

        let mut items: Vec<Result<String>> = fragments.into_iter().map(Ok).collect();
        if let Some(count) = self.fail_report_after {
            items.truncate(count);
            items.push(Err(ResearchError::AI("mock stream failure".into())));
        }

        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// Record of a call made to [`MockRetriever`].
#[derive(Debug, Clone)]
pub struct MockRetrieverCall {
    pub query: String,
    pub language: String,
}

/// A mock retriever with scripted documents per query.
///
/// Queries without scripted documents return no results, which the
/// orchestrator treats as a narrated non-event.
#[derive(Default, Clone)]
pub struct MockRetriever {
    /// Scripted documents by query
    documents: Arc<RwLock<HashMap<String, Vec<Document>>>>,

    /// Queries that should fail
    fail_queries: Arc<RwLock<Vec<String>>>,

    /// Call tracking
    calls: Arc<RwLock<Vec<MockRetrieverCall>>>,
}

impl MockRetriever {
    /// Create a new mock retriever.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script documents for a query.
    pub fn with_documents(self, query: impl Into<String>, documents: Vec<Document>) -> Self {
        self.documents.write().unwrap().insert(query.into(), documents);
        self
    }

    /// Mark a query as failing.
    pub fn failing_query(self, query: impl Into<String>) -> Self {
        self.fail_queries.write().unwrap().push(query.into());
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockRetrieverCall> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(&self, query: &str, language: &str) -> Result<Vec<Document>> {
        self.calls.write().unwrap().push(MockRetrieverCall {
            query: query.to_string(),
            language: language.to_string(),
        });

        if self.fail_queries.read().unwrap().iter().any(|q| q == query) {
            return Err(ResearchError::Retrieval(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "mock retrieval refused",
            ))));
        }

        Ok(self
            .documents
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}

/// A sink that collects every event for assertions.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for CollectingSink {
    fn notify(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_mock_ai_scripted_rounds() {
        let ai = MockResearchAI::new()
            .with_round_queries(vec![CandidateQuery::new("first", "goal")])
            .with_round_queries(vec![CandidateQuery::new("second", "goal")]);

        let round1 = ai.generate_queries("q", None, 3).await.unwrap();
        assert_eq!(round1[0].query, "first");

        let round2 = ai.generate_queries("q", None, 3).await.unwrap();
        assert_eq!(round2[0].query, "second");

        // Script exhausted: empty list ends research
        let round3 = ai.generate_queries("q", None, 3).await.unwrap();
        assert!(round3.is_empty());
    }

    #[tokio::test]
    async fn test_mock_ai_records_prior_learnings() {
        let ai = MockResearchAI::new();
        let learnings = vec!["fact".to_string()];
        ai.generate_queries("q", Some(&learnings), 3).await.unwrap();

        let calls = ai.calls();
        match &calls[0] {
            MockAICall::GenerateQueries { prior_learnings, .. } => {
                assert_eq!(prior_learnings.as_deref(), Some(["fact".to_string()].as_slice()));
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mock_ai_report_stream() {
        let ai = MockResearchAI::new().with_report_fragments(&["a", "b"]);
        let stream = ai.stream_report("q", &["l".to_string()]).await.unwrap();
        let fragments: Vec<_> = stream.map(|f| f.unwrap()).collect().await;
        assert_eq!(fragments, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_mock_ai_report_stream_failure() {
        let ai = MockResearchAI::new()
            .with_report_fragments(&["a", "b", "c"])
            .failing_report_after(1);

        let mut stream = ai.stream_report("q", &[]).await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "a");
        assert!(stream.next().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_write_report_drains_stream() {
        let ai = MockResearchAI::new().with_report_fragments(&["# T", "itle"]);
        let report = ai.write_report("q", &[]).await.unwrap();
        assert_eq!(report, "# Title");
    }

    #[tokio::test]
    async fn test_mock_retriever() {
        let retriever = MockRetriever::new()
            .with_documents("hit", vec![Document::new("src/lib.rs", "code")])
            .failing_query("broken");

        let docs = retriever.retrieve("hit", "en").await.unwrap();
        assert_eq!(docs.len(), 1);

        let empty = retriever.retrieve("miss", "en").await.unwrap();
        assert!(empty.is_empty());

        assert!(retriever.retrieve("broken", "en").await.is_err());
        assert_eq!(retriever.calls().len(), 3);
    }
}
