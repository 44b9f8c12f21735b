//! Model capability trait for research operations.
//!
//! The trait abstracts the three model-backed operations the orchestrator
//! needs:
//! - Generating targeted search queries from a question (and prior learnings)
//! - Distilling learnings out of retrieved documents
//! - Synthesizing the final report as a fragment stream

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::error::Result;
use crate::types::research::{CandidateQuery, Document, ExtractedInsights};

/// Incremental report output: a stream of text fragments in arrival order.
pub type ReportStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Model capability set for research.
///
/// Implementations wrap specific providers (OpenAI, Gemini, etc.) and own
/// the prompting and response parsing. The orchestrator never sees provider
/// specifics; it is selected once at the boundary.
#[async_trait]
pub trait ResearchAI: Send + Sync {
    /// Generate up to `max_queries` search queries for the question.
    ///
    /// `prior_learnings` carries everything learned in earlier rounds so
    /// later rounds can ask more targeted questions. Returning fewer
    /// queries than asked is fine; an empty list means there is nothing
    /// left worth investigating and ends the run.
    async fn generate_queries(
        &self,
        question: &str,
        prior_learnings: Option<&[String]>,
        max_queries: usize,
    ) -> Result<Vec<CandidateQuery>>;

    /// Distill up to `max_learnings` learnings (and `max_follow_ups`
    /// follow-up questions) from the documents retrieved for `query`.
    ///
    /// Each learning should be concise, information-dense, and specific to
    /// the code shown (file paths, function names, types).
    async fn extract_learnings(
        &self,
        query: &str,
        documents: &[Document],
        max_learnings: usize,
        max_follow_ups: usize,
    ) -> Result<ExtractedInsights>;

    /// Synthesize the final report as an incremental fragment stream.
    ///
    /// The concatenation of all fragments in arrival order is the report.
    async fn stream_report(&self, question: &str, learnings: &[String]) -> Result<ReportStream>;

    /// Synthesize the final report as a single string (non-streaming mode).
    async fn write_report(&self, question: &str, learnings: &[String]) -> Result<String> {
        // Default implementation drains the fragment stream
        let mut stream = self.stream_report(question, learnings).await?;
        let mut report = String::new();
        while let Some(fragment) = stream.next().await {
            report.push_str(&fragment?);
        }
        Ok(report)
    }
}

// Boxed capabilities (e.g. from the provider registry) delegate through.
#[async_trait]
impl<T: ResearchAI + ?Sized> ResearchAI for Box<T> {
    async fn generate_queries(
        &self,
        question: &str,
        prior_learnings: Option<&[String]>,
        max_queries: usize,
    ) -> Result<Vec<CandidateQuery>> {
        (**self)
            .generate_queries(question, prior_learnings, max_queries)
            .await
    }

    async fn extract_learnings(
        &self,
        query: &str,
        documents: &[Document],
        max_learnings: usize,
        max_follow_ups: usize,
    ) -> Result<ExtractedInsights> {
        (**self)
            .extract_learnings(query, documents, max_learnings, max_follow_ups)
            .await
    }

    async fn stream_report(&self, question: &str, learnings: &[String]) -> Result<ReportStream> {
        (**self).stream_report(question, learnings).await
    }
}
