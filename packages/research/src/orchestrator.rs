//! The research orchestrator - the bounded multi-round loop.
//!
//! Composes query generation, retrieval and extraction into iterative
//! research rounds, accumulates learnings across rounds, and drives the
//! streamed synthesis of the final report. Every per-query and per-round
//! failure is narrated and swallowed; `run` always returns a result.

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::traits::ai::ResearchAI;
use crate::traits::retriever::Retriever;
use crate::types::config::ResearchConfig;
use crate::types::events::ProgressEvent;
use crate::types::research::{ResearchRequest, ResearchResult};

/// Iterative deep research over an indexed repository.
///
/// # Example
///
/// ```rust,ignore
/// use research::{Researcher, ResearchRequest};
///
/// let researcher = Researcher::new(ai, retriever);
/// let result = researcher
///     .run(ResearchRequest::new("How does authentication work?"))
///     .await;
/// println!("{}", result.final_report);
/// ```
pub struct Researcher<A: ResearchAI, R: Retriever> {
    ai: A,
    retriever: R,
    config: ResearchConfig,
}

impl<A: ResearchAI, R: Retriever> Researcher<A, R> {
    /// Create a researcher with the default safety limits.
    pub fn new(ai: A, retriever: R) -> Self {
        Self {
            ai,
            retriever,
            config: ResearchConfig::default(),
        }
    }

    /// Create with custom limits.
    pub fn with_config(ai: A, retriever: R, config: ResearchConfig) -> Self {
        Self {
            ai,
            retriever,
            config,
        }
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Run the full research loop and synthesize a report.
    ///
    /// Never fails: capability errors are narrated and treated as empty
    /// results, and every terminal condition (depth, timeout, query
    /// ceiling, cancellation, no more queries) proceeds to report
    /// synthesis with whatever has been gathered.
    pub async fn run(&self, request: ResearchRequest) -> ResearchResult {
        let breadth = self.config.clamp_breadth(request.breadth);
        let depth = self.config.clamp_depth(request.depth);
        let started = tokio::time::Instant::now();

        info!(
            question = %request.question,
            breadth,
            depth,
            "Starting deep research"
        );
        self.notify(&request, ProgressEvent::Started { depth, breadth });

        let mut learnings: Vec<String> = Vec::new();
        let mut total_queries = 0usize;

        for round in 1..=depth {
            if is_cancelled(&request) {
                info!(round, "Research cancelled by caller");
                self.notify(&request, ProgressEvent::Cancelled);
                break;
            }

            if started.elapsed() > self.config.max_research_time {
                warn!(
                    elapsed_secs = started.elapsed().as_secs(),
                    "Research timeout"
                );
                self.notify(&request, ProgressEvent::TimedOut);
                break;
            }

            if total_queries >= self.config.max_total_queries {
                warn!(total_queries, "Reached maximum queries limit");
                self.notify(&request, ProgressEvent::QueryLimitReached);
                break;
            }

            info!(round, depth, "Research round");
            self.notify(&request, ProgressEvent::RoundStarted { round, depth });

            // From round 2 onward this carries everything learned so far,
            // so later rounds ask more targeted questions.
            let prior = if learnings.is_empty() {
                None
            } else {
                Some(learnings.as_slice())
            };

            let candidates = match self
                .ai
                .generate_queries(&request.question, prior, breadth)
                .await
            {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(round, error = %e, "Query generation failed");
                    Vec::new()
                }
            };

            if candidates.is_empty() {
                info!(round, "No queries generated, ending research early");
                self.notify(&request, ProgressEvent::NoMoreQueries { round });
                break;
            }

            let mut round_learnings: Vec<String> = Vec::new();

            for candidate in candidates.into_iter().take(breadth) {
                if is_cancelled(&request) {
                    // Keep what this round gathered; the next round's top
                    // check narrates the cancellation.
                    break;
                }

                total_queries += 1;

                if candidate.query.is_empty() {
                    continue;
                }

                debug!(query = %candidate.query, goal = %candidate.goal, "Processing query");
                self.notify(
                    &request,
                    ProgressEvent::Searching {
                        query: candidate.query.clone(),
                    },
                );

                let documents = match self
                    .retriever
                    .retrieve(&candidate.query, &request.language)
                    .await
                {
                    Ok(documents) => documents,
                    Err(e) => {
                        warn!(query = %candidate.query, error = %e, "Retrieval failed");
                        self.notify(
                            &request,
                            ProgressEvent::QueryFailed {
                                query: candidate.query.clone(),
                            },
                        );
                        continue;
                    }
                };

                if documents.is_empty() {
                    debug!(query = %candidate.query, "No documents retrieved");
                    self.notify(
                        &request,
                        ProgressEvent::NoResults {
                            query: candidate.query.clone(),
                        },
                    );
                    continue;
                }

                self.notify(
                    &request,
                    ProgressEvent::DocumentsFound {
                        query: candidate.query.clone(),
                        count: documents.len(),
                    },
                );

                // Top-ranked documents only; the rest are discarded.
                let top = &documents[..documents.len().min(self.config.max_documents_per_query)];

                let insights = match self
                    .ai
                    .extract_learnings(
                        &candidate.query,
                        top,
                        self.config.max_learnings_per_query,
                        breadth,
                    )
                    .await
                {
                    Ok(insights) => insights,
                    Err(e) => {
                        warn!(query = %candidate.query, error = %e, "Extraction failed");
                        self.notify(
                            &request,
                            ProgressEvent::QueryFailed {
                                query: candidate.query.clone(),
                            },
                        );
                        continue;
                    }
                };

                if !insights.learnings.is_empty() {
                    debug!(
                        query = %candidate.query,
                        count = insights.learnings.len(),
                        "Extracted learnings"
                    );
                    self.notify(
                        &request,
                        ProgressEvent::LearningsExtracted {
                            query: candidate.query.clone(),
                            count: insights.learnings.len(),
                        },
                    );
                    round_learnings.extend(insights.learnings);
                }
                // insights.follow_ups are collected by the capability but
                // not consumed here.
            }

            if round_learnings.is_empty() {
                info!(round, "No new learnings this round");
                self.notify(&request, ProgressEvent::NoNewInsights { round });
            } else {
                let new_learnings = round_learnings.len();
                learnings.append(&mut round_learnings);
                info!(
                    round,
                    new_learnings,
                    total_learnings = learnings.len(),
                    "Round completed"
                );
                self.notify(
                    &request,
                    ProgressEvent::RoundCompleted {
                        round,
                        new_learnings,
                        total_learnings: learnings.len(),
                    },
                );
            }
        }

        info!(total_learnings = learnings.len(), "Research complete");

        let final_report = self.synthesize_report(&request, &learnings).await;

        ResearchResult {
            learnings,
            final_report,
        }
    }

    /// Report phase: stream synthesis when learnings exist, deterministic
    /// fallback otherwise. Failures surface as the report text, never as
    /// an error.
    async fn synthesize_report(&self, request: &ResearchRequest, learnings: &[String]) -> String {
        self.notify(request, ProgressEvent::ReportStarted);

        if learnings.is_empty() {
            let fallback = format!(
                "# Research Results\n\nUnable to find sufficient information in the codebase \
                 to answer: {}\n\nPlease try rephrasing your question or ensure the repository \
                 has been properly indexed.",
                request.question
            );
            self.notify(request, ProgressEvent::ReportFragment(fallback.clone()));
            return fallback;
        }

        let mut report = String::new();

        match self.ai.stream_report(&request.question, learnings).await {
            Ok(mut stream) => {
                while let Some(fragment) = stream.next().await {
                    match fragment {
                        Ok(text) => {
                            report.push_str(&text);
                            self.notify(request, ProgressEvent::ReportFragment(text));
                        }
                        Err(e) => {
                            warn!(error = %e, "Report stream failed");
                            let message = format!("Error generating final report: {e}");
                            report.push_str(&message);
                            self.notify(request, ProgressEvent::ReportFragment(message));
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Report synthesis failed");
                report = format!("Error generating final report: {e}");
                self.notify(request, ProgressEvent::ReportFragment(report.clone()));
            }
        }

        info!(report_len = report.len(), "Final report generated");
        report
    }

    fn notify(&self, request: &ResearchRequest, event: ProgressEvent) {
        if let Some(sink) = &request.progress {
            sink.notify(event);
        }
    }
}

fn is_cancelled(request: &ResearchRequest) -> bool {
    request.cancel.as_ref().is_some_and(|t| t.is_cancelled())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use crate::testing::{CollectingSink, MockAICall, MockResearchAI, MockRetriever};
    use crate::traits::progress::{ChannelSink, FnSink};
    use crate::types::research::{CandidateQuery, Document};

    fn doc(path: &str) -> Document {
        Document::new(path, "fn main() {}")
    }

    fn generation_calls(ai: &MockResearchAI) -> Vec<(Option<Vec<String>>, usize)> {
        ai.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockAICall::GenerateQueries {
                    prior_learnings,
                    max_queries,
                    ..
                } => Some((prior_learnings, max_queries)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_single_round_scenario() {
        let ai = MockResearchAI::new()
            .with_round_queries(vec![
                CandidateQuery::new("auth middleware", "find the entry point"),
                CandidateQuery::new("session tokens", "find token storage"),
            ])
            .with_learnings(
                "auth middleware",
                &[
                    "Authentication is a tower middleware in src/auth.rs",
                    "Tokens are validated with the jsonwebtoken crate",
                ],
            )
            .with_report_fragments(&["# Report", " body"]);
        let retriever =
            MockRetriever::new().with_documents("auth middleware", vec![doc("src/auth.rs")]);
        let sink = Arc::new(CollectingSink::new());

        let researcher = Researcher::new(ai.clone(), retriever.clone());
        let result = researcher
            .run(
                ResearchRequest::new("How does authentication work?")
                    .with_breadth(2)
                    .with_depth(1)
                    .with_progress(sink.clone()),
            )
            .await;

        assert_eq!(
            result.learnings,
            [
                "Authentication is a tower middleware in src/auth.rs",
                "Tokens are validated with the jsonwebtoken crate",
            ]
        );
        assert_eq!(result.final_report, "# Report body");

        let events = sink.events();
        assert!(events.contains(&ProgressEvent::DocumentsFound {
            query: "auth middleware".to_string(),
            count: 1,
        }));
        assert!(events.contains(&ProgressEvent::NoResults {
            query: "session tokens".to_string(),
        }));
    }

    #[tokio::test]
    async fn test_learnings_follow_discovery_order() {
        let ai = MockResearchAI::new()
            .with_round_queries(vec![
                CandidateQuery::new("q1", ""),
                CandidateQuery::new("q2", ""),
            ])
            .with_round_queries(vec![CandidateQuery::new("q3", "")])
            .with_learnings("q1", &["a"])
            .with_learnings("q2", &["b1", "b2"])
            .with_learnings("q3", &["c"]);
        let retriever = MockRetriever::new()
            .with_documents("q1", vec![doc("a.rs")])
            .with_documents("q2", vec![doc("b.rs")])
            .with_documents("q3", vec![doc("c.rs")]);

        let researcher = Researcher::new(ai.clone(), retriever);
        let result = researcher
            .run(ResearchRequest::new("question").with_breadth(2).with_depth(2))
            .await;

        // Round 1 precedes round 2; within a round, query order is kept
        assert_eq!(result.learnings, ["a", "b1", "b2", "c"]);
    }

    #[tokio::test]
    async fn test_cumulative_learnings_feed_later_rounds() {
        let ai = MockResearchAI::new()
            .with_round_queries(vec![CandidateQuery::new("q1", "")])
            .with_round_queries(vec![CandidateQuery::new("q2", "")])
            .with_learnings("q1", &["first fact"]);
        let retriever = MockRetriever::new().with_documents("q1", vec![doc("a.rs")]);

        let researcher = Researcher::new(ai.clone(), retriever);
        researcher
            .run(ResearchRequest::new("question").with_breadth(1).with_depth(2))
            .await;

        let calls = generation_calls(&ai);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, None);
        assert_eq!(calls[1].0.as_deref(), Some(["first fact".to_string()].as_slice()));
    }

    #[tokio::test]
    async fn test_breadth_clamped_and_excess_candidates_dropped() {
        let candidates = (0..7)
            .map(|i| CandidateQuery::new(format!("q{i}"), ""))
            .collect();
        let ai = MockResearchAI::new().with_round_queries(candidates);
        let retriever = MockRetriever::new();

        let researcher = Researcher::new(ai.clone(), retriever.clone());
        researcher
            .run(ResearchRequest::new("question").with_breadth(50).with_depth(1))
            .await;

        // Capability asked for at most 5; surplus candidates never issued
        assert_eq!(generation_calls(&ai)[0].1, 5);
        assert_eq!(retriever.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_depth_clamped() {
        let mut ai = MockResearchAI::new();
        for i in 0..7 {
            ai = ai.with_round_queries(vec![CandidateQuery::new(format!("q{i}"), "")]);
        }
        let retriever = MockRetriever::new();

        let researcher = Researcher::new(ai.clone(), retriever.clone());
        researcher
            .run(ResearchRequest::new("question").with_breadth(1).with_depth(100))
            .await;

        assert_eq!(generation_calls(&ai).len(), 5);
        assert_eq!(retriever.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_global_query_ceiling() {
        let mut ai = MockResearchAI::new();
        for round in 0..5 {
            let candidates = (0..5)
                .map(|i| CandidateQuery::new(format!("q{round}-{i}"), ""))
                .collect();
            ai = ai.with_round_queries(candidates);
        }
        let retriever = MockRetriever::new();
        let sink = Arc::new(CollectingSink::new());

        let researcher = Researcher::new(ai.clone(), retriever.clone());
        researcher
            .run(
                ResearchRequest::new("question")
                    .with_breadth(5)
                    .with_depth(5)
                    .with_progress(sink.clone()),
            )
            .await;

        // 4 full rounds exhaust the ceiling of 20; round 5 never starts
        assert_eq!(retriever.calls().len(), 20);
        assert_eq!(generation_calls(&ai).len(), 4);
        assert!(sink.events().contains(&ProgressEvent::QueryLimitReached));
    }

    #[tokio::test]
    async fn test_cancellation_keeps_completed_rounds() {
        let ai = MockResearchAI::new()
            .with_round_queries(vec![CandidateQuery::new("q1", "")])
            .with_round_queries(vec![CandidateQuery::new("q2", "")])
            .with_learnings("q1", &["round one fact"])
            .with_learnings("q2", &["round two fact"]);
        let retriever = MockRetriever::new()
            .with_documents("q1", vec![doc("a.rs")])
            .with_documents("q2", vec![doc("b.rs")]);

        let token = CancellationToken::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let token = token.clone();
            let events = Arc::clone(&events);
            FnSink::new(move |event: ProgressEvent| {
                if matches!(event, ProgressEvent::RoundCompleted { round: 1, .. }) {
                    token.cancel();
                }
                events.lock().unwrap().push(event);
            })
        };

        let researcher = Researcher::new(ai.clone(), retriever);
        let result = researcher
            .run(
                ResearchRequest::new("question")
                    .with_breadth(1)
                    .with_depth(2)
                    .with_progress(Arc::new(sink))
                    .with_cancel(token.clone()),
            )
            .await;

        // Exactly one completed round's worth of learnings, report still made
        assert_eq!(result.learnings, ["round one fact"]);
        assert!(!result.final_report.is_empty());
        assert_eq!(generation_calls(&ai).len(), 1);
        assert!(events.lock().unwrap().contains(&ProgressEvent::Cancelled));
    }

    #[tokio::test]
    async fn test_no_queries_round_one_falls_back() {
        let ai = MockResearchAI::new();
        let retriever = MockRetriever::new();
        let sink = Arc::new(CollectingSink::new());

        let researcher = Researcher::new(ai.clone(), retriever);
        let result = researcher
            .run(
                ResearchRequest::new("What does the scheduler do?")
                    .with_progress(sink.clone()),
            )
            .await;

        assert!(result.learnings.is_empty());
        assert!(result.final_report.contains("What does the scheduler do?"));
        assert!(result.final_report.contains("rephrasing"));

        let events = sink.events();
        assert!(events.contains(&ProgressEvent::NoMoreQueries { round: 1 }));
        assert!(events.contains(&ProgressEvent::ReportStarted));
        assert!(events
            .iter()
            .any(|e| matches!(e, ProgressEvent::ReportFragment(f) if f == &result.final_report)));

        // Report synthesis is skipped entirely when nothing was learned
        assert!(!ai
            .calls()
            .iter()
            .any(|c| matches!(c, MockAICall::StreamReport { .. })));
    }

    #[tokio::test]
    async fn test_every_capability_failing_still_returns() {
        let ai = MockResearchAI::new().failing_generation().failing_report();
        let retriever = MockRetriever::new().failing_query("anything");

        let researcher = Researcher::new(ai.clone(), retriever);
        let result = researcher
            .run(ResearchRequest::new("question").with_breadth(3).with_depth(3))
            .await;

        assert!(result.learnings.is_empty());
        assert!(result.final_report.contains("question"));
        assert!(!ai
            .calls()
            .iter()
            .any(|c| matches!(c, MockAICall::StreamReport { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wall_clock_budget() {
        let ai = MockResearchAI::new()
            .with_round_queries(vec![CandidateQuery::new("q1", "")])
            .with_round_queries(vec![CandidateQuery::new("q2", "")])
            .with_learnings("q1", &["fact"])
            .with_generation_delay(Duration::from_millis(200));
        let retriever = MockRetriever::new().with_documents("q1", vec![doc("a.rs")]);
        let sink = Arc::new(CollectingSink::new());

        let config = ResearchConfig::new().with_max_research_time(Duration::from_millis(150));
        let researcher = Researcher::with_config(ai.clone(), retriever, config);
        let result = researcher
            .run(
                ResearchRequest::new("question")
                    .with_breadth(1)
                    .with_depth(3)
                    .with_progress(sink.clone()),
            )
            .await;

        // Round 1 blew the budget; round 2 never starts, findings are kept
        assert_eq!(result.learnings, ["fact"]);
        assert_eq!(generation_calls(&ai).len(), 1);
        assert!(sink.events().contains(&ProgressEvent::TimedOut));
    }

    #[tokio::test]
    async fn test_blank_query_counted_but_skipped() {
        let ai = MockResearchAI::new()
            .with_round_queries(vec![
                CandidateQuery::new("", "goal without a query"),
                CandidateQuery::new("real", ""),
            ])
            .with_round_queries(vec![CandidateQuery::new("never issued", "")]);
        let retriever = MockRetriever::new();
        let sink = Arc::new(CollectingSink::new());

        let config = ResearchConfig::new().with_max_total_queries(2);
        let researcher = Researcher::with_config(ai.clone(), retriever.clone(), config);
        researcher
            .run(
                ResearchRequest::new("question")
                    .with_breadth(2)
                    .with_depth(2)
                    .with_progress(sink.clone()),
            )
            .await;

        // The blank candidate consumed budget without touching retrieval
        let issued: Vec<_> = retriever.calls().iter().map(|c| c.query.clone()).collect();
        assert_eq!(issued, ["real"]);
        assert!(sink.events().contains(&ProgressEvent::QueryLimitReached));
        assert!(!sink
            .events()
            .iter()
            .any(|e| matches!(e, ProgressEvent::Searching { query } if query.is_empty())));
    }

    #[tokio::test]
    async fn test_partial_failures_do_not_abort_round() {
        let ai = MockResearchAI::new()
            .with_round_queries(vec![
                CandidateQuery::new("broken retrieval", ""),
                CandidateQuery::new("broken extraction", ""),
                CandidateQuery::new("good", ""),
            ])
            .failing_extraction("broken extraction")
            .with_learnings("good", &["surviving fact"]);
        let retriever = MockRetriever::new()
            .failing_query("broken retrieval")
            .with_documents("broken extraction", vec![doc("a.rs")])
            .with_documents("good", vec![doc("b.rs")]);
        let sink = Arc::new(CollectingSink::new());

        let researcher = Researcher::new(ai, retriever);
        let result = researcher
            .run(
                ResearchRequest::new("question")
                    .with_breadth(3)
                    .with_depth(1)
                    .with_progress(sink.clone()),
            )
            .await;

        assert_eq!(result.learnings, ["surviving fact"]);
        let events = sink.events();
        assert!(events.contains(&ProgressEvent::QueryFailed {
            query: "broken retrieval".to_string(),
        }));
        assert!(events.contains(&ProgressEvent::QueryFailed {
            query: "broken extraction".to_string(),
        }));
    }

    #[tokio::test]
    async fn test_extraction_receives_top_documents() {
        let documents = (0..12).map(|i| doc(&format!("src/m{i}.rs"))).collect();
        let ai = MockResearchAI::new()
            .with_round_queries(vec![CandidateQuery::new("wide", "")]);
        let retriever = MockRetriever::new().with_documents("wide", documents);

        let researcher = Researcher::new(ai.clone(), retriever);
        researcher
            .run(ResearchRequest::new("question").with_breadth(2).with_depth(1))
            .await;

        let extract = ai
            .calls()
            .into_iter()
            .find_map(|c| match c {
                MockAICall::ExtractLearnings {
                    document_count,
                    max_learnings,
                    max_follow_ups,
                    ..
                } => Some((document_count, max_learnings, max_follow_ups)),
                _ => None,
            })
            .unwrap();

        assert_eq!(extract, (10, 3, 2));
    }

    #[tokio::test]
    async fn test_no_new_insights_narrated() {
        let ai = MockResearchAI::new()
            .with_round_queries(vec![CandidateQuery::new("quiet", "")]);
        let retriever = MockRetriever::new().with_documents("quiet", vec![doc("a.rs")]);
        let sink = Arc::new(CollectingSink::new());

        let researcher = Researcher::new(ai, retriever);
        researcher
            .run(
                ResearchRequest::new("question")
                    .with_breadth(1)
                    .with_depth(1)
                    .with_progress(sink.clone()),
            )
            .await;

        let events = sink.events();
        assert!(events.contains(&ProgressEvent::NoNewInsights { round: 1 }));
        assert!(!events
            .iter()
            .any(|e| matches!(e, ProgressEvent::RoundCompleted { .. })));
    }

    #[tokio::test]
    async fn test_report_stream_failure_surfaces_as_text() {
        let ai = MockResearchAI::new()
            .with_round_queries(vec![CandidateQuery::new("q", "")])
            .with_learnings("q", &["fact"])
            .with_report_fragments(&["partial ", "rest"])
            .failing_report_after(1);
        let retriever = MockRetriever::new().with_documents("q", vec![doc("a.rs")]);
        let sink = Arc::new(CollectingSink::new());

        let researcher = Researcher::new(ai, retriever);
        let result = researcher
            .run(
                ResearchRequest::new("question")
                    .with_breadth(1)
                    .with_depth(1)
                    .with_progress(sink.clone()),
            )
            .await;

        assert!(result.final_report.starts_with("partial Error generating final report"));
        let fragments: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::ReportFragment(f) => Some(f),
                _ => None,
            })
            .collect();
        assert_eq!(fragments.len(), 2);
        assert!(fragments[1].contains("Error generating final report"));
    }

    #[tokio::test]
    async fn test_report_start_failure_surfaces_as_text() {
        let ai = MockResearchAI::new()
            .with_round_queries(vec![CandidateQuery::new("q", "")])
            .with_learnings("q", &["fact"])
            .failing_report();
        let retriever = MockRetriever::new().with_documents("q", vec![doc("a.rs")]);

        let researcher = Researcher::new(ai, retriever);
        let result = researcher
            .run(ResearchRequest::new("question").with_breadth(1).with_depth(1))
            .await;

        assert_eq!(result.learnings, ["fact"]);
        assert!(result.final_report.starts_with("Error generating final report"));
    }

    #[tokio::test]
    async fn test_progress_event_guarantees() {
        let ai = MockResearchAI::new()
            .with_round_queries(vec![CandidateQuery::new("q1", "")])
            .with_round_queries(vec![CandidateQuery::new("q2", "")])
            .with_learnings("q1", &["a"])
            .with_learnings("q2", &["b"])
            .with_report_fragments(&["one", "two"]);
        let retriever = MockRetriever::new()
            .with_documents("q1", vec![doc("a.rs")])
            .with_documents("q2", vec![doc("b.rs")]);
        let sink = Arc::new(CollectingSink::new());

        let researcher = Researcher::new(ai, retriever);
        researcher
            .run(
                ResearchRequest::new("question")
                    .with_breadth(1)
                    .with_depth(2)
                    .with_progress(sink.clone()),
            )
            .await;

        let events = sink.events();
        let round_starts = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::RoundStarted { .. }))
            .count();
        assert_eq!(round_starts, 2);

        let report_started = events
            .iter()
            .position(|e| matches!(e, ProgressEvent::ReportStarted))
            .unwrap();
        let first_fragment = events
            .iter()
            .position(|e| matches!(e, ProgressEvent::ReportFragment(_)))
            .unwrap();
        assert!(report_started < first_fragment);
    }

    #[tokio::test]
    async fn test_dead_sink_does_not_abort() {
        let ai = MockResearchAI::new()
            .with_round_queries(vec![CandidateQuery::new("q", "")])
            .with_learnings("q", &["fact"]);
        let retriever = MockRetriever::new().with_documents("q", vec![doc("a.rs")]);

        let (sink, rx) = ChannelSink::new(1);
        drop(rx);

        let researcher = Researcher::new(ai, retriever);
        let result = researcher
            .run(
                ResearchRequest::new("question")
                    .with_breadth(1)
                    .with_depth(1)
                    .with_progress(Arc::new(sink)),
            )
            .await;

        assert_eq!(result.learnings, ["fact"]);
        assert!(!result.final_report.is_empty());
    }
}
