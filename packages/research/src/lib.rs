//! Iterative Deep Research for Code Repositories
//!
//! A bounded, query-driven research loop over an indexed repository:
//! generate targeted search queries, retrieve relevant code, distill
//! learnings, and synthesize a streamed final report.
//!
//! # Design Philosophy
//!
//! **"Never fail a run for a failed query"**
//!
//! - Bounded by construction: breadth, depth, total queries and wall-clock
//!   time all have hard ceilings
//! - Partial failure tolerant: a broken capability call costs one query's
//!   learnings, never the run
//! - Incremental: progress narration during research, token-level
//!   streaming for the report
//! - Deterministic: learnings keep discovery order for a fixed sequence of
//!   capability responses
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use research::{ChannelSink, Researcher, ResearchRequest};
//! use research::ai; // requires the "openai" or "gemini" feature
//!
//! let model = ai::from_selector(&research::ModelSelector::new("openai"))?;
//! let researcher = Researcher::new(model, retriever);
//!
//! let (sink, mut progress) = ChannelSink::new(64);
//! let result = researcher
//!     .run(
//!         ResearchRequest::new("How does authentication work?")
//!             .with_breadth(3)
//!             .with_depth(2)
//!             .with_progress(Arc::new(sink)),
//!     )
//!     .await;
//!
//! println!("{}", result.final_report);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Capability abstractions (ResearchAI, Retriever, ProgressSink)
//! - [`types`] - Requests, results, events and limits
//! - [`orchestrator`] - The research loop
//! - [`testing`] - Mock implementations for testing
//! - `ai` - Provider adapters (feature-gated)

pub mod error;
pub mod orchestrator;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(any(feature = "openai", feature = "gemini"))]
pub mod ai;

// Re-export core types at crate root
pub use error::{ResearchError, Result};
pub use orchestrator::Researcher;
pub use traits::{
    ai::{ReportStream, ResearchAI},
    progress::{ChannelSink, FnSink, ProgressSink},
    retriever::Retriever,
};
pub use types::{
    config::{ModelSelector, ResearchConfig},
    events::ProgressEvent,
    research::{
        CandidateQuery, Document, ExtractedInsights, ResearchRequest, ResearchResult,
    },
};

// Re-export testing utilities
pub use testing::{CollectingSink, MockResearchAI, MockRetriever};
