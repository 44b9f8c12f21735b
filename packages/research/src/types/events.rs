//! Progress events narrating the state of a research run.

use std::fmt;

/// Facts about what the orchestrator is doing, delivered through the
/// progress sink as they happen.
///
/// Events are observational: they are not retained after delivery and
/// dropping them never affects the run. `Display` renders the human
/// narration text; callers that stream progress to a UI can format the
/// event or match on it.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Run accepted, limits clamped.
    Started { depth: usize, breadth: usize },

    /// A research round is beginning with query generation.
    RoundStarted { round: usize, depth: usize },

    /// A query is being run against the retrieval index.
    Searching { query: String },

    /// Retrieval returned documents for a query.
    DocumentsFound { query: String, count: usize },

    /// Extraction produced learnings for a query.
    LearningsExtracted { query: String, count: usize },

    /// Retrieval returned nothing for a query.
    NoResults { query: String },

    /// Retrieval or extraction failed for a query. Not fatal.
    QueryFailed { query: String },

    /// A round finished with new learnings.
    RoundCompleted {
        round: usize,
        new_learnings: usize,
        total_learnings: usize,
    },

    /// A round finished without any new learnings. Informational.
    NoNewInsights { round: usize },

    /// The cancellation probe fired; stopping with what was gathered.
    Cancelled,

    /// The wall-clock budget ran out; stopping with what was gathered.
    TimedOut,

    /// The global query ceiling was reached; stopping.
    QueryLimitReached,

    /// Query generation returned no candidates; nothing left to explore.
    NoMoreQueries { round: usize },

    /// Report synthesis is starting.
    ReportStarted,

    /// One incremental fragment of the final report.
    ReportFragment(String),
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { depth, breadth } => {
                write!(f, "Starting deep research with depth={depth}, breadth={breadth}")
            }
            Self::RoundStarted { round, depth } => {
                write!(f, "Research round {round}/{depth}: generating search queries")
            }
            Self::Searching { query } => write!(f, "Searching codebase: {query}"),
            Self::DocumentsFound { query, count } => {
                write!(f, "Found {count} relevant files for: {query}")
            }
            Self::LearningsExtracted { query, count } => {
                write!(f, "Extracted {count} insights from: {query}")
            }
            Self::NoResults { query } => write!(f, "No relevant code found for: {query}"),
            Self::QueryFailed { query } => write!(f, "Error searching for: {query}"),
            Self::RoundCompleted {
                round,
                new_learnings,
                total_learnings,
            } => write!(
                f,
                "Round {round} completed: {new_learnings} new insights ({total_learnings} total)"
            ),
            Self::NoNewInsights { round } => write!(f, "No new insights in round {round}"),
            Self::Cancelled => write!(f, "Research cancelled"),
            Self::TimedOut => {
                write!(f, "Research timeout - generating report with current findings")
            }
            Self::QueryLimitReached => write!(f, "Query limit reached - generating report"),
            Self::NoMoreQueries { round } => {
                write!(f, "No new queries generated in round {round}, ending research early")
            }
            Self::ReportStarted => write!(f, "Generating final comprehensive report"),
            Self::ReportFragment(fragment) => write!(f, "{fragment}"),
        }
    }
}
