//! Configuration types for research runs.

use std::time::Duration;

/// Safety limits for a research run.
///
/// These are enforced at the orchestrator boundary regardless of what the
/// caller asks for: a request with `breadth = 50` still issues at most
/// [`max_breadth`](Self::max_breadth) queries per round. Defaults carry the
/// production values; tests shrink them for fast expiry.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// Maximum queries generated per round. Default: 5.
    pub max_breadth: usize,

    /// Maximum research rounds. Default: 5.
    pub max_depth: usize,

    /// Ceiling on queries issued across the whole run, independent of
    /// breadth × depth. Default: 20.
    pub max_total_queries: usize,

    /// Wall-clock budget for the whole run, measured from entry.
    /// Once exceeded no new round or query begins. Default: 300s.
    pub max_research_time: Duration,

    /// Top-ranked documents handed to extraction per query; lower-ranked
    /// documents are discarded. Default: 10.
    pub max_documents_per_query: usize,

    /// Learnings requested from extraction per query. Default: 3.
    pub max_learnings_per_query: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_breadth: 5,
            max_depth: 5,
            max_total_queries: 20,
            max_research_time: Duration::from_secs(300),
            max_documents_per_query: 10,
            max_learnings_per_query: 3,
        }
    }
}

impl ResearchConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-round query ceiling.
    pub fn with_max_breadth(mut self, max: usize) -> Self {
        self.max_breadth = max;
        self
    }

    /// Set the round ceiling.
    pub fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    /// Set the global query ceiling.
    pub fn with_max_total_queries(mut self, max: usize) -> Self {
        self.max_total_queries = max;
        self
    }

    /// Set the wall-clock budget.
    pub fn with_max_research_time(mut self, budget: Duration) -> Self {
        self.max_research_time = budget;
        self
    }

    /// Set the per-query document cap.
    pub fn with_max_documents_per_query(mut self, max: usize) -> Self {
        self.max_documents_per_query = max;
        self
    }

    /// Set the per-query learnings cap.
    pub fn with_max_learnings_per_query(mut self, max: usize) -> Self {
        self.max_learnings_per_query = max;
        self
    }

    /// Clamp a requested breadth to the configured ceiling, with a floor of 1.
    pub(crate) fn clamp_breadth(&self, requested: usize) -> usize {
        requested.max(1).min(self.max_breadth)
    }

    /// Clamp a requested depth to the configured ceiling, with a floor of 1.
    pub(crate) fn clamp_depth(&self, requested: usize) -> usize {
        requested.max(1).min(self.max_depth)
    }
}

/// Provider identifier + optional model override, resolved once at the
/// boundary when building a [`ResearchAI`](crate::traits::ResearchAI)
/// implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelector {
    /// Provider identifier ("openai", "gemini").
    pub provider: String,

    /// Specific model name; `None` uses the provider default.
    pub model: Option<String>,
}

impl ModelSelector {
    /// Select a provider with its default model.
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: None,
        }
    }

    /// Override the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}
