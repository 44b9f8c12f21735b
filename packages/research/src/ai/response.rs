//! Parse model JSON responses into research types.
//!
//! Both providers are instructed to answer with the same JSON contracts;
//! parsing and truncation to the requested maxima live here so adapters
//! only differ in transport.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::research::{CandidateQuery, ExtractedInsights};

/// Query generation response from the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueriesResponse {
    #[serde(default)]
    pub queries: Vec<RawQuery>,
}

/// A single generated query as the model phrases it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQuery {
    pub query: String,

    #[serde(default)]
    pub research_goal: String,
}

/// Learning extraction response from the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsResponse {
    #[serde(default)]
    pub learnings: Vec<String>,

    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

/// Parse a query generation response, keeping at most `max_queries`.
pub fn parse_queries_response(json: &str, max_queries: usize) -> Result<Vec<CandidateQuery>> {
    let response: QueriesResponse = serde_json::from_str(json)?;

    Ok(response
        .queries
        .into_iter()
        .take(max_queries)
        .map(|q| CandidateQuery::new(q.query, q.research_goal))
        .collect())
}

/// Parse a learning extraction response, truncating to the requested maxima.
pub fn parse_insights_response(
    json: &str,
    max_learnings: usize,
    max_follow_ups: usize,
) -> Result<ExtractedInsights> {
    let mut response: InsightsResponse = serde_json::from_str(json)?;
    response.learnings.truncate(max_learnings);
    response.follow_up_questions.truncate(max_follow_ups);

    Ok(ExtractedInsights {
        learnings: response.learnings,
        follow_ups: response.follow_up_questions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_queries_response() {
        let json = r#"{
            "queries": [
                {"query": "auth middleware", "research_goal": "entry point"},
                {"query": "session store", "research_goal": "persistence"}
            ]
        }"#;

        let queries = parse_queries_response(json, 5).unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].query, "auth middleware");
        assert_eq!(queries[1].goal, "persistence");
    }

    #[test]
    fn test_parse_queries_response_truncates() {
        let json = r#"{
            "queries": [
                {"query": "a"}, {"query": "b"}, {"query": "c"}
            ]
        }"#;

        let queries = parse_queries_response(json, 2).unwrap();
        assert_eq!(queries.len(), 2);
    }

    #[test]
    fn test_parse_queries_response_missing_field() {
        let queries = parse_queries_response("{}", 3).unwrap();
        assert!(queries.is_empty());
    }

    #[test]
    fn test_parse_queries_response_malformed() {
        assert!(parse_queries_response("not json", 3).is_err());
    }

    #[test]
    fn test_parse_insights_response() {
        let json = r#"{
            "learnings": ["one", "two", "three", "four"],
            "follow_up_questions": ["q1", "q2", "q3"]
        }"#;

        let insights = parse_insights_response(json, 3, 2).unwrap();
        assert_eq!(insights.learnings, ["one", "two", "three"]);
        assert_eq!(insights.follow_ups, ["q1", "q2"]);
    }

    #[test]
    fn test_parse_insights_response_defaults() {
        let insights = parse_insights_response("{}", 3, 3).unwrap();
        assert!(insights.learnings.is_empty());
        assert!(insights.follow_ups.is_empty());
    }
}
