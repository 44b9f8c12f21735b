//! Prompts for the model-backed research operations.
//!
//! Shared by every provider adapter; each adapter pairs these with the
//! dated system preamble from [`system_preamble`].

use crate::types::research::Document;

/// System preamble for all research calls.
pub fn system_preamble() -> String {
    let now = chrono::Utc::now().to_rfc3339();
    format!(
        "You are an expert code researcher and analyst. Today is {now}. \
         Follow these instructions when responding:\n\
         - You are analyzing code repositories to answer specific technical questions.\n\
         - The user is a highly experienced developer, no need to simplify, be as detailed as possible.\n\
         - Be highly organized and systematic in your research approach.\n\
         - Treat the user as an expert in software development.\n\
         - Mistakes erode trust, so be accurate and thorough in code analysis.\n\
         - Provide detailed explanations with code references.\n\
         - Consider edge cases and potential issues in the code.\n\
         - You may use speculation when code is unclear, but flag it clearly."
    )
}

/// Prompt for generating research queries.
pub const GENERATE_QUERIES_PROMPT: &str = r#"Given the following question about a code repository, generate a list of specific search queries to investigate the codebase.
Return a maximum of {num_queries} queries, but feel free to return fewer if the original question is straightforward.
Make sure each query is unique and targets different aspects of the codebase.

<question>{question}</question>{learnings_section}

For each query, provide:
1. The search query string (keywords or phrases to search in the code)
2. A research goal explaining what we're trying to learn and how to advance the investigation

Respond in JSON format:
{
    "queries": [
        {
            "query": "search terms for the codebase",
            "research_goal": "What we're investigating and why, with follow-up directions"
        }
    ]
}"#;

/// Prompt for distilling learnings from retrieved code.
pub const EXTRACT_LEARNINGS_PROMPT: &str = r#"Given the following code snippets retrieved for the query "{query}", analyze the code and extract key learnings.

Return a maximum of {num_learnings} learnings and {num_follow_ups} follow-up questions.

Make sure each learning is:
- Concise but information-dense
- Specific to the code shown (include file paths, function names, class names, etc.)
- Includes important technical details, patterns, or architectural decisions

<code_snippets>
{snippets}
</code_snippets>

Respond in JSON format:
{
    "learnings": [
        "Specific learning with technical details from the code"
    ],
    "follow_up_questions": [
        "Follow-up question to investigate further"
    ]
}"#;

/// Prompt for the final report.
pub const REPORT_PROMPT: &str = r#"Based on the following research question and all the learnings gathered from analyzing the codebase, write a comprehensive final report.

<question>
{question}
</question>

<learnings>
{learnings}
</learnings>

Write a detailed technical report that:
1. Directly answers the original question
2. Incorporates ALL the learnings from the research
3. Includes specific code references (file paths, function names, classes, etc.)
4. Explains architectural patterns and design decisions
5. Provides code examples where relevant
6. Is formatted in clean Markdown

The report should be comprehensive and include all relevant technical details discovered during research.

Write the report in Markdown format."#;

/// Format the query generation prompt.
pub fn format_generate_queries_prompt(
    question: &str,
    prior_learnings: Option<&[String]>,
    max_queries: usize,
) -> String {
    let learnings_section = match prior_learnings {
        Some(learnings) if !learnings.is_empty() => {
            let listed = learnings
                .iter()
                .map(|l| format!("- {l}"))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "\n\nHere are some learnings from previous research rounds, \
                 use them to generate more specific queries:\n{listed}"
            )
        }
        _ => String::new(),
    };

    GENERATE_QUERIES_PROMPT
        .replace("{num_queries}", &max_queries.to_string())
        .replace("{question}", question)
        .replace("{learnings_section}", &learnings_section)
}

/// Format the learning extraction prompt.
pub fn format_extract_learnings_prompt(
    query: &str,
    documents: &[Document],
    max_learnings: usize,
    max_follow_ups: usize,
) -> String {
    let snippets = documents
        .iter()
        .map(|d| format!("File: {}\n\n{}", d.file_path, d.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    EXTRACT_LEARNINGS_PROMPT
        .replace("{query}", query)
        .replace("{num_learnings}", &max_learnings.to_string())
        .replace("{num_follow_ups}", &max_follow_ups.to_string())
        .replace("{snippets}", &snippets)
}

/// Format the report prompt with numbered learnings.
pub fn format_report_prompt(question: &str, learnings: &[String]) -> String {
    let numbered = learnings
        .iter()
        .enumerate()
        .map(|(i, l)| format!("{}. {}", i + 1, l))
        .collect::<Vec<_>>()
        .join("\n");

    REPORT_PROMPT
        .replace("{question}", question)
        .replace("{learnings}", &numbered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_generate_queries_prompt_without_learnings() {
        let formatted = format_generate_queries_prompt("How does caching work?", None, 3);
        assert!(formatted.contains("How does caching work?"));
        assert!(formatted.contains("maximum of 3 queries"));
        assert!(!formatted.contains("previous research rounds"));
    }

    #[test]
    fn test_format_generate_queries_prompt_with_learnings() {
        let learnings = vec!["Cache lives in src/cache.rs".to_string()];
        let formatted = format_generate_queries_prompt("How does caching work?", Some(&learnings), 3);
        assert!(formatted.contains("previous research rounds"));
        assert!(formatted.contains("- Cache lives in src/cache.rs"));
    }

    #[test]
    fn test_format_extract_learnings_prompt() {
        let documents = vec![
            Document::new("src/a.rs", "fn a() {}"),
            Document::new("src/b.rs", "fn b() {}"),
        ];
        let formatted = format_extract_learnings_prompt("handlers", &documents, 3, 2);
        assert!(formatted.contains("File: src/a.rs"));
        assert!(formatted.contains("File: src/b.rs"));
        assert!(formatted.contains("\n\n---\n\n"));
        assert!(formatted.contains("maximum of 3 learnings and 2 follow-up"));
    }

    #[test]
    fn test_format_report_prompt_numbers_learnings() {
        let learnings = vec!["first".to_string(), "second".to_string()];
        let formatted = format_report_prompt("question", &learnings);
        assert!(formatted.contains("1. first"));
        assert!(formatted.contains("2. second"));
    }
}
