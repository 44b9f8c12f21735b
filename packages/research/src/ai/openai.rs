//! OpenAI implementation of the [`ResearchAI`] trait.
//!
//! Uses chat completions with JSON-mode responses for query generation
//! and learning extraction, and SSE streaming for the final report.
//!
//! # Example
//!
//! ```rust,ignore
//! use research::ai::OpenAI;
//!
//! let ai = OpenAI::from_env()?.with_model("gpt-4o-mini");
//! let researcher = Researcher::new(ai, retriever);
//! ```

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::ai::prompts::{
    format_extract_learnings_prompt, format_generate_queries_prompt, format_report_prompt,
    system_preamble,
};
use crate::ai::response::{parse_insights_response, parse_queries_response};
use crate::ai::sse::{SseBuffer, SseEvent};
use crate::error::{ResearchError, Result};
use crate::traits::ai::{ReportStream, ResearchAI};
use crate::types::research::{CandidateQuery, Document, ExtractedInsights};

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-backed research capability.
#[derive(Clone)]
pub struct OpenAI {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAI {
    /// Create a new adapter with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::from(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ResearchError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set the model (default: gpt-4o).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Chat completion constrained to a JSON object response.
    async fn chat_json(&self, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_preamble(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: 0.7,
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| ResearchError::AI(Box::new(e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ResearchError::AI(
                format!("OpenAI API error: {error_text}").into(),
            ));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ResearchError::AI(Box::new(e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ResearchError::MalformedResponse("no choices in response".to_string()))
    }
}

#[async_trait]
impl ResearchAI for OpenAI {
    async fn generate_queries(
        &self,
        question: &str,
        prior_learnings: Option<&[String]>,
        max_queries: usize,
    ) -> Result<Vec<CandidateQuery>> {
        let prompt = format_generate_queries_prompt(question, prior_learnings, max_queries);
        let content = self.chat_json(&prompt).await?;
        parse_queries_response(&content, max_queries)
    }

    async fn extract_learnings(
        &self,
        query: &str,
        documents: &[Document],
        max_learnings: usize,
        max_follow_ups: usize,
    ) -> Result<ExtractedInsights> {
        if documents.is_empty() {
            return Ok(ExtractedInsights::default());
        }

        let prompt =
            format_extract_learnings_prompt(query, documents, max_learnings, max_follow_ups);
        let content = self.chat_json(&prompt).await?;
        parse_insights_response(&content, max_learnings, max_follow_ups)
    }

    async fn stream_report(&self, question: &str, learnings: &[String]) -> Result<ReportStream> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_preamble(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format_report_prompt(question, learnings),
                },
            ],
            temperature: 0.7,
            response_format: None,
            stream: true,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| ResearchError::AI(Box::new(e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ResearchError::AI(
                format!("OpenAI API error: {error_text}").into(),
            ));
        }

        let mut bytes = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer = SseBuffer::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ResearchError::AI(Box::new(e)));
                        return;
                    }
                };

                let text = match std::str::from_utf8(&chunk) {
                    Ok(text) => text,
                    Err(e) => {
                        yield Err(ResearchError::MalformedResponse(format!(
                            "invalid UTF-8 in stream: {e}"
                        )));
                        return;
                    }
                };

                for event in buffer.push(text) {
                    match event {
                        SseEvent::Done => return,
                        SseEvent::Data(data) => match serde_json::from_str::<StreamChunk>(&data) {
                            Ok(parsed) => {
                                let delta = parsed
                                    .choices
                                    .into_iter()
                                    .next()
                                    .and_then(|c| c.delta.content)
                                    .unwrap_or_default();
                                if !delta.is_empty() {
                                    yield Ok(delta);
                                }
                            }
                            Err(e) => {
                                yield Err(ResearchError::MalformedResponse(format!(
                                    "bad stream chunk: {e}"
                                )));
                                return;
                            }
                        },
                    }
                }
            }

            // Trailing data without a final newline
            if let Some(SseEvent::Data(data)) = buffer.finish() {
                if let Ok(parsed) = serde_json::from_str::<StreamChunk>(&data) {
                    let delta = parsed
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                        .unwrap_or_default();
                    if !delta.is_empty() {
                        yield Ok(delta);
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatRequest {
            model: "gpt-4o".to_string(),
            messages: vec![],
            temperature: 0.7,
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_stream_chunk_parsing() {
        let data = r#"{"choices":[{"delta":{"content":"Hello"}}]}"#;
        let chunk: StreamChunk = serde_json::from_str(data).unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hello"));

        let empty = r#"{"choices":[{"delta":{}}]}"#;
        let chunk: StreamChunk = serde_json::from_str(empty).unwrap();
        assert!(chunk.choices[0].delta.content.is_none());
    }
}
