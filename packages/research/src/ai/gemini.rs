//! Gemini implementation of the [`ResearchAI`] trait.
//!
//! Uses `generateContent` with a JSON mime type for query generation and
//! learning extraction, and `streamGenerateContent` (SSE) for the final
//! report. Unlike OpenAI there is no `[DONE]` terminator; the stream
//! simply ends.

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

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini-backed research capability.
#[derive(Clone)]
pub struct Gemini {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl Gemini {
    /// Create a new adapter with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::from(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `GOOGLE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .map_err(|_| ResearchError::Config("GOOGLE_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set the model (default: gemini-2.0-flash).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Content generation constrained to a JSON response.
    async fn generate_json(&self, user: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: format!("{}\n\n{}", system_preamble(), user),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                response_mime_type: Some("application/json".to_string()),
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ResearchError::AI(Box::new(e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ResearchError::AI(
                format!("Gemini API error: {error_text}").into(),
            ));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ResearchError::AI(Box::new(e)))?;

        let text = generated.text();
        if text.is_empty() {
            return Err(ResearchError::MalformedResponse(
                "no candidates in response".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl ResearchAI for Gemini {
    async fn generate_queries(
        &self,
        question: &str,
        prior_learnings: Option<&[String]>,
        max_queries: usize,
    ) -> Result<Vec<CandidateQuery>> {
        let prompt = format_generate_queries_prompt(question, prior_learnings, max_queries);
        let content = self.generate_json(&prompt).await?;
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
        let content = self.generate_json(&prompt).await?;
        parse_insights_response(&content, max_learnings, max_follow_ups)
    }

    async fn stream_report(&self, question: &str, learnings: &[String]) -> Result<ReportStream> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: format!(
                        "{}\n\n{}",
                        system_preamble(),
                        format_report_prompt(question, learnings)
                    ),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                response_mime_type: None,
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:streamGenerateContent?alt=sse",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ResearchError::AI(Box::new(e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ResearchError::AI(
                format!("Gemini API error: {error_text}").into(),
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
                        SseEvent::Data(data) => {
                            match serde_json::from_str::<GenerateResponse>(&data) {
                                Ok(parsed) => {
                                    let fragment = parsed.text();
                                    if !fragment.is_empty() {
                                        yield Ok(fragment);
                                    }
                                }
                                Err(e) => {
                                    yield Err(ResearchError::MalformedResponse(format!(
                                        "bad stream chunk: {e}"
                                    )));
                                    return;
                                }
                            }
                        }
                    }
                }
            }

            // Trailing data without a final newline
            if let Some(SseEvent::Data(data)) = buffer.finish() {
                if let Ok(parsed) = serde_json::from_str::<GenerateResponse>(&data) {
                    let fragment = parsed.text();
                    if !fragment.is_empty() {
                        yield Ok(fragment);
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate's parts.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_serialization() {
        let config = GenerationConfig {
            temperature: 0.7,
            response_mime_type: Some("application/json".to_string()),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["responseMimeType"], "application/json");

        let config = GenerationConfig {
            temperature: 0.7,
            response_mime_type: None,
        };
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("responseMimeType").is_none());
    }

    #[test]
    fn test_generate_response_text() {
        let data = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}
            ]
        }"#;
        let response: GenerateResponse = serde_json::from_str(data).unwrap();
        assert_eq!(response.text(), "Hello world");

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text(), "");
    }
}
