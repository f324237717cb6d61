//! Gemini `generateContent` client.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::VisionService;

const IMAGE_MIME_TYPE: &str = "image/jpeg";

pub struct GeminiClient {
    config: Config,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Joined text parts of the first candidate.
    fn into_text(self) -> Result<String> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(match self.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => Error::parse(format!("Gemini blocked the prompt: {reason}")),
                None => Error::parse("No candidates in Gemini response"),
            });
        };

        let text: String = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if text.is_empty() {
            return Err(match candidate.finish_reason {
                Some(reason) => Error::parse(format!(
                    "No text in Gemini response (finish reason: {reason})"
                )),
                None => Error::parse("No text in Gemini response"),
            });
        }

        Ok(text)
    }
}

impl GeminiClient {
    /// The underlying HTTP client has no timeout: a hung endpoint blocks the caller.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }
}

#[async_trait]
impl VisionService for GeminiClient {
    async fn submit(&self, prompt: &str, image: &[u8]) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: prompt },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: IMAGE_MIME_TYPE,
                            data: general_purpose::STANDARD.encode(image),
                        },
                    },
                ],
            }],
        };

        info!(model = %self.config.model, bytes = image.len(), "sending image to Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::service(format!("Gemini API request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::service(format!(
                "Gemini API returned {status}: {}",
                body.trim()
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::parse(format!("Failed to parse Gemini response: {}", e.without_url())))?;

        let text = body.into_text()?;
        debug!(reply = %text, "Gemini replied");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn request_uses_inline_jpeg_part() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: "prompt" },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: IMAGE_MIME_TYPE,
                            data: general_purpose::STANDARD.encode(b"abc"),
                        },
                    },
                ],
            }],
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [{
                    "parts": [
                        {"text": "prompt"},
                        {"inlineData": {"mimeType": "image/jpeg", "data": "YWJj"}}
                    ]
                }]
            })
        );
    }

    #[test]
    fn text_parts_of_first_candidate_are_joined() {
        let response = parse(json!({
            "candidates": [
                {"content": {"parts": [{"text": "pla"}, {"text": "stic"}]}},
                {"content": {"parts": [{"text": "glass"}]}}
            ]
        }));
        assert_eq!(response.into_text().unwrap(), "plastic");
    }

    #[test]
    fn blocked_prompt_reports_reason() {
        let response = parse(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }));
        let err = response.into_text().unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn candidate_without_text_is_an_error() {
        let response = parse(json!({
            "candidates": [{"finishReason": "RECITATION"}]
        }));
        let err = response.into_text().unwrap_err();
        assert!(err.to_string().contains("RECITATION"));
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new(
            Config::new("k")
                .with_model("gemini-x")
                .with_base_url("http://localhost:1"),
        );
        assert_eq!(
            client.endpoint(),
            "http://localhost:1/models/gemini-x:generateContent"
        );
    }
}
