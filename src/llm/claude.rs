use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MODEL;
use crate::error::{Error, Result};
use crate::llm::prompts::SYSTEM_PROMPT;
use crate::llm::provider::CompletionProvider;

pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ClaudeMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    error: Option<ClaudeError>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ClaudeError {
    message: String,
}

impl ClaudeProvider {
    pub fn new(api_key: String, model: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: "https://api.anthropic.com".to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

fn collect_text(response: ClaudeResponse) -> Result<String> {
    if let Some(error) = response.error {
        return Err(Error::Completion(error.message));
    }

    let text = response
        .content
        .into_iter()
        .filter(|c| c.content_type == "text")
        .filter_map(|c| c.text)
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        return Err(Error::Completion("Empty response from Claude".to_string()));
    }

    Ok(text)
}

#[async_trait]
impl CompletionProvider for ClaudeProvider {
    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        // Rough estimate: ~4 characters per token
        tracing::debug!("Sending ~{} tokens to Claude", prompt.len() / 4);

        let request_body = ClaudeRequest {
            model: &self.model,
            max_tokens,
            temperature,
            system: Some(SYSTEM_PROMPT),
            messages: vec![ClaudeMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::Completion(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Completion(format!(
                "Claude API error ({}): {}",
                status, body
            )));
        }

        let result: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| Error::Completion(format!("Failed to parse Claude response: {}", e)))?;

        collect_text(result)
    }

    fn name(&self) -> &str {
        "Claude"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_text_blocks() {
        let response: ClaudeResponse = serde_json::from_str(
            r#"{"content": [
                {"type": "text", "text": "QUALITY_SCORE: 7\n"},
                {"type": "tool_use"},
                {"type": "text", "text": "COMPLEXITY_LEVEL: Low"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(collect_text(response).unwrap(), "QUALITY_SCORE: 7\nCOMPLEXITY_LEVEL: Low");
    }

    #[test]
    fn test_empty_response_is_an_error() {
        let response: ClaudeResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(matches!(collect_text(response), Err(Error::Completion(_))));
    }

    #[test]
    fn test_api_error_message_is_surfaced() {
        let response: ClaudeResponse =
            serde_json::from_str(r#"{"error": {"message": "overloaded"}}"#).unwrap();
        match collect_text(response) {
            Err(Error::Completion(msg)) => assert_eq!(msg, "overloaded"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }
}
