//! Anthropic messages API backend.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::ModelClient;
use crate::error::VaultError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicModel {
    api_key: String,
    model: String,
    url: String,
    max_tokens: u32,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for AnthropicModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicModel")
            .field("model", &self.model)
            .field("url", &self.url)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl AnthropicModel {
    pub fn new(api_key: String, model: String, url: String, max_tokens: u32) -> Self {
        Self {
            api_key,
            model,
            url,
            max_tokens,
            client: reqwest::blocking::Client::new(),
        }
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Turn an HTTP status and body into the reply text or a typed error.
fn parse_response(status: u16, body: &str) -> Result<String, VaultError> {
    if status != 200 {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_owned());
        return Err(VaultError::ModelApiError { status, message });
    }

    let response: MessagesResponse =
        serde_json::from_str(body).map_err(|e| VaultError::ModelRequestFailed {
            detail: format!("unreadable response body: {e}"),
        })?;

    response
        .content
        .into_iter()
        .find_map(|block| (block.kind == "text").then_some(block.text).flatten())
        .ok_or_else(|| VaultError::ModelRequestFailed {
            detail: "no text content in response".to_owned(),
        })
}

impl ModelClient for AnthropicModel {
    fn complete(&self, prompt: &str) -> Result<String, VaultError> {
        info!(
            provider = "anthropic",
            model = %self.model,
            prompt_len = prompt.len(),
            "sending model request"
        );

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(prompt))
            .send()
            .map_err(|e| VaultError::ModelRequestFailed {
                detail: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| VaultError::ModelRequestFailed {
            detail: e.to_string(),
        })?;

        parse_response(status, &body)
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
