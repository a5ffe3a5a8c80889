//! OpenAI-compatible chat completion client
//!
//! Talks to any server exposing `POST {base_url}/chat/completions`: the public
//! OpenAI API, or a local server such as Ollama (`http://localhost:11434/v1`),
//! which accepts any non-empty key.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use armdoc_core::prompt::PromptPair;

use crate::error::ClientError;
use crate::openai::{completion_text, extract_openai_message};

/// Request timeout for public endpoints
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Request timeout for local endpoints (local LLMs can be slow)
const LOCAL_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for OpenAI-compatible chat completion endpoints
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl OpenAiCompatibleClient {
    pub fn new(base_url: &str, api_key: &str, model: &str, local: bool) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(if local {
                LOCAL_REQUEST_TIMEOUT
            } else {
                REQUEST_TIMEOUT
            })
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Send a chat completion request and return the response text.
    pub async fn chat_completion(&self, prompt: &PromptPair) -> Result<String, ClientError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("chat completion: {} model={}", url, self.model);

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system_message,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user_message,
                },
            ],
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ClientError::completion(format!(
                        "cannot connect to {}. Is the server running? Error: {e}",
                        self.base_url
                    ))
                } else {
                    ClientError::Request(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(
                status.as_u16(),
                extract_openai_message(&body),
            ));
        }

        let json: Value = response.json().await?;
        completion_text(&json)
    }
}
