//! Azure OpenAI client
//!
//! Sends chat completion requests to an Azure OpenAI deployment using key
//! authentication (`api-key` header). The deployment in the URL selects the
//! model, so the request body carries no `model` field.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use armdoc_core::prompt::PromptPair;

use crate::error::ClientError;

/// Request timeout for hosted completions
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Azure OpenAI client for chat completions
pub struct AzureOpenAIClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    deployment: String,
    api_version: String,
}

impl AzureOpenAIClient {
    pub fn new(
        endpoint: &str,
        deployment: &str,
        api_version: &str,
        api_key: &str,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            deployment: deployment.to_string(),
            api_version: api_version.to_string(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }

    /// Send a chat completion request and return the response text.
    pub async fn chat_completion(&self, prompt: &PromptPair) -> Result<String, ClientError> {
        let url = self.url();
        debug!("Azure OpenAI chat completion: {}", url);

        let body = serde_json::json!({
            "messages": [
                { "role": "system", "content": prompt.system_message },
                { "role": "user", "content": prompt.user_message },
            ],
        });

        let response = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

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

/// Pull the first choice's message content out of a chat completion response.
///
/// Empty content and filtered completions are errors.
pub(crate) fn completion_text(json: &Value) -> Result<String, ClientError> {
    let choice = json
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| ClientError::completion("completion response contained no choices"))?;

    if choice.get("finish_reason").and_then(Value::as_str) == Some("content_filter") {
        return Err(ClientError::completion(
            "completion was blocked by the provider's content filter",
        ));
    }

    let content = choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or("");

    if content.trim().is_empty() {
        return Err(ClientError::completion("provider returned an empty completion"));
    }

    Ok(content.to_string())
}

/// Extract a human-readable message from an OpenAI-style error response.
pub(crate) fn extract_openai_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}
