//! Unified chat completion dispatcher
//!
//! Routes completion requests to the provider resolved at startup: Azure
//! OpenAI, or an OpenAI-compatible endpoint (public or local).

use std::future::Future;

use armdoc_core::config::ProviderConfig;
use armdoc_core::prompt::PromptPair;

use crate::compatible::OpenAiCompatibleClient;
use crate::error::ClientError;
use crate::openai::AzureOpenAIClient;

/// Something that turns a prompt pair into completion text.
pub trait ChatCompletion {
    fn complete(
        &self,
        prompt: &PromptPair,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// The completion backend for the configured provider.
pub enum CompletionClient {
    AzureOpenAi(AzureOpenAIClient),
    OpenAiCompatible(OpenAiCompatibleClient),
}

impl CompletionClient {
    /// Build the client for a resolved provider. No network calls are made.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ClientError> {
        match config {
            ProviderConfig::AzureOpenAi {
                endpoint,
                deployment,
                api_version,
                api_key,
                ..
            } => Ok(Self::AzureOpenAi(AzureOpenAIClient::new(
                endpoint,
                deployment,
                api_version,
                api_key,
            )?)),
            ProviderConfig::OpenAiCompatible {
                base_url,
                api_key,
                model,
            } => Ok(Self::OpenAiCompatible(OpenAiCompatibleClient::new(
                base_url,
                api_key,
                model,
                config.is_local(),
            )?)),
        }
    }
}

impl ChatCompletion for CompletionClient {
    async fn complete(&self, prompt: &PromptPair) -> Result<String, ClientError> {
        match self {
            Self::AzureOpenAi(client) => client.chat_completion(prompt).await,
            Self::OpenAiCompatible(client) => client.chat_completion(prompt).await,
        }
    }
}
