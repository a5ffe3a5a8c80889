//! Provider and run configuration for armdoc
//!
//! Provider settings come from environment-style variables (optionally loaded
//! from a `.env` file by the binary). Exactly one completion provider must be
//! fully configured before anything touches the network or the Azure CLI.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Hosted-platform (Azure OpenAI) endpoint, e.g. `https://myres.openai.azure.com`
pub const AZURE_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
/// Hosted-platform model deployment name
pub const AZURE_OPENAI_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT";
/// Hosted-platform API version, e.g. `2024-12-01-preview`
pub const AZURE_OPENAI_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
/// Hosted-platform key (falls back to [`OPENAI_API_KEY`])
pub const AZURE_OPENAI_API_KEY: &str = "AZURE_OPENAI_API_KEY";
/// Generic OpenAI-compatible base URL, e.g. `https://api.openai.com/v1`
pub const OPENAI_API_BASE_URL: &str = "OPENAI_API_BASE_URL";
/// API key for the selected provider
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Model name
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";

/// Default directory for generated documents
pub const DEFAULT_OUTPUT_DIR: &str = "./arm_templates";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{provider} configuration is incomplete: {field} is not set")]
    MissingField {
        provider: &'static str,
        field: &'static str,
    },

    #[error(
        "no provider configuration found — set AZURE_OPENAI_ENDPOINT (Azure OpenAI) \
         or OPENAI_API_BASE_URL (OpenAI-compatible endpoint)"
    )]
    NoProvider,
}

/// The completion backend selected at startup.
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// Azure OpenAI: requests are routed by deployment and API version.
    AzureOpenAi {
        endpoint: String,
        deployment: String,
        api_version: String,
        api_key: String,
        /// Shown in output only. The deployment decides which model answers.
        model: String,
    },
    /// Any OpenAI-compatible endpoint, public or running locally.
    OpenAiCompatible {
        base_url: String,
        api_key: String,
        model: String,
    },
}

impl ProviderConfig {
    /// Resolve the provider from a variable lookup, e.g. `|name| std::env::var(name).ok()`.
    ///
    /// The hosted endpoint takes precedence over the generic base URL. Empty
    /// values are treated as unset.
    pub fn resolve<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(endpoint) = get(AZURE_OPENAI_ENDPOINT) {
            const PROVIDER: &str = "Azure OpenAI";
            let require = |field: &'static str| {
                get(field).ok_or(ConfigError::MissingField {
                    provider: PROVIDER,
                    field,
                })
            };

            let deployment = require(AZURE_OPENAI_DEPLOYMENT)?;
            let api_version = require(AZURE_OPENAI_API_VERSION)?;
            let api_key = get(AZURE_OPENAI_API_KEY)
                .or_else(|| get(OPENAI_API_KEY))
                .ok_or(ConfigError::MissingField {
                    provider: PROVIDER,
                    field: AZURE_OPENAI_API_KEY,
                })?;
            let model = get(OPENAI_MODEL).unwrap_or_else(|| deployment.clone());

            return Ok(Self::AzureOpenAi {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                deployment,
                api_version,
                api_key,
                model,
            });
        }

        if let Some(base_url) = get(OPENAI_API_BASE_URL) {
            const PROVIDER: &str = "OpenAI-compatible";
            let require = |field: &'static str| {
                get(field).ok_or(ConfigError::MissingField {
                    provider: PROVIDER,
                    field,
                })
            };

            let api_key = require(OPENAI_API_KEY)?;
            let model = require(OPENAI_MODEL)?;

            return Ok(Self::OpenAiCompatible {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
                model,
            });
        }

        Err(ConfigError::NoProvider)
    }

    /// Human-readable provider name for log output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::AzureOpenAi { .. } => "Azure OpenAI",
            Self::OpenAiCompatible { .. } if self.is_local() => "local OpenAI-compatible server",
            Self::OpenAiCompatible { .. } => "OpenAI-compatible API",
        }
    }

    /// The model answering completions.
    pub fn model(&self) -> &str {
        match self {
            Self::AzureOpenAi { model, .. } | Self::OpenAiCompatible { model, .. } => model,
        }
    }

    /// Whether the generic endpoint points at this machine.
    pub fn is_local(&self) -> bool {
        let Self::OpenAiCompatible { base_url, .. } = self else {
            return false;
        };

        let rest = base_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(base_url.as_str());
        let authority = rest.split('/').next().unwrap_or_default();
        let host = if let Some(bracketed) = authority.strip_prefix('[') {
            bracketed.split(']').next().unwrap_or_default()
        } else {
            authority.split(':').next().unwrap_or_default()
        };

        matches!(
            host.to_ascii_lowercase().as_str(),
            "localhost" | "127.0.0.1" | "::1" | "0.0.0.0"
        )
    }
}

// Keys never reach logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AzureOpenAi {
                endpoint,
                deployment,
                api_version,
                model,
                ..
            } => f
                .debug_struct("AzureOpenAi")
                .field("endpoint", endpoint)
                .field("deployment", deployment)
                .field("api_version", api_version)
                .field("api_key", &"<redacted>")
                .field("model", model)
                .finish(),
            Self::OpenAiCompatible {
                base_url, model, ..
            } => f
                .debug_struct("OpenAiCompatible")
                .field("base_url", base_url)
                .field("api_key", &"<redacted>")
                .field("model", model)
                .finish(),
        }
    }
}

impl fmt::Display for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AzureOpenAi {
                endpoint,
                deployment,
                ..
            } => write!(f, "{} ({endpoint}, deployment {deployment})", self.display_name()),
            Self::OpenAiCompatible {
                base_url, model, ..
            } => write!(f, "{} ({base_url}, model {model})", self.display_name()),
        }
    }
}

/// Where documents go and where prompt templates come from.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub output_dir: PathBuf,
    pub prompts_dir: Option<PathBuf>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            prompts_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_resolve_azure_complete() {
        let config = ProviderConfig::resolve(lookup(&[
            (AZURE_OPENAI_ENDPOINT, "https://myres.openai.azure.com/"),
            (AZURE_OPENAI_DEPLOYMENT, "gpt-4o-mini"),
            (AZURE_OPENAI_API_VERSION, "2024-12-01-preview"),
            (AZURE_OPENAI_API_KEY, "secret"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            ProviderConfig::AzureOpenAi {
                endpoint: "https://myres.openai.azure.com".into(),
                deployment: "gpt-4o-mini".into(),
                api_version: "2024-12-01-preview".into(),
                api_key: "secret".into(),
                model: "gpt-4o-mini".into(),
            }
        );
    }

    #[test]
    fn test_resolve_azure_falls_back_to_openai_key() {
        let config = ProviderConfig::resolve(lookup(&[
            (AZURE_OPENAI_ENDPOINT, "https://myres.openai.azure.com"),
            (AZURE_OPENAI_DEPLOYMENT, "gpt-4o"),
            (AZURE_OPENAI_API_VERSION, "2024-12-01-preview"),
            (OPENAI_API_KEY, "shared-key"),
            (OPENAI_MODEL, "gpt-4o-2024-08-06"),
        ]))
        .unwrap();

        match config {
            ProviderConfig::AzureOpenAi { api_key, model, .. } => {
                assert_eq!(api_key, "shared-key");
                assert_eq!(model, "gpt-4o-2024-08-06");
            }
            other => panic!("expected Azure OpenAI, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_azure_missing_deployment() {
        let err = ProviderConfig::resolve(lookup(&[
            (AZURE_OPENAI_ENDPOINT, "https://myres.openai.azure.com"),
            (AZURE_OPENAI_API_VERSION, "2024-12-01-preview"),
            (AZURE_OPENAI_API_KEY, "secret"),
        ]))
        .unwrap_err();

        assert_eq!(
            err,
            ConfigError::MissingField {
                provider: "Azure OpenAI",
                field: AZURE_OPENAI_DEPLOYMENT,
            }
        );
        assert!(err.to_string().contains("AZURE_OPENAI_DEPLOYMENT"));
    }

    #[test]
    fn test_resolve_azure_missing_key() {
        let err = ProviderConfig::resolve(lookup(&[
            (AZURE_OPENAI_ENDPOINT, "https://myres.openai.azure.com"),
            (AZURE_OPENAI_DEPLOYMENT, "gpt-4o"),
            (AZURE_OPENAI_API_VERSION, "2024-12-01-preview"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("AZURE_OPENAI_API_KEY"));
    }

    #[test]
    fn test_resolve_azure_takes_precedence_over_generic() {
        let config = ProviderConfig::resolve(lookup(&[
            (AZURE_OPENAI_ENDPOINT, "https://myres.openai.azure.com"),
            (AZURE_OPENAI_DEPLOYMENT, "gpt-4o"),
            (AZURE_OPENAI_API_VERSION, "2024-12-01-preview"),
            (OPENAI_API_BASE_URL, "https://api.openai.com/v1"),
            (OPENAI_API_KEY, "key"),
            (OPENAI_MODEL, "gpt-4o"),
        ]))
        .unwrap();
        assert!(matches!(config, ProviderConfig::AzureOpenAi { .. }));
    }

    #[test]
    fn test_resolve_generic_complete() {
        let config = ProviderConfig::resolve(lookup(&[
            (OPENAI_API_BASE_URL, "https://api.openai.com/v1/"),
            (OPENAI_API_KEY, "sk-test"),
            (OPENAI_MODEL, "gpt-3.5-turbo"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            ProviderConfig::OpenAiCompatible {
                base_url: "https://api.openai.com/v1".into(),
                api_key: "sk-test".into(),
                model: "gpt-3.5-turbo".into(),
            }
        );
        assert!(!config.is_local());
    }

    #[test]
    fn test_resolve_generic_missing_model() {
        let err = ProviderConfig::resolve(lookup(&[
            (OPENAI_API_BASE_URL, "https://api.openai.com/v1"),
            (OPENAI_API_KEY, "sk-test"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingField {
                provider: "OpenAI-compatible",
                field: OPENAI_MODEL,
            }
        );
    }

    #[test]
    fn test_resolve_generic_missing_key() {
        let err = ProviderConfig::resolve(lookup(&[
            (OPENAI_API_BASE_URL, "http://localhost:11434/v1"),
            (OPENAI_MODEL, "llama3:8b"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_resolve_nothing_configured() {
        let err = ProviderConfig::resolve(lookup(&[(OPENAI_API_KEY, "sk-test")])).unwrap_err();
        assert_eq!(err, ConfigError::NoProvider);
        assert!(err.to_string().contains("no provider configuration found"));
    }

    #[test]
    fn test_resolve_blank_values_are_unset() {
        let err = ProviderConfig::resolve(lookup(&[
            (AZURE_OPENAI_ENDPOINT, "   "),
            (OPENAI_API_BASE_URL, ""),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::NoProvider);
    }

    #[test]
    fn test_local_endpoint_with_placeholder_key() {
        let config = ProviderConfig::resolve(lookup(&[
            (OPENAI_API_BASE_URL, "http://localhost:11434/v1"),
            (OPENAI_API_KEY, "ollama"),
            (OPENAI_MODEL, "llama3:8b"),
        ]))
        .unwrap();
        assert!(config.is_local());
        assert_eq!(config.display_name(), "local OpenAI-compatible server");
    }

    #[test]
    fn test_is_local_variants() {
        let generic = |url: &str| ProviderConfig::OpenAiCompatible {
            base_url: url.into(),
            api_key: "k".into(),
            model: "m".into(),
        };
        assert!(generic("http://127.0.0.1:8080/v1").is_local());
        assert!(generic("http://[::1]:8080/v1").is_local());
        assert!(!generic("https://localhost.example.com/v1").is_local());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ProviderConfig::OpenAiCompatible {
            base_url: "https://api.openai.com/v1".into(),
            api_key: "sk-very-secret".into(),
            model: "gpt-4o".into(),
        };
        let debug = format!("{config:?}");
        let display = config.to_string();
        assert!(!debug.contains("sk-very-secret"));
        assert!(!display.contains("sk-very-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_run_settings_default_output_dir() {
        let settings = RunSettings::default();
        assert_eq!(settings.output_dir, PathBuf::from("./arm_templates"));
        assert!(settings.prompts_dir.is_none());
    }
}
