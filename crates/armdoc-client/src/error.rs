//! Error types for armdoc-client

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Azure CLI error: {message}\n\nHint: {hint}")]
    AzCli { message: String, hint: String },

    #[error("unexpected Azure CLI output: {message}")]
    AzOutput { message: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("{message}")]
    Completion { message: String },
}

impl ClientError {
    pub fn az_cli(msg: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::AzCli {
            message: msg.into(),
            hint: hint.into(),
        }
    }

    pub fn az_output(msg: impl Into<String>) -> Self {
        Self::AzOutput {
            message: msg.into(),
        }
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Auth { status, message },
            _ => Self::Api { status, message },
        }
    }

    pub fn completion(msg: impl Into<String>) -> Self {
        Self::Completion {
            message: msg.into(),
        }
    }
}
