//! Resource group discovery and template export via the Azure CLI
//!
//! Uses `az group list` and `az group export` against the subscription that is
//! currently active in the CLI. Authentication is left entirely to `az`.

use std::future::Future;

use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::error::ClientError;

const INSTALL_HINT: &str = "Install the Azure CLI: https://aka.ms/install-azure-cli";
const LOGIN_HINT: &str = "Run `az login` to sign in, then `az account set` to pick a subscription";

/// The two read-only Azure operations the documentation run needs.
pub trait ResourceGroupSource {
    /// List resource group names in the active subscription.
    fn list_resource_groups(&self)
    -> impl Future<Output = Result<Vec<String>, ClientError>> + Send;

    /// Export the ARM template of one resource group.
    fn export_template(
        &self,
        resource_group: &str,
    ) -> impl Future<Output = Result<ExportedTemplate, ClientError>> + Send;
}

/// An exported ARM template: the exact text `az` printed, plus its parsed form.
#[derive(Debug, Clone)]
pub struct ExportedTemplate {
    pub text: String,
    pub json: Value,
}

impl ExportedTemplate {
    /// Check that an export is a non-empty JSON document.
    pub fn parse(resource_group: &str, text: String) -> Result<Self, ClientError> {
        if text.trim().is_empty() {
            return Err(ClientError::az_output(format!(
                "template export for '{resource_group}' was empty"
            )));
        }

        let json = serde_json::from_str(&text).map_err(|e| {
            ClientError::az_output(format!(
                "template export for '{resource_group}' is not valid JSON: {e}"
            ))
        })?;

        Ok(Self { text, json })
    }
}

/// Azure CLI-backed [`ResourceGroupSource`].
#[derive(Debug, Clone)]
pub struct AzCli {
    program: String,
}

impl Default for AzCli {
    fn default() -> Self {
        Self::new()
    }
}

impl AzCli {
    pub fn new() -> Self {
        Self::with_program("az")
    }

    /// Use a different executable, e.g. `az.cmd` or a wrapper script.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run `az` with the given arguments and return stdout.
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, ClientError> {
        debug!(program = %self.program, ?args, "running Azure CLI");

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                ClientError::az_cli(format!("failed to run `{}`: {e}", self.program), INSTALL_HINT)
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failure(&stderr));
        }

        Ok(output.stdout)
    }
}

impl ResourceGroupSource for AzCli {
    async fn list_resource_groups(&self) -> Result<Vec<String>, ClientError> {
        let stdout = self
            .run(&["group", "list", "--query", "[].name", "--output", "json"])
            .await?;
        let groups = parse_group_list(&stdout)?;
        debug!(count = groups.len(), "found resource groups");
        Ok(groups)
    }

    async fn export_template(&self, resource_group: &str) -> Result<ExportedTemplate, ClientError> {
        let stdout = self
            .run(&[
                "group",
                "export",
                "--name",
                resource_group,
                "--include-parameter-default-value",
                "--output",
                "json",
            ])
            .await?;
        validate_export(resource_group, stdout)
    }
}

/// Turn a failed `az` invocation into an error with a useful hint.
fn failure(stderr: &str) -> ClientError {
    let message = stderr.trim().to_string();
    if message.contains("az login") || message.contains("not logged in") {
        ClientError::az_cli(message, LOGIN_HINT)
    } else if message.contains("AuthorizationFailed") {
        ClientError::az_cli(
            message,
            "You may not have Reader access on this resource group. Check your Azure RBAC roles.",
        )
    } else if message.contains("ResourceGroupNotFound") {
        ClientError::az_cli(message, "The resource group may have been deleted during the run")
    } else {
        ClientError::az_cli(message, "Re-run with -v to see the exact `az` command")
    }
}

/// Parse the JSON array produced by `az group list --query [].name`.
fn parse_group_list(stdout: &[u8]) -> Result<Vec<String>, ClientError> {
    let names: Vec<String> = serde_json::from_slice(stdout)
        .map_err(|e| ClientError::az_output(format!("failed to parse resource group list: {e}")))?;

    Ok(names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect())
}

/// Decode `az group export` output into an [`ExportedTemplate`].
fn validate_export(resource_group: &str, stdout: Vec<u8>) -> Result<ExportedTemplate, ClientError> {
    let text = String::from_utf8(stdout).map_err(|e| {
        ClientError::az_output(format!(
            "template export for '{resource_group}' is not valid UTF-8: {e}"
        ))
    })?;

    ExportedTemplate::parse(resource_group, text)
}
