//! CLI argument definitions using clap

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use armdoc_client::ai::CompletionClient;
use armdoc_client::az::{AzCli, ResourceGroupSource};
use armdoc_core::config::{DEFAULT_OUTPUT_DIR, ProviderConfig, RunSettings};
use armdoc_core::prompt::{PromptBuilder, PromptSource};
use colored::Colorize;
use tracing::{debug, info};

use crate::output::write_summary;
use crate::pipeline::{Outcome, Pipeline, RunSummary};

/// Exit code when some resource groups were skipped
const EXIT_PARTIAL: u8 = 2;

/// Document Azure resource groups from their exported ARM templates
#[derive(clap::Parser)]
#[command(name = "armdoc")]
#[command(version, about)]
#[command(long_about = "Document Azure resource groups from their exported ARM templates.\n\n\
    Lists the resource groups in the active Azure CLI subscription, exports each group's \
    ARM template and asks a chat completion model for a Markdown summary.\n\n\
    Provider settings are read from the environment (or a .env file): set \
    AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_DEPLOYMENT, AZURE_OPENAI_API_VERSION and \
    AZURE_OPENAI_API_KEY for Azure OpenAI, or OPENAI_API_BASE_URL, OPENAI_API_KEY and \
    OPENAI_MODEL for any OpenAI-compatible endpoint.")]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Directory to write documents into
    #[arg(long, env = "ARMDOC_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Directory containing system.md and user.md prompt templates
    #[arg(long, env = "ARMDOC_PROMPTS_DIR")]
    pub prompts_dir: Option<PathBuf>,
}

impl Cli {
    pub fn settings(&self) -> RunSettings {
        RunSettings {
            output_dir: self.output_dir.clone(),
            prompts_dir: self.prompts_dir.clone(),
        }
    }

    pub async fn run(self) -> Result<ExitCode> {
        let settings = self.settings();
        let summary = document_groups(
            &AzCli::new(),
            |name| std::env::var(name).ok(),
            &settings,
            self.quiet,
        )
        .await?;

        if !self.quiet {
            eprintln!();
            write_summary(&mut std::io::stderr(), &summary)?;
        }

        Ok(match summary.outcome() {
            Outcome::Complete => ExitCode::SUCCESS,
            Outcome::Partial => ExitCode::from(EXIT_PARTIAL),
        })
    }
}

/// Resolve the provider and prompts, then document every group `source` lists.
///
/// Configuration and template errors are returned before `source` or the
/// completion provider is called.
pub async fn document_groups<S, F>(
    source: &S,
    lookup: F,
    settings: &RunSettings,
    quiet: bool,
) -> Result<RunSummary>
where
    S: ResourceGroupSource,
    F: Fn(&str) -> Option<String>,
{
    let provider = ProviderConfig::resolve(lookup).context("invalid provider configuration")?;
    debug!(?provider, "resolved provider");

    let prompts = PromptBuilder::resolve(settings.prompts_dir.as_deref())
        .context("failed to load prompt templates")?;
    match prompts.source() {
        PromptSource::BuiltIn => debug!("using built-in prompt templates"),
        PromptSource::Directory(dir) => info!(dir = %dir.display(), "using prompt templates"),
    }

    let completion =
        CompletionClient::from_config(&provider).context("failed to create completion client")?;

    if !quiet {
        eprintln!(
            "{} {} {}",
            "Documenting resource groups with".bold(),
            provider.display_name().cyan(),
            format!("(model: {})", provider.model()).dimmed()
        );
    }

    Pipeline {
        source,
        completion: &completion,
        prompts: &prompts,
        output_dir: &settings.output_dir,
        quiet,
    }
    .run()
    .await
}
