//! Resource group documentation pipeline
//!
//! Processes resource groups one at a time:
//! 1. Export the group's ARM template (saved as `template.json`)
//! 2. Render the prompt pair from the exported text
//! 3. Ask the completion provider for a Markdown summary
//! 4. Write `summary.md` with front matter
//!
//! A failure in any step skips that group and moves on to the next. Only a
//! failure to list the groups aborts the run.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use armdoc_client::ai::ChatCompletion;
use armdoc_client::az::ResourceGroupSource;
use armdoc_core::document::{self, Document};
use armdoc_core::prompt::PromptBuilder;
use colored::Colorize;
use tracing::{info, warn};

/// How far a resource group got before it finished or was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Exported,
    Prompted,
    Completed,
    Written,
}

// Displays the step that runs next, i.e. the one that failed for a skipped group.
impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Pending => "export",
            Stage::Exported => "prompt",
            Stage::Prompted => "completion",
            Stage::Completed => "write",
            Stage::Written => "done",
        };
        f.write_str(s)
    }
}

/// A resource group whose summary was written
#[derive(Debug, Clone)]
pub struct Documented {
    pub resource_group: String,
    pub path: PathBuf,
}

/// A resource group that was skipped, with the stage it reached
#[derive(Debug, Clone)]
pub struct Skipped {
    pub resource_group: String,
    pub stage: Stage,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every listed group was documented (or there were none)
    Complete,
    /// At least one group was skipped
    Partial,
}

/// Results of a whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub documented: Vec<Documented>,
    pub skipped: Vec<Skipped>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.documented.len() + self.skipped.len()
    }

    pub fn outcome(&self) -> Outcome {
        if self.skipped.is_empty() {
            Outcome::Complete
        } else {
            Outcome::Partial
        }
    }
}

/// Everything one run needs; shared read-only across groups.
pub struct Pipeline<'a, S, C> {
    pub source: &'a S,
    pub completion: &'a C,
    pub prompts: &'a PromptBuilder,
    pub output_dir: &'a Path,
    pub quiet: bool,
}

impl<S, C> Pipeline<'_, S, C>
where
    S: ResourceGroupSource,
    C: ChatCompletion,
{
    /// Document every resource group in the subscription.
    pub async fn run(&self) -> Result<RunSummary> {
        let groups = self
            .source
            .list_resource_groups()
            .await
            .context("failed to list resource groups")?;

        let mut summary = RunSummary::default();

        if groups.is_empty() {
            warn!("no resource groups found");
            return Ok(summary);
        }

        info!(count = groups.len(), "documenting resource groups");

        for (i, rg) in groups.iter().enumerate() {
            if !self.quiet {
                eprintln!(
                    "  {} {} {}",
                    "▸".dimmed(),
                    rg.cyan(),
                    format!("({}/{})", i + 1, groups.len()).dimmed()
                );
            }

            let mut stage = Stage::Pending;
            match self.process_group(rg, &mut stage).await {
                Ok(path) => {
                    info!(resource_group = %rg, path = %path.display(), "summary written");
                    summary.documented.push(Documented {
                        resource_group: rg.clone(),
                        path,
                    });
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    warn!(resource_group = %rg, %stage, error = %reason, "skipping resource group");
                    summary.skipped.push(Skipped {
                        resource_group: rg.clone(),
                        stage,
                        reason,
                    });
                }
            }
        }

        Ok(summary)
    }

    /// Take one group from `Pending` to `Written`, updating `stage` as it goes.
    async fn process_group(&self, rg: &str, stage: &mut Stage) -> Result<PathBuf> {
        let export = self
            .source
            .export_template(rg)
            .await
            .with_context(|| format!("failed to export template for '{rg}'"))?;
        document::save_template(self.output_dir, rg, &export.text)
            .with_context(|| format!("failed to save exported template for '{rg}'"))?;
        let tags = document::extract_tags(&export.json);
        *stage = Stage::Exported;

        let prompt = self.prompts.build(rg, &export.text)?;
        *stage = Stage::Prompted;

        let text = self
            .completion
            .complete(&prompt)
            .await
            .with_context(|| format!("completion failed for '{rg}'"))?;
        *stage = Stage::Completed;

        let path = Document::new(rg, tags, text)
            .write(self.output_dir)
            .with_context(|| format!("failed to write summary for '{rg}'"))?;
        *stage = Stage::Written;

        Ok(path)
    }
}
