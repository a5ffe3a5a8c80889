//! Markdown documents for documented resource groups
//!
//! Each resource group gets its own directory under the output directory:
//!
//! ```text
//! arm_templates/
//!   rg-prod/
//!     template.json   # raw `az group export` output
//!     summary.md      # front matter + generated summary
//! ```
//!
//! Paths are a pure function of the group name, so a re-run overwrites the same
//! files instead of creating new ones.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Generated summary filename within a group directory
pub const SUMMARY_FILENAME: &str = "summary.md";

/// Exported template filename within a group directory
pub const TEMPLATE_FILENAME: &str = "template.json";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to render front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
}

/// Collect the tags of every resource in an exported ARM template.
///
/// Later resources overwrite earlier values for the same key. Non-string values
/// keep their JSON representation.
pub fn extract_tags(template: &Value) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();

    let Some(resources) = template.get("resources").and_then(Value::as_array) else {
        return tags;
    };

    for resource in resources {
        let Some(resource_tags) = resource.get("tags").and_then(Value::as_object) else {
            continue;
        };
        for (key, value) in resource_tags {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            tags.insert(key.clone(), value);
        }
    }

    tags
}

/// Directory name for a resource group.
///
/// Characters that are not safe in a single path component are replaced with `_`.
pub fn group_dir_name(resource_group: &str) -> String {
    let name: String = resource_group
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match name.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => name,
    }
}

/// Path of the directory holding one group's files.
pub fn group_dir(output_dir: &Path, resource_group: &str) -> PathBuf {
    output_dir.join(group_dir_name(resource_group))
}

/// Path of the summary document for a group.
pub fn summary_path(output_dir: &Path, resource_group: &str) -> PathBuf {
    group_dir(output_dir, resource_group).join(SUMMARY_FILENAME)
}

/// Path of the saved template export for a group.
pub fn template_path(output_dir: &Path, resource_group: &str) -> PathBuf {
    group_dir(output_dir, resource_group).join(TEMPLATE_FILENAME)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FrontMatter<'a> {
    title: String,
    date: String,
    internal: bool,
    azure_tags: &'a BTreeMap<String, String>,
}

/// A generated Markdown document for one resource group.
#[derive(Debug, Clone)]
pub struct Document {
    pub resource_group: String,
    pub tags: BTreeMap<String, String>,
    pub summary: String,
    /// Date written into the front matter, `YYYY-MM-DD`
    pub date: String,
}

impl Document {
    /// Create a document dated today.
    pub fn new(
        resource_group: impl Into<String>,
        tags: BTreeMap<String, String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            resource_group: resource_group.into(),
            tags,
            summary: summary.into(),
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }

    /// Render the full Markdown file contents.
    pub fn render(&self) -> Result<String, DocumentError> {
        let front = FrontMatter {
            title: format!("Resource Group: {}", self.resource_group),
            date: self.date.clone(),
            internal: true,
            azure_tags: &self.tags,
        };
        let yaml = serde_yaml::to_string(&front)?;

        let mut out = String::new();
        out.push_str("---\n");
        out.push_str(&yaml);
        if !yaml.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("---\n\n");
        out.push_str(&format!("# Resource Group: {}\n\n", self.resource_group));
        out.push_str("**Summary**:\n\n");
        out.push_str(self.summary.trim_end());
        out.push('\n');
        Ok(out)
    }

    /// Write the document under `output_dir`, replacing any previous version.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf, DocumentError> {
        let contents = self.render()?;
        let path = summary_path(output_dir, &self.resource_group);
        write_file(&path, &contents)?;
        Ok(path)
    }
}

/// Save the raw template export next to where the summary will go.
pub fn save_template(
    output_dir: &Path,
    resource_group: &str,
    template_json: &str,
) -> Result<PathBuf, DocumentError> {
    let path = template_path(output_dir, resource_group);
    write_file(&path, template_json)?;
    Ok(path)
}

fn write_file(path: &Path, contents: &str) -> Result<(), DocumentError> {
    let io_err = |source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, contents).map_err(io_err)
}
