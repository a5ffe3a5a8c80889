//! Prompt templates for document generation
//!
//! Two MiniJinja templates drive every completion request: `system.md` (the
//! system message) and `user.md` (the user message). The user template must
//! contain the `{{ arm_template }}` placeholder exactly once; both templates may
//! also use `{{ resource_group }}`.
//!
//! Templates are looked up in this order:
//! 1. an explicit directory (`--prompts-dir` / `ARMDOC_PROMPTS_DIR`)
//! 2. `.armdoc/prompts/` relative to the working directory
//! 3. `<config_dir>/armdoc/prompts/`
//! 4. the defaults compiled into the binary

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use minijinja::{Environment, context};
use regex::Regex;
use thiserror::Error;

/// System message template filename
pub const SYSTEM_FILENAME: &str = "system.md";

/// User message template filename
pub const USER_FILENAME: &str = "user.md";

/// Name of the variable that receives the exported template text
pub const PLACEHOLDER: &str = "arm_template";

const DEFAULT_SYSTEM: &str = include_str!("../prompts/system.md");
const DEFAULT_USER: &str = include_str!("../prompts/user.md");

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{-?\s*arm_template\s*-?\}\}").expect("valid regex"));

/// Stands in for the exported template when checking how often it is rendered
const RENDER_MARKER: &str = "@@armdoc:arm_template@@";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read prompt template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("prompt template '{name}' has no {{{{ arm_template }}}} placeholder")]
    MissingPlaceholder { name: String },

    #[error(
        "prompt template '{name}' uses the {{{{ arm_template }}}} placeholder {count} times (expected once)"
    )]
    DuplicatePlaceholder { name: String, count: usize },

    #[error("invalid prompt template: {0}")]
    Syntax(#[source] minijinja::Error),

    #[error("failed to render prompt: {0}")]
    Render(#[source] minijinja::Error),
}

/// The two messages sent for one resource group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system_message: String,
    pub user_message: String,
}

/// Where the loaded templates came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    BuiltIn,
    Directory(PathBuf),
}

/// Validated prompt templates, ready to render one [`PromptPair`] per group.
#[derive(Debug)]
pub struct PromptBuilder {
    env: Environment<'static>,
    system: String,
    user: String,
    source: PromptSource,
}

impl PromptBuilder {
    /// Build from template sources, validating syntax and the placeholder.
    pub fn new(
        system: impl Into<String>,
        user: impl Into<String>,
        source: PromptSource,
    ) -> Result<Self, TemplateError> {
        let system = system.into();
        let user = user.into();

        check_placeholder_count(PLACEHOLDER_RE.find_iter(&user).count())?;

        {
            let checker = Environment::new();
            checker
                .template_from_str(&system)
                .map_err(TemplateError::Syntax)?;
            checker
                .template_from_str(&user)
                .map_err(TemplateError::Syntax)?;
        }

        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);

        // The text check misses placeholders inside comments, raw blocks or loops.
        let rendered = env
            .render_str(
                &user,
                context! {
                    resource_group => "resource-group",
                    arm_template => RENDER_MARKER,
                },
            )
            .map_err(TemplateError::Render)?;
        check_placeholder_count(rendered.matches(RENDER_MARKER).count())?;

        Ok(Self {
            env,
            system,
            user,
            source,
        })
    }

    /// The templates compiled into the binary.
    pub fn built_in() -> Result<Self, TemplateError> {
        Self::new(DEFAULT_SYSTEM, DEFAULT_USER, PromptSource::BuiltIn)
    }

    /// Load `system.md` and `user.md` from a directory.
    pub fn load_dir(dir: &Path) -> Result<Self, TemplateError> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|source| TemplateError::Read { path, source })
        };
        let system = read(SYSTEM_FILENAME)?;
        let user = read(USER_FILENAME)?;
        Self::new(system, user, PromptSource::Directory(dir.to_path_buf()))
    }

    /// Resolve templates using the standard lookup order.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, TemplateError> {
        if let Some(dir) = explicit {
            return Self::load_dir(dir);
        }
        if let Some(dir) = project_prompts_dir().filter(|d| d.is_dir()) {
            return Self::load_dir(&dir);
        }
        if let Some(dir) = user_prompts_dir().filter(|d| d.is_dir()) {
            return Self::load_dir(&dir);
        }
        Self::built_in()
    }

    pub fn source(&self) -> &PromptSource {
        &self.source
    }

    /// Render the prompt pair for one resource group.
    ///
    /// The exported template text is inserted verbatim.
    pub fn build(
        &self,
        resource_group: &str,
        arm_template: &str,
    ) -> Result<PromptPair, TemplateError> {
        let ctx = context! {
            resource_group => resource_group,
            arm_template => arm_template,
        };

        let system_message = self
            .env
            .render_str(&self.system, &ctx)
            .map_err(TemplateError::Render)?;
        let user_message = self
            .env
            .render_str(&self.user, &ctx)
            .map_err(TemplateError::Render)?;

        Ok(PromptPair {
            system_message,
            user_message,
        })
    }
}

fn check_placeholder_count(count: usize) -> Result<(), TemplateError> {
    match count {
        0 => Err(TemplateError::MissingPlaceholder {
            name: USER_FILENAME.to_string(),
        }),
        1 => Ok(()),
        _ => Err(TemplateError::DuplicatePlaceholder {
            name: USER_FILENAME.to_string(),
            count,
        }),
    }
}

/// Project-level prompts directory: `.armdoc/prompts/` relative to cwd
pub fn project_prompts_dir() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|d| d.join(".armdoc").join("prompts"))
}

/// User-level prompts directory: `<config_dir>/armdoc/prompts/`
pub fn user_prompts_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("armdoc").join("prompts"))
}
