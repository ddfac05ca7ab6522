use crate::error::{NotesError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use figment::{Figment, providers::{Format, Toml, Env}};
use dirs::config_dir;
use std::fs;

/// File name of the per-repository configuration, looked up at the root
pub const REPO_CONFIG_FILE: &str = ".notesync.toml";

/// Prefix for environment overrides; nested keys use `__`
pub const ENV_PREFIX: &str = "NOTESYNC_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Repository root holding the notes directory and the template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Notes directory, relative to the root
    #[serde(default = "default_notes_dir")]
    pub notes_dir: PathBuf,

    /// Note template, relative to the root
    #[serde(default = "default_template")]
    pub template: PathBuf,

    /// Defaults applied by `new-note`
    #[serde(default)]
    pub note: NoteConfig,

    /// Git behaviour for `sync`
    #[serde(default)]
    pub git: GitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteConfig {
    #[serde(default = "default_tags")]
    pub default_tags: String,

    #[serde(default = "default_category")]
    pub default_category: String,

    #[serde(default = "default_summary")]
    pub default_summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Remote that `sync` pushes to
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Whether `sync` pushes after committing
    #[serde(default = "default_true")]
    pub push: bool,

    /// pre-commit hook ids exported as `SKIP` while committing
    #[serde(default = "default_skip_hooks")]
    pub skip_hooks: Vec<String>,
}

fn default_notes_dir() -> PathBuf {
    PathBuf::from("notes")
}

fn default_template() -> PathBuf {
    PathBuf::from("templates").join("note_template.md")
}

fn default_tags() -> String {
    "general".to_string()
}

fn default_category() -> String {
    "default".to_string()
}

fn default_summary() -> String {
    "Add summary here".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_true() -> bool {
    true
}

fn default_skip_hooks() -> Vec<String> {
    ["ruff", "ruff-format", "trailing-whitespace", "end-of-file-fixer"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            notes_dir: default_notes_dir(),
            template: default_template(),
            note: NoteConfig::default(),
            git: GitConfig::default(),
        }
    }
}

impl Default for NoteConfig {
    fn default() -> Self {
        Self {
            default_tags: default_tags(),
            default_category: default_category(),
            default_summary: default_summary(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            push: true,
            skip_hooks: default_skip_hooks(),
        }
    }
}

impl Config {
    /// Load configuration from the user file, an optional repository file and
    /// `NOTESYNC_` environment variables, later sources winning
    pub fn load(user_path: Option<&Path>, repo_root: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(path) = user_path {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(root) = repo_root {
            figment = figment.merge(Toml::file(root.join(REPO_CONFIG_FILE)));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| {
                NotesError::ConfigError {
                    message: format!("Failed to load configuration: {}", e),
                }
                .into()
            })
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        let config = Config::default();
        let skip_hooks = config
            .git
            .skip_hooks
            .iter()
            .map(|h| format!("\"{}\"", h))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"# Notesync Configuration
# Place this in the user config directory or as .notesync.toml at the repository root.
# Every value can be overridden with NOTESYNC_ environment variables
# (nested keys use a double underscore, e.g. NOTESYNC_GIT__REMOTE).

# Repository root (defaults to the enclosing git work tree)
# root = "/path/to/notes-repo"

# Notes directory, relative to the root
notes_dir = "{}"

# Note template, relative to the root
template = "{}"

[note]
default_tags = "{}"
default_category = "{}"
default_summary = "{}"

[git]
# Remote used by sync
remote = "{}"

# Push after committing (sync --no-push overrides)
push = {}

# pre-commit hooks skipped while committing notes
skip_hooks = [{}]
"#,
            config.notes_dir.display(),
            config.template.display(),
            config.note.default_tags,
            config.note.default_category,
            config.note.default_summary,
            config.git.remote,
            config.git.push,
            skip_hooks,
        )
    }
}

pub struct ConfigManager {
    pub config: Config,
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Load the user configuration, layering the repository file under `repo_root` when given
    pub fn new(repo_root: Option<&Path>) -> Result<Self> {
        let config_path = get_config_path()?;
        let config = Config::load(Some(&config_path), repo_root)?;
        Ok(Self { config, config_path })
    }

    /// Get the current configuration
    pub fn get(&self) -> &Config {
        &self.config
    }

    /// Get the path to the user configuration file
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Check if the user configuration file exists
    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }

    /// Write the default configuration to the user configuration file
    pub fn create_default_config(&self) -> Result<()> {
        save_config(&self.config_path, &Config::default())
    }
}

fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let toml_content = toml::to_string_pretty(config)
        .map_err(|e| NotesError::ConfigError {
            message: format!("Failed to serialize configuration: {}", e),
        })?;

    fs::write(path, toml_content)
        .map_err(|e| NotesError::ConfigError {
            message: format!("Failed to write config file: {}", e),
        })?;

    Ok(())
}

/// Get the path to the user configuration file
fn get_config_path() -> Result<PathBuf> {
    let config_dir = config_dir()
        .ok_or_else(|| NotesError::ConfigError {
            message: "Could not determine config directory".to_string(),
        })?;

    Ok(config_dir.join("notesync").join("config.toml"))
}
