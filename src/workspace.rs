//! Path resolution and UTF-8 file helpers shared by the commands.

use crate::config::Config;
use crate::error::{NotesError, Result};
use anyhow::Context;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

/// Resolved locations of the notes repository
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    notes_dir: PathBuf,
    template_path: PathBuf,
}

impl Workspace {
    /// Build a workspace rooted at `root` using the configured layout
    pub fn new<P: AsRef<Path>>(root: P, config: &Config) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            notes_dir: config.notes_dir.clone(),
            template_path: root.join(&config.template),
            root,
        }
    }

    /// Resolve the root: explicit override, then config, then the enclosing
    /// git work tree, then the current directory
    pub fn resolve(root_override: Option<&Path>, config: &Config) -> Result<Self> {
        let root = match root_override.or(config.root.as_deref()) {
            Some(root) => root.to_path_buf(),
            None => {
                let cwd = std::env::current_dir()?;
                discover_root(&cwd).unwrap_or(cwd)
            }
        };
        Ok(Self::new(root, config))
    }

    /// The same layout re-rooted at `work_tree`, with the notes dir expressed
    /// relative to it. `self.root` must lie inside `work_tree`.
    pub fn anchored_at<P: AsRef<Path>>(&self, work_tree: P) -> Result<Self> {
        let work_tree = work_tree.as_ref();
        let canonical_tree = work_tree
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", work_tree.display()))?;
        let canonical_root = self
            .root
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", self.root.display()))?;

        let prefix = canonical_root
            .strip_prefix(&canonical_tree)
            .map_err(|_| NotesError::InvalidNotePath {
                path: self.root.display().to_string(),
            })?;

        Ok(Self {
            root: work_tree.to_path_buf(),
            notes_dir: prefix.join(&self.notes_dir),
            template_path: self.template_path.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Notes directory relative to the root, as used in git pathspecs
    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    /// Absolute notes directory
    pub fn notes_path(&self) -> PathBuf {
        self.root.join(&self.notes_dir)
    }

    /// Directory holding the notes of a given year
    pub fn year_dir(&self, year: i32) -> PathBuf {
        self.notes_path().join(year.to_string())
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// True when `relative` is a markdown file inside the notes directory
    pub fn is_note_path<P: AsRef<Path>>(&self, relative: P) -> bool {
        let relative = relative.as_ref();
        if self.notes_dir.as_os_str().is_empty() {
            return false;
        }

        relative.starts_with(&self.notes_dir)
            && !relative.components().any(|c| matches!(c, Component::ParentDir))
            && relative.extension().is_some_and(|ext| ext == "md")
    }

    /// Join a repository-relative note path onto the root, rejecting paths
    /// that escape the notes directory
    pub fn note_abs_path<P: AsRef<Path>>(&self, relative: P) -> Result<PathBuf> {
        let relative = relative.as_ref();
        if relative.is_absolute() || !self.is_note_path(relative) {
            return Err(NotesError::InvalidNotePath {
                path: relative.display().to_string(),
            }
            .into());
        }
        Ok(self.root.join(relative))
    }
}

/// Find the work tree root of the git repository containing `start`
pub fn discover_root(start: &Path) -> Option<PathBuf> {
    let repo = gix::discover(start).ok()?;
    repo.work_dir().map(Path::to_path_buf)
}

/// Read a file with UTF-8 encoding
pub fn read_file_utf8<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Write a file with UTF-8 encoding, replacing any existing content
pub fn write_file_utf8<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Create a new file and write `content`; fails if the file already exists
pub fn create_new_utf8<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(NotesError::NoteAlreadyExists {
                path: path.display().to_string(),
            }
            .into());
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to create {}", path.display())));
        }
    };

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
