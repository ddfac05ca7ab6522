//! Timestamp reconciliation and the commit/push cycle behind `notes sync`.
//!
//! A run lists the markdown files under the notes directory that git reports
//! as changed, refreshes their "Last updated" metadata line, stages the notes
//! directory only, commits it and pushes unless told not to. Each git step is
//! independent: a failure stops the run and leaves earlier steps in place.

use crate::error::Result;
use crate::git::GitRepository;
use crate::note::{DATE_FORMAT, TIME_FORMAT};
use crate::workspace::{self, Workspace};
use anyhow::Context;
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use regex::{NoExpand, Regex};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static LAST_UPDATED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mR)^- \*\*Last updated:\*\* \d{4}-\d{2}-\d{2} \d{2}:\d{2}$")
        .expect("valid last-updated regex")
});
static FRONT_MATTER_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^title:\s*"(.+)""#).expect("valid title regex"));

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Commit message; generated from the changed notes when absent
    pub message: Option<String>,
    pub push: bool,
    pub remote: String,
    /// pre-commit hook ids exported as `SKIP` for the commit
    pub skip_hooks: Vec<String>,
}

/// A note that git reports as changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedNote {
    pub path: PathBuf,
    /// Path relative to the repository root
    pub relative: PathBuf,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No note changed and nothing was waiting to be pushed
    NothingToSync,
    /// No note changed, but earlier commits were pushed
    PushedPending { commits: usize },
    /// Notes were listed as changed but staging produced no difference
    NothingStaged { notes: usize },
    Committed {
        notes: usize,
        timestamps_updated: usize,
        message: String,
        pushed: bool,
    },
}

/// Replace the first "Last updated" line with `timestamp`; `None` when the
/// content has no such line
pub fn refresh_last_updated(content: &str, timestamp: &NaiveDateTime) -> Option<String> {
    if !LAST_UPDATED_LINE.is_match(content) {
        return None;
    }

    let line = format!(
        "- **Last updated:** {} {}",
        timestamp.format(DATE_FORMAT),
        timestamp.format(TIME_FORMAT)
    );
    Some(LAST_UPDATED_LINE.replacen(content, 1, NoExpand(&line)).into_owned())
}

/// Rewrite the note's "Last updated" line in place; returns whether the file was changed
pub fn update_timestamp_in_note<P: AsRef<Path>>(
    path: P,
    timestamp: &NaiveDateTime,
) -> Result<bool> {
    let path = path.as_ref();
    let content = workspace::read_file_utf8(path)?;

    match refresh_last_updated(&content, timestamp) {
        Some(updated) => {
            workspace::write_file_utf8(path, &updated)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Commit message summarising the changed notes
pub fn commit_message(notes: &[ChangedNote], timestamp: &NaiveDateTime) -> String {
    let stamp = format!("{} {}", timestamp.format(DATE_FORMAT), timestamp.format(TIME_FORMAT));

    match notes {
        [] => "Sync notes".to_string(),
        [note] => match note_title(&note.path) {
            Some(title) => format!("Update note: {}", title),
            None => format!("Update note - {}", stamp),
        },
        _ => format!("Sync {} notes - {}", notes.len(), stamp),
    }
}

fn note_title(path: &Path) -> Option<String> {
    let content = workspace::read_file_utf8(path).ok()?;
    FRONT_MATTER_TITLE
        .captures(&content)
        .map(|caps| caps[1].to_string())
}

pub struct SyncEngine<'a> {
    repo: &'a GitRepository,
    ws: &'a Workspace,
}

impl<'a> SyncEngine<'a> {
    /// `ws` must be rooted at the repository's work tree (see `Workspace::anchored_at`)
    pub fn new(repo: &'a GitRepository, ws: &'a Workspace) -> Self {
        Self { repo, ws }
    }

    /// Markdown files under the notes directory that are modified, staged,
    /// deleted, renamed or untracked
    pub fn changed_notes(&self) -> Result<Vec<ChangedNote>> {
        let mut notes: Vec<ChangedNote> = Vec::new();

        for entry in self.repo.status(self.ws.notes_dir())? {
            if !self.ws.is_note_path(&entry.path) {
                debug!("Skipping non-note path {}", entry.path.display());
                continue;
            }
            if notes.iter().any(|n| n.relative == entry.path) {
                continue;
            }

            let path = self.ws.note_abs_path(&entry.path)?;
            let deleted = entry.is_deleted() || !path.exists();
            notes.push(ChangedNote {
                path,
                relative: entry.path,
                deleted,
            });
        }

        Ok(notes)
    }

    /// Refresh timestamps in every changed note that still exists; failures
    /// are logged and skipped
    pub fn update_timestamps(&self, notes: &[ChangedNote], timestamp: &NaiveDateTime) -> usize {
        notes
            .iter()
            .filter(|note| !note.deleted)
            .filter(|note| match update_timestamp_in_note(&note.path, timestamp) {
                Ok(updated) => updated,
                Err(e) => {
                    warn!("Could not update timestamp in {}: {:#}", note.path.display(), e);
                    false
                }
            })
            .count()
    }

    pub fn run(&self, options: &SyncOptions, now: &NaiveDateTime) -> Result<SyncOutcome> {
        println!("Checking for modified notes...");
        let notes = self.changed_notes()?;

        if notes.is_empty() {
            return self.push_pending(options);
        }
        println!("Found {} modified note(s)", notes.len());

        println!("Updating timestamps...");
        let timestamps_updated = self.update_timestamps(&notes, now);
        if timestamps_updated > 0 {
            println!("Updated timestamps in {} note(s)", timestamps_updated);
        }

        println!("Staging changes...");
        self.repo.add_all(self.ws.notes_dir())?;

        let staged = self.repo.staged_paths(self.ws.notes_dir())?;
        if staged.is_empty() {
            println!("No changes to commit");
            return Ok(SyncOutcome::NothingStaged { notes: notes.len() });
        }
        debug!("Staged {} path(s)", staged.len());

        let message = options
            .message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| commit_message(&notes, now));

        println!("Committing: {}", message);
        let skip = options.skip_hooks.join(",");
        let envs: Vec<(&str, &str)> = if skip.is_empty() {
            Vec::new()
        } else {
            vec![("SKIP", skip.as_str())]
        };
        self.repo.commit(&message, self.ws.notes_dir(), &envs)?;
        info!("Committed {} note(s)", notes.len());

        if options.push {
            println!("Pushing to remote...");
            self.push(options)?;
        }

        Ok(SyncOutcome::Committed {
            notes: notes.len(),
            timestamps_updated,
            message,
            pushed: options.push,
        })
    }

    /// Push commits left behind by an earlier run whose push failed
    fn push_pending(&self, options: &SyncOptions) -> Result<SyncOutcome> {
        if !options.push {
            return Ok(SyncOutcome::NothingToSync);
        }

        let commits = match self.repo.upstream()? {
            Some(upstream) => self.repo.unpushed_commit_count(&upstream)?,
            // A branch whose first push failed has no upstream yet
            None if self.repo.remote_exists(&options.remote)? && self.repo.has_commits()? => {
                self.repo.commits_missing_from_remote(&options.remote)?
            }
            None => {
                debug!("No upstream and no usable remote '{}'; nothing pending", options.remote);
                return Ok(SyncOutcome::NothingToSync);
            }
        };
        if commits == 0 {
            return Ok(SyncOutcome::NothingToSync);
        }

        println!("No modified notes, but found {} unpushed commit(s)", commits);
        println!("Pushing to remote...");
        self.push(options)?;
        Ok(SyncOutcome::PushedPending { commits })
    }

    fn push(&self, options: &SyncOptions) -> Result<()> {
        let set_upstream = self.repo.upstream()?.is_none();
        self.repo
            .push(&options.remote, set_upstream)
            .context("Push failed. Run sync again to retry pushing")
    }
}
