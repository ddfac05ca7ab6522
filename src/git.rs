use crate::error::{NotesError, Result};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// One entry of `git status --porcelain`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Index (staged) status column
    pub index: char,
    /// Work tree status column
    pub worktree: char,
    /// Path relative to the repository root
    pub path: PathBuf,
}

impl StatusEntry {
    pub fn is_untracked(&self) -> bool {
        self.index == '?'
    }

    /// The file no longer exists in the work tree
    pub fn is_deleted(&self) -> bool {
        self.worktree == 'D' || (self.index == 'D' && self.worktree == ' ')
    }
}

pub struct GitRepository {
    repo_path: PathBuf,
}

impl GitRepository {
    /// Find the repository enclosing `path`
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = gix::discover(path.as_ref())
            .map_err(|_| NotesError::NotInGitRepository)?;

        let repo_path = repo.work_dir()
            .ok_or(NotesError::NotInGitRepository)?
            .to_path_buf();

        Ok(Self { repo_path })
    }

    /// Open the repository whose work tree is exactly `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo_path = path.as_ref().to_path_buf();
        let repo = gix::open(&repo_path)
            .map_err(|_| NotesError::NotInGitRepository)?;
        if repo.work_dir().is_none() {
            return Err(NotesError::NotInGitRepository.into());
        }

        Ok(Self { repo_path })
    }

    /// Get the repository root path
    pub fn root_path(&self) -> &Path {
        &self.repo_path
    }

    /// Run git and return its output regardless of exit status
    fn output(&self, args: &[&str], envs: &[(&str, &str)]) -> Result<Output> {
        debug!("git {}", args.join(" "));

        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.repo_path);
        for (key, value) in envs {
            cmd.env(key, value);
        }

        cmd.output().map_err(|e| {
            anyhow::anyhow!("Failed to run git {}: {}", args.first().unwrap_or(&""), e)
        })
    }

    /// Run git, mapping a non-zero exit to `GitCommandFailed` with the captured stderr
    fn run(&self, args: &[&str], envs: &[(&str, &str)]) -> Result<Output> {
        let output = self.output(args, envs)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stderr = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };
            return Err(NotesError::GitCommandFailed {
                command: args.first().unwrap_or(&"").to_string(),
                stderr,
            }
            .into());
        }

        Ok(output)
    }

    /// Status entries under `pathspec`, untracked files listed individually
    pub fn status<P: AsRef<Path>>(&self, pathspec: P) -> Result<Vec<StatusEntry>> {
        let pathspec = pathspec.as_ref().to_string_lossy().into_owned();
        let output = self.run(
            &["status", "--porcelain=v1", "-z", "--untracked-files=all", "--", pathspec.as_str()],
            &[],
        )?;

        Ok(parse_porcelain_z(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Stage every change (including deletions) under `pathspec`
    pub fn add_all<P: AsRef<Path>>(&self, pathspec: P) -> Result<()> {
        let pathspec = pathspec.as_ref().to_string_lossy().into_owned();
        self.run(&["add", "-A", "--", pathspec.as_str()], &[])?;
        Ok(())
    }

    /// Paths staged under `pathspec`
    pub fn staged_paths<P: AsRef<Path>>(&self, pathspec: P) -> Result<Vec<PathBuf>> {
        let pathspec = pathspec.as_ref().to_string_lossy().into_owned();
        let args: Vec<&str> = if self.has_commits()? {
            vec!["diff", "--cached", "--name-only", "-z", "--", pathspec.as_str()]
        } else {
            vec!["ls-files", "--cached", "-z", "--", pathspec.as_str()]
        };
        let output = self.run(&args, &[])?;

        Ok(String::from_utf8_lossy(&output.stdout)
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    /// Commit the staged content of `pathspec` only, leaving anything else in the index alone
    pub fn commit<P: AsRef<Path>>(
        &self,
        message: &str,
        pathspec: P,
        envs: &[(&str, &str)],
    ) -> Result<()> {
        let pathspec = pathspec.as_ref().to_string_lossy().into_owned();
        self.run(&["commit", "-m", message, "--", pathspec.as_str()], envs)?;
        Ok(())
    }

    /// Push the current branch to `remote`, optionally recording it as the upstream
    pub fn push(&self, remote: &str, set_upstream: bool) -> Result<()> {
        if set_upstream {
            self.run(&["push", "-u", remote, "HEAD"], &[])?;
        } else {
            self.run(&["push", remote, "HEAD"], &[])?;
        }
        Ok(())
    }

    /// Upstream of the current branch, if one is configured
    pub fn upstream(&self) -> Result<Option<String>> {
        let output = self.output(
            &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
            &[],
        )?;
        if !output.status.success() {
            return Ok(None);
        }

        let upstream = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!upstream.is_empty()).then_some(upstream))
    }

    /// Number of commits on HEAD that are not on `upstream`
    pub fn unpushed_commit_count(&self, upstream: &str) -> Result<usize> {
        let range = format!("{}..HEAD", upstream);
        let output = self.run(&["rev-list", "--count", range.as_str()], &[])?;

        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Unexpected rev-list output: {}", e))
    }

    /// Whether `remote` is configured
    pub fn remote_exists(&self, remote: &str) -> Result<bool> {
        let output = self.output(&["remote", "get-url", remote], &[])?;
        Ok(output.status.success())
    }

    /// Number of commits on HEAD not reachable from any of `remote`'s tracking branches
    pub fn commits_missing_from_remote(&self, remote: &str) -> Result<usize> {
        let remotes = format!("--remotes={}", remote);
        let output = self.run(&["rev-list", "--count", "HEAD", "--not", remotes.as_str()], &[])?;

        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Unexpected rev-list output: {}", e))
    }

    /// Whether HEAD points at a commit
    pub fn has_commits(&self) -> Result<bool> {
        let output = self.output(&["rev-parse", "--verify", "--quiet", "HEAD"], &[])?;
        Ok(output.status.success())
    }

    /// Get the current HEAD commit
    pub fn get_head_commit(&self) -> Result<String> {
        let output = self.run(&["rev-parse", "HEAD"], &[])?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Parse `git status --porcelain=v1 -z` output; renames report their new path
pub fn parse_porcelain_z(raw: &str) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    let mut fields = raw.split('\0').filter(|f| !f.is_empty());

    while let Some(field) = fields.next() {
        let mut chars = field.chars();
        let (Some(index), Some(worktree)) = (chars.next(), chars.next()) else {
            continue;
        };
        let Some(path) = field.get(3..) else {
            continue;
        };

        if matches!(index, 'R' | 'C') {
            // The source path follows as its own field
            fields.next();
        }

        entries.push(StatusEntry {
            index,
            worktree,
            path: PathBuf::from(path),
        });
    }

    entries
}
