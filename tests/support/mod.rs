// Shared fixtures: scratch repositories with a bare remote
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

pub const TEMPLATE: &str = r#"---
title: "{{TITLE}}"
date: {{DATE}}
tags: [{{TAGS}}]
summary: "{{SHORT_DESCRIPTION}}"
---

## Metadata
- **Created:** {{DATE}} {{TIME}}
- **Last updated:** {{DATE}} {{TIME}}
- **Status:** Draft
- **Category:** {{CATEGORY}}

---

## Context
Add context here.
"#;

pub struct TestRepo {
    pub dir: TempDir,
    pub remote: TempDir,
}

impl TestRepo {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn remote_path(&self) -> &Path {
        self.remote.path()
    }

    pub fn git(&self, args: &[&str]) -> String {
        git(self.path(), args)
    }

    /// HEAD of `main` on the bare remote
    pub fn remote_head(&self) -> String {
        git(self.remote_path(), &["rev-parse", "main"])
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }

    pub fn commit_count(&self) -> usize {
        self.git(&["rev-list", "--count", "HEAD"]).parse().unwrap()
    }

    /// Files touched by the last commit
    pub fn last_commit_files(&self) -> Vec<String> {
        self.git(&["show", "--name-only", "--pretty=format:", "HEAD"])
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn last_commit_message(&self) -> String {
        self.git(&["log", "-1", "--pretty=%s"])
    }

    /// Write a note with Created/Last updated lines at `notes/<year>/<filename>`
    pub fn create_note(&self, year: &str, filename: &str, title: &str) -> PathBuf {
        let notes_dir = self.path().join("notes").join(year);
        fs::create_dir_all(&notes_dir).unwrap();

        let note_path = notes_dir.join(filename);
        fs::write(
            &note_path,
            format!(
                "---\ntitle: \"{}\"\n---\n\n## Metadata\n- **Created:** 2025-01-13 10:00\n- **Last updated:** 2025-01-13 10:00\n\nContent here.\n",
                title
            ),
        )
        .unwrap();
        note_path
    }

    pub fn write_template(&self) -> PathBuf {
        let template_dir = self.path().join("templates");
        fs::create_dir_all(&template_dir).unwrap();
        let path = template_dir.join("note_template.md");
        fs::write(&path, TEMPLATE).unwrap();
        path
    }
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A repository on `main` with one pushed commit and `origin` tracking a bare remote
pub fn setup_repo() -> TestRepo {
    let dir = tempdir().unwrap();
    let remote = tempdir().unwrap();

    git(remote.path(), &["init", "--bare", "--initial-branch=main"]);

    let repo_path = dir.path();
    git(repo_path, &["init", "--initial-branch=main"]);
    git(repo_path, &["config", "user.email", "test@example.com"]);
    git(repo_path, &["config", "user.name", "Test User"]);
    git(repo_path, &["config", "commit.gpgsign", "false"]);

    fs::write(repo_path.join("README.md"), "# Test").unwrap();
    git(repo_path, &["add", "README.md"]);
    git(repo_path, &["commit", "-m", "Initial commit"]);

    let remote_url = remote.path().to_string_lossy().to_string();
    git(repo_path, &["remote", "add", "origin", &remote_url]);
    git(repo_path, &["push", "-u", "origin", "main"]);

    TestRepo { dir, remote }
}
