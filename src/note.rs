use crate::error::{NotesError, Result};
use crate::workspace::{self, Workspace};
use chrono::{Datelike, NaiveDateTime};
use log::{debug, info};
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Slug used when a title has no word characters at all
pub const UNTITLED_SLUG: &str = "untitled-note";

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Template written by `notes init`
pub const DEFAULT_TEMPLATE: &str = r#"---
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

---

## Notes
- Point 1
- Point 2

---

## References
- [Link](#)

---

## Reflections
Write your reflections.
"#;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid slug regex"));
static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("valid separator regex"));

/// Everything needed to render one note
#[derive(Debug, Clone)]
pub struct NoteRequest {
    pub title: String,
    pub tags: String,
    pub category: String,
    pub summary: String,
}

impl NoteRequest {
    /// A request carrying the configured defaults for the optional fields
    pub fn with_defaults(title: impl Into<String>, defaults: &crate::config::NoteConfig) -> Self {
        Self {
            title: title.into(),
            tags: defaults.default_tags.clone(),
            category: defaults.default_category.clone(),
            summary: defaults.default_summary.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(NotesError::InvalidInput {
                message: "note title must not be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Lower-case `text`, drop anything that is not a word character, whitespace
/// or hyphen, and join the remaining words with single hyphens
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let joined = SEPARATOR_RUNS.replace_all(&stripped, "-");
    joined.trim_matches('-').to_string()
}

/// `<date>-<slug>.md` for a note created at `timestamp`
pub fn note_filename(timestamp: &NaiveDateTime, title: &str) -> String {
    let slug = match slugify(title) {
        s if s.is_empty() => UNTITLED_SLUG.to_string(),
        s => s,
    };
    format!("{}-{}.md", timestamp.format(DATE_FORMAT), slug)
}

/// Fill the template placeholders
pub fn render(template: &str, request: &NoteRequest, timestamp: &NaiveDateTime) -> String {
    let date = timestamp.format(DATE_FORMAT).to_string();
    let time = timestamp.format(TIME_FORMAT).to_string();

    template
        .replace("{{TITLE}}", &request.title)
        .replace("{{DATE}}", &date)
        .replace("{{TIME}}", &time)
        .replace("{{TAGS}}", &request.tags)
        .replace("{{SHORT_DESCRIPTION}}", &request.summary)
        .replace("{{CATEGORY}}", &request.category)
}

/// Create a note under `notes/<year>/` and return its path.
///
/// The file is created exclusively: an existing note at the same path is
/// reported as `NoteAlreadyExists` and left untouched.
pub fn create_note(
    ws: &Workspace,
    request: &NoteRequest,
    timestamp: &NaiveDateTime,
) -> Result<PathBuf> {
    request.validate()?;

    let template_path = ws.template_path();
    if !template_path.is_file() {
        return Err(NotesError::TemplateNotFound {
            path: template_path.display().to_string(),
        }
        .into());
    }
    let template = workspace::read_file_utf8(template_path)?;
    let content = render(&template, request, timestamp);

    let year_dir = ws.year_dir(timestamp.year());
    fs::create_dir_all(&year_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create directory {}: {}", year_dir.display(), e))?;

    let note_path = year_dir.join(note_filename(timestamp, &request.title));
    debug!("Writing note to {}", note_path.display());
    workspace::create_new_utf8(&note_path, &content)?;

    info!("Created note {}", note_path.display());
    Ok(note_path)
}

/// Write the default template unless one already exists; returns whether it was written
pub fn init_template(ws: &Workspace) -> Result<bool> {
    let template_path = ws.template_path();
    if template_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = template_path.parent() {
        fs::create_dir_all(parent)?;
    }
    workspace::create_new_utf8(template_path, DEFAULT_TEMPLATE)?;
    fs::create_dir_all(ws.notes_path())?;
    Ok(true)
}
