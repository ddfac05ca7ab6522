use crate::support::TEMPLATE;
use chrono::{NaiveDate, NaiveDateTime};
use notesync::config::{Config, NoteConfig};
use notesync::error::NotesError;
use notesync::note::{create_note, init_template, NoteRequest, DEFAULT_TEMPLATE};
use notesync::workspace::Workspace;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn jan_15() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(9, 30, 0).unwrap()
}

fn workspace_with_template(root: &Path) -> Workspace {
    let template_dir = root.join("templates");
    fs::create_dir_all(&template_dir).unwrap();
    fs::write(template_dir.join("note_template.md"), TEMPLATE).unwrap();
    Workspace::new(root, &Config::default())
}

fn request(title: &str) -> NoteRequest {
    NoteRequest::with_defaults(title, &NoteConfig::default())
}

#[test]
fn test_create_note_at_deterministic_path() {
    let temp_dir = tempdir().unwrap();
    let ws = workspace_with_template(temp_dir.path());

    let path = create_note(&ws, &request("Hello World"), &jan_15()).unwrap();

    assert_eq!(
        path,
        temp_dir.path().join("notes").join("2024").join("2024-01-15-hello-world.md")
    );
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("title: \"Hello World\""));
    assert!(content.contains("tags: [general]"));
    assert!(content.contains("- **Category:** default"));
    assert!(content.contains("- **Created:** 2024-01-15 09:30"));
    assert!(content.contains("- **Last updated:** 2024-01-15 09:30"));
}

#[test]
fn test_create_same_title_twice_fails_without_overwriting() {
    let temp_dir = tempdir().unwrap();
    let ws = workspace_with_template(temp_dir.path());

    let path = create_note(&ws, &request("Hello World"), &jan_15()).unwrap();
    fs::write(&path, "edited by hand").unwrap();

    let mut second = request("Hello World");
    second.summary = "different".to_string();
    let err = create_note(&ws, &second, &jan_15()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<NotesError>(),
        Some(NotesError::NoteAlreadyExists { .. })
    ));
    assert!(err.to_string().contains("already exists"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "edited by hand");
}

#[test]
fn test_custom_metadata_is_rendered() {
    let temp_dir = tempdir().unwrap();
    let ws = workspace_with_template(temp_dir.path());

    let req = NoteRequest {
        title: "Custom Note".to_string(),
        tags: "custom,test".to_string(),
        category: "testing".to_string(),
        summary: "Custom summary".to_string(),
    };
    let path = create_note(&ws, &req, &jan_15()).unwrap();
    let content = fs::read_to_string(path).unwrap();

    assert!(content.contains("tags: [custom,test]"));
    assert!(content.contains("- **Category:** testing"));
    assert!(content.contains("summary: \"Custom summary\""));
}

#[test]
fn test_missing_template_is_reported() {
    let temp_dir = tempdir().unwrap();
    let ws = Workspace::new(temp_dir.path(), &Config::default());

    let err = create_note(&ws, &request("Anything"), &jan_15()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<NotesError>(),
        Some(NotesError::TemplateNotFound { .. })
    ));
    assert!(!temp_dir.path().join("notes").exists());
}

#[test]
fn test_empty_title_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let ws = workspace_with_template(temp_dir.path());

    let err = create_note(&ws, &request(""), &jan_15()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<NotesError>(),
        Some(NotesError::InvalidInput { .. })
    ));
}

#[test]
fn test_punctuation_title_uses_untitled_slug() {
    let temp_dir = tempdir().unwrap();
    let ws = workspace_with_template(temp_dir.path());

    let path = create_note(&ws, &request("?!?"), &jan_15()).unwrap();
    assert!(path.ends_with("2024/2024-01-15-untitled-note.md"));
}

#[test]
fn test_existing_year_directory_is_reused() {
    let temp_dir = tempdir().unwrap();
    let ws = workspace_with_template(temp_dir.path());
    let year_dir = temp_dir.path().join("notes").join("2024");
    fs::create_dir_all(&year_dir).unwrap();
    fs::write(year_dir.join("keep.md"), "keep").unwrap();

    create_note(&ws, &request("Second"), &jan_15()).unwrap();

    assert_eq!(fs::read_dir(&year_dir).unwrap().count(), 2);
}

#[test]
fn test_init_template_writes_once() {
    let temp_dir = tempdir().unwrap();
    let ws = Workspace::new(temp_dir.path(), &Config::default());

    assert!(init_template(&ws).unwrap());
    assert_eq!(fs::read_to_string(ws.template_path()).unwrap(), DEFAULT_TEMPLATE);
    assert!(ws.notes_path().is_dir());

    fs::write(ws.template_path(), "custom").unwrap();
    assert!(!init_template(&ws).unwrap());
    assert_eq!(fs::read_to_string(ws.template_path()).unwrap(), "custom");
}
