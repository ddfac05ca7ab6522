use thiserror::Error;

pub type Result<T> = anyhow::Result<T>;

#[derive(Error, Debug)]
pub enum NotesError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Note already exists at {path}")]
    NoteAlreadyExists { path: String },

    #[error("Template not found at {path} (run `notes init` to create one)")]
    TemplateNotFound { path: String },

    #[error("Not in a git repository")]
    NotInGitRepository,

    #[error("git {command} failed: {stderr}")]
    GitCommandFailed { command: String, stderr: String },

    #[error("Invalid note path: {path}")]
    InvalidNotePath { path: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}
