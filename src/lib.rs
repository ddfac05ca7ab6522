//! Notesync: a small personal note helper
//!
//! Creates dated markdown notes from a template and syncs them through git,
//! refreshing each changed note's "Last updated" line before committing only
//! the notes directory.

pub mod config;
pub mod error;
pub mod git;
pub mod note;
pub mod sync;
pub mod workspace;

pub use error::{NotesError, Result};
