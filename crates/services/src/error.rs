//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use lesson_core::model::{CatalogError, LessonId, SkillId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while fetching or parsing the content catalog.
///
/// Fatal to starting a game; never retried automatically.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogLoadError {
    #[error("failed to read catalog from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog is invalid: {0}")]
    Invalid(#[from] CatalogError),
}

/// Errors emitted by the session state machine and its persisting loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("`{intent}` is not allowed while {state}")]
    InvalidTransition {
        intent: &'static str,
        state: &'static str,
    },
    #[error("unknown skill: {0}")]
    UnknownSkill(SkillId),
    #[error("unknown lesson {lesson} in skill {skill}")]
    UnknownLesson { skill: SkillId, lesson: LessonId },
    #[error("`{0}` is not an option of the current exercise")]
    NotAnOption(String),
    #[error("no option selected")]
    NoSelection,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Catalog(#[from] CatalogLoadError),
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
