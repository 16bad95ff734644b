#![forbid(unsafe_code)]

pub mod progress_store;
pub mod repository;
pub mod sqlite;

pub use progress_store::{CorruptProgressError, PROGRESS_KEY, ProgressStore};
pub use repository::{InMemoryRepository, ProgressRepository, Storage, StorageError};
