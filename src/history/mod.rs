//! Activity history
//!
//! Observations of which activity happened when. This is the training set:
//! every retrain reads all of it.

pub mod sqlite;

pub use sqlite::HistoryStore;

use thiserror::Error;

/// Typed failures of the history store
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("activity label must not be empty")]
    EmptyLabel,
    #[error("observation {id} has an unreadable timestamp '{value}'")]
    BadTimestamp { id: i64, value: String },
}

/// Normalize a user-supplied activity label.
///
/// Trims whitespace and lowercases, so labels differing only by case or
/// padding ("Run", " run ") are the same activity class.
pub fn normalize_label(label: &str) -> Result<String, HistoryError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(HistoryError::EmptyLabel);
    }
    Ok(trimmed.to_lowercase())
}
