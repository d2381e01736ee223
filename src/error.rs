use crate::day_key::DayKey;
use crate::storage::StorageError;

/// Failure of a habit or journal operation. The in-memory collections are
/// left exactly as they were whenever one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Invalid day key: {0:?} (expected YYYY-MM-DD)")]
    InvalidDayKey(String),

    #[error("Day {0} is in the future")]
    FutureDay(DayKey),

    #[error("Habit name cannot be empty")]
    EmptyName,

    #[error("A habit named {0:?} already exists")]
    DuplicateName(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
