//! Habit and journal tracking: completion logs, streaks and statistics,
//! persisted to a local encrypted store.

pub mod auth;
pub mod calendar;
pub mod clock;
pub mod completion_log;
pub mod config;
pub mod day_key;
pub mod debounce;
pub mod encryption;
pub mod error;
pub mod goal;
pub mod habit;
pub mod journal;
pub mod preferences;
pub mod ranking;
pub mod stats;
pub mod storage;
pub mod streak;
pub mod tracker;

pub use clock::{Clock, FixedClock, SystemClock};
pub use completion_log::CompletionLog;
pub use config::AppConfig;
pub use day_key::{DayKey, days_between};
pub use error::TrackerError;
pub use goal::{Goal, GoalRepository, NewGoal};
pub use habit::{Habit, HabitCategory, HabitRepository, NewHabit};
pub use journal::{JournalEntry, JournalRepository, Mood};
pub use stats::{HabitStats, JournalStats};
pub use storage::{EncryptedFileStore, MemoryStore, Store};
pub use streak::Streak;
pub use tracker::Tracker;
