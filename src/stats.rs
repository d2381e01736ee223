//! Derived statistics. Nothing here is stored: every figure is recomputed
//! from the full log on each read.

use serde::Serialize;

use crate::calendar::YearMonth;
use crate::completion_log::CompletionLog;
use crate::day_key::{DayKey, days_between};
use crate::journal::JournalEntry;
use crate::streak::streaks;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HabitStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Whole percent, 0 to 100.
    pub completion_rate: u8,
    pub total_completions: u32,
}

impl HabitStats {
    pub fn compute(log: &CompletionLog, created: DayKey, today: DayKey) -> Self {
        let streak = streaks(log, today);
        let total = count(log.len());
        Self {
            current_streak: streak.current,
            longest_streak: streak.longest,
            completion_rate: completion_rate(total, eligible_days(created, today)),
            total_completions: total,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JournalStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_entries: u32,
    pub this_month_entries: u32,
    pub avg_words_per_entry: u32,
}

impl JournalStats {
    pub fn compute(entries: &[JournalEntry], today: DayKey) -> Self {
        let days: CompletionLog = entries.iter().map(|e| e.date).collect();
        let streak = streaks(&days, today);
        Self {
            current_streak: streak.current,
            longest_streak: streak.longest,
            total_entries: count(entries.len()),
            this_month_entries: count_in_month(&days, YearMonth::of(today)),
            avg_words_per_entry: average_words(entries.iter().map(|e| e.content.as_str())),
        }
    }
}

/// Calendar days from `created` through `today`, both included. Never
/// below 1, so a habit created today (or "in the future" after a clock
/// change) still has one eligible day.
pub fn eligible_days(created: DayKey, today: DayKey) -> u32 {
    let span = days_between(created, today).saturating_add(1).max(1);
    u32::try_from(span).unwrap_or(u32::MAX)
}

/// `round(100 * total / eligible)`, halves rounded up, clamped to 100.
pub fn completion_rate(total: u32, eligible: u32) -> u8 {
    let eligible = u64::from(eligible.max(1));
    let rate = (200 * u64::from(total) + eligible) / (2 * eligible);
    rate.min(100) as u8
}

pub fn word_count(text: &str) -> u32 {
    count(text.split_whitespace().count())
}

/// Rounded mean word count; 0 when there are no texts.
pub fn average_words<'a>(texts: impl IntoIterator<Item = &'a str>) -> u32 {
    let (words, n) = texts
        .into_iter()
        .fold((0u64, 0u64), |(words, n), text| (words + u64::from(word_count(text)), n + 1));
    if n == 0 {
        return 0;
    }
    ((2 * words + n) / (2 * n)) as u32
}

pub fn count_in_month(log: &CompletionLog, month: YearMonth) -> u32 {
    count(log.iter().filter(|day| month.contains(*day)).count())
}

pub(crate) fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
