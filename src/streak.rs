//! Streak calculation over a [`CompletionLog`].
//!
//! A streak is a run of consecutive calendar days present in the log. The
//! current streak stays alive through today as long as yesterday was done:
//! an unfinished today never resets it, but a missed yesterday does.

use crate::completion_log::CompletionLog;
use crate::day_key::{DayKey, days_between};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streak {
    pub current: u32,
    pub longest: u32,
}

pub fn streaks(log: &CompletionLog, today: DayKey) -> Streak {
    let current = current_streak(log, today);
    Streak {
        current,
        longest: longest_streak(log, current),
    }
}

pub fn current_streak(log: &CompletionLog, today: DayKey) -> u32 {
    let start = if log.contains(today) {
        Some(today)
    } else {
        today.pred().filter(|yesterday| log.contains(*yesterday))
    };

    let Some(mut day) = start else {
        return 0;
    };

    let mut streak = 1;
    while let Some(prev) = day.pred() {
        if !log.contains(prev) {
            break;
        }
        streak += 1;
        day = prev;
    }
    streak
}

/// Longest run in the log, never less than `current`.
pub fn longest_streak(log: &CompletionLog, current: u32) -> u32 {
    let mut days = log.iter();
    let Some(mut prev) = days.next() else {
        return current;
    };

    let mut best = 0;
    let mut run = 1;
    for day in days {
        if days_between(prev, day) == 1 {
            run += 1;
        } else {
            best = best.max(run);
            run = 1;
        }
        prev = day;
    }
    best.max(run).max(current)
}

/// Dashboard badge for a current streak.
pub fn streak_badge(current: u32) -> &'static str {
    match current {
        0..=2 => "😞",
        3..=6 => "😊",
        _ => "🔥",
    }
}
