//! Aggregates across all habits, as shown on the dashboard and profile.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::day_key::DayKey;
use crate::habit::Habit;
use crate::stats::count;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TodayProgress {
    pub completed: u32,
    pub total: u32,
    pub percentage: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverallSummary {
    pub average_completion_rate: u8,
    pub best_longest_streak: u32,
    pub total_completions: u32,
}

/// Highest completion rate; the first habit wins a tie.
pub fn best_habit<'a>(habits: &'a [Habit], now: &DateTime<FixedOffset>) -> Option<&'a Habit> {
    pick_by_rate(habits, now, |candidate, current| candidate > current)
}

/// Lowest completion rate; the first habit wins a tie.
pub fn weakest_habit<'a>(habits: &'a [Habit], now: &DateTime<FixedOffset>) -> Option<&'a Habit> {
    pick_by_rate(habits, now, |candidate, current| candidate < current)
}

fn pick_by_rate<'a>(
    habits: &'a [Habit],
    now: &DateTime<FixedOffset>,
    replaces: impl Fn(u8, u8) -> bool,
) -> Option<&'a Habit> {
    let mut picked: Option<(&Habit, u8)> = None;
    for habit in habits {
        let rate = habit.stats(now).completion_rate;
        match picked {
            Some((_, current)) if !replaces(rate, current) => {}
            _ => picked = Some((habit, rate)),
        }
    }
    picked.map(|(habit, _)| habit)
}

pub fn today_progress(habits: &[Habit], today: DayKey) -> TodayProgress {
    let total = count(habits.len());
    let completed = count(habits.iter().filter(|h| h.is_completed_on(today)).count());
    let percentage = if total == 0 {
        0
    } else {
        ((200 * u64::from(completed) + u64::from(total)) / (2 * u64::from(total))) as u8
    };
    TodayProgress {
        completed,
        total,
        percentage,
    }
}

pub fn total_streak(habits: &[Habit], now: &DateTime<FixedOffset>) -> u32 {
    habits.iter().map(|h| h.stats(now).current_streak).sum()
}

pub fn overall_summary(habits: &[Habit], now: &DateTime<FixedOffset>) -> OverallSummary {
    if habits.is_empty() {
        return OverallSummary::default();
    }

    let stats: Vec<_> = habits.iter().map(|h| h.stats(now)).collect();
    let n = stats.len() as u64;
    let rate_sum: u64 = stats.iter().map(|s| u64::from(s.completion_rate)).sum();
    OverallSummary {
        average_completion_rate: ((2 * rate_sum + n) / (2 * n)) as u8,
        best_longest_streak: stats.iter().map(|s| s.longest_streak).max().unwrap_or(0),
        total_completions: stats.iter().map(|s| s.total_completions).sum(),
    }
}
