use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use uuid::Uuid;

use crate::calendar::YearMonth;
use crate::clock::Clock;
use crate::day_key::DayKey;
use crate::error::TrackerError;
use crate::stats::{JournalStats, word_count};
use crate::storage::{JOURNAL_SLOT, Store, load_slot, save_slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Okay,
    Low,
    Rough,
}

impl Mood {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Great => "Great",
            Self::Good => "Good",
            Self::Okay => "Okay",
            Self::Low => "Low",
            Self::Rough => "Rough",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Great => "😊",
            Self::Good => "🙂",
            Self::Okay => "😐",
            Self::Low => "😔",
            Self::Rough => "😢",
        }
    }
}

/// Which habits were done on the entry's day, frozen when the entry was
/// saved. Later edits to the habits do not reach it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitsSummary {
    pub completed: u32,
    pub total: u32,
    pub habits: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: Uuid,
    pub date: DayKey,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habits_summary: Option<HabitsSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn word_count(&self) -> u32 {
        word_count(&self.content)
    }
}

/// One day of a month view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayOverview {
    pub date: DayKey,
    pub has_entry: bool,
    pub word_count: u32,
    pub mood: Option<Mood>,
}

const PROMPTS: [&str; 15] = [
    "How do you feel today?",
    "What went well today?",
    "What challenged you today?",
    "What are you grateful for?",
    "What can you improve tomorrow?",
    "What's one thing you learned today?",
    "What made you smile today?",
    "What's on your mind right now?",
    "What are you looking forward to?",
    "How did you take care of yourself today?",
    "What would make tomorrow great?",
    "What's something you're proud of?",
    "Who made a positive impact on your day?",
    "What's a challenge you overcame recently?",
    "What's something you want to remember about today?",
];

/// Writing prompt of the day; rotates through the list by day of year.
pub fn prompt_for(day: DayKey) -> &'static str {
    PROMPTS[day.ordinal() as usize % PROMPTS.len()]
}

/// Journal entries, at most one per day.
pub struct JournalRepository {
    entries: Vec<JournalEntry>,
    store: Rc<dyn Store>,
    clock: Rc<dyn Clock>,
}

impl JournalRepository {
    pub fn load(store: Rc<dyn Store>, clock: Rc<dyn Clock>) -> Result<Self, TrackerError> {
        let loaded: Vec<JournalEntry> = load_slot(store.as_ref(), JOURNAL_SLOT)?.unwrap_or_default();

        // Older data may hold several entries for one day; the last one wins.
        let mut entries: Vec<JournalEntry> = Vec::with_capacity(loaded.len());
        for entry in loaded {
            match entries.iter_mut().find(|e| e.date == entry.date) {
                Some(existing) => {
                    log::warn!("Dropping duplicate journal entry for {}", entry.date);
                    *existing = entry;
                }
                None => entries.push(entry),
            }
        }
        log::debug!("Loaded {} journal entries", entries.len());
        Ok(Self { entries, store, clock })
    }

    pub fn save(&self) -> Result<(), TrackerError> {
        save_slot(self.store.as_ref(), JOURNAL_SLOT, &self.entries)?;
        Ok(())
    }

    fn commit(&mut self, entries: Vec<JournalEntry>) -> Result<(), TrackerError> {
        if let Err(e) = save_slot(self.store.as_ref(), JOURNAL_SLOT, &entries) {
            log::error!("Failed to save journal: {}", e);
            return Err(e.into());
        }
        self.entries = entries;
        Ok(())
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn entry(&self, day: DayKey) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| e.date == day)
    }

    pub fn today_entry(&self) -> Option<&JournalEntry> {
        self.entry(self.clock.today())
    }

    /// Creates the entry for `day` or updates it in place. A `None` mood or
    /// summary keeps whatever the entry already had.
    pub fn save_entry(
        &mut self,
        day: DayKey,
        content: impl Into<String>,
        mood: Option<Mood>,
        habits_summary: Option<HabitsSummary>,
    ) -> Result<JournalEntry, TrackerError> {
        let now = self.clock.now();
        if day.is_future(&now) {
            return Err(TrackerError::FutureDay(day));
        }
        let now = now.with_timezone(&Utc);
        let content = content.into();

        let mut entries = self.entries.clone();
        let entry = match entries.iter().position(|e| e.date == day) {
            Some(index) => {
                let entry = &mut entries[index];
                entry.content = content;
                entry.mood = mood.or(entry.mood);
                if habits_summary.is_some() {
                    entry.habits_summary = habits_summary;
                }
                entry.updated_at = now;
                entry.clone()
            }
            None => {
                let entry = JournalEntry {
                    id: Uuid::new_v4(),
                    date: day,
                    content,
                    mood,
                    habits_summary,
                    created_at: now,
                    updated_at: now,
                };
                entries.push(entry.clone());
                entry
            }
        };
        self.commit(entries)?;
        Ok(entry)
    }

    pub fn delete_entry(&mut self, day: DayKey) -> Result<bool, TrackerError> {
        if self.entry(day).is_none() {
            return Ok(false);
        }
        let entries = self.entries.iter().filter(|e| e.date != day).cloned().collect();
        self.commit(entries)?;
        Ok(true)
    }

    /// Sets the mood of an existing entry; no entry for `day` is a no-op.
    pub fn update_mood(&mut self, day: DayKey, mood: Mood) -> Result<bool, TrackerError> {
        let Some(index) = self.entries.iter().position(|e| e.date == day) else {
            return Ok(false);
        };
        let mut entries = self.entries.clone();
        entries[index].mood = Some(mood);
        entries[index].updated_at = self.clock.now().with_timezone(&Utc);
        self.commit(entries)?;
        Ok(true)
    }

    pub fn stats(&self) -> JournalStats {
        JournalStats::compute(&self.entries, self.clock.today())
    }

    pub fn month_entries(&self, month: YearMonth) -> Vec<DayOverview> {
        month
            .days()
            .map(|date| {
                let entry = self.entry(date);
                DayOverview {
                    date,
                    has_entry: entry.is_some(),
                    word_count: entry.map_or(0, JournalEntry::word_count),
                    mood: entry.and_then(|e| e.mood),
                }
            })
            .collect()
    }

    /// Moods over the last `days` days ending today, oldest first. Days
    /// without an entry or without a mood are skipped.
    pub fn mood_trend(&self, days: u32) -> Vec<(DayKey, Mood)> {
        let today = self.clock.today();
        (0..i64::from(days))
            .rev()
            .filter_map(|back| today.offset(-back))
            .filter_map(|day| Some((day, self.entry(day)?.mood?)))
            .collect()
    }
}
