use serde::Serialize;
use std::rc::Rc;

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::day_key::DayKey;
use crate::debounce::{DraftSave, JournalDraft};
use crate::error::TrackerError;
use crate::goal::GoalRepository;
use crate::habit::{Habit, HabitRepository};
use crate::journal::{JournalEntry, JournalRepository, Mood};
use crate::preferences::{self, Theme};
use crate::ranking::TodayProgress;
use crate::storage::Store;

/// Everything the dashboard shows above the habit list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub progress: TodayProgress,
    pub total_streak: u32,
    pub best: Option<String>,
    pub weakest: Option<String>,
}

/// The application's collections, loaded together at startup and sharing
/// one store and one clock.
pub struct Tracker {
    config: AppConfig,
    store: Rc<dyn Store>,
    clock: Rc<dyn Clock>,
    habits: HabitRepository,
    goals: GoalRepository,
    journal: JournalRepository,
    theme: Theme,
}

impl Tracker {
    pub fn open(config: AppConfig, store: Rc<dyn Store>, clock: Rc<dyn Clock>) -> Result<Self, TrackerError> {
        let habits = HabitRepository::load(store.clone(), clock.clone())?;
        let goals = GoalRepository::load(store.clone(), clock.clone())?;
        let journal = JournalRepository::load(store.clone(), clock.clone())?;
        let theme = preferences::load_theme(store.as_ref())?;
        log::info!(
            "Opened tracker with {} habit(s), {} goal(s) and {} journal entries",
            habits.habits().len(),
            goals.goals().len(),
            journal.entries().len()
        );

        Ok(Self {
            config,
            store,
            clock,
            habits,
            goals,
            journal,
            theme,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn today(&self) -> DayKey {
        self.clock.today()
    }

    pub fn habits(&self) -> &HabitRepository {
        &self.habits
    }

    pub fn habits_mut(&mut self) -> &mut HabitRepository {
        &mut self.habits
    }

    pub fn goals(&self) -> &GoalRepository {
        &self.goals
    }

    pub fn goals_mut(&mut self) -> &mut GoalRepository {
        &mut self.goals
    }

    pub fn journal(&self) -> &JournalRepository {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut JournalRepository {
        &mut self.journal
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), TrackerError> {
        preferences::save_theme(self.store.as_ref(), theme)?;
        self.theme = theme;
        Ok(())
    }

    /// Saves the entry for `day` with a fresh snapshot of that day's habits.
    pub fn save_journal(
        &mut self,
        day: DayKey,
        content: impl Into<String>,
        mood: Option<Mood>,
    ) -> Result<JournalEntry, TrackerError> {
        let snapshot = self.habits.habits_summary(day);
        self.journal.save_entry(day, content, mood, Some(snapshot))
    }

    /// Editor state for `day`, seeded from any existing entry.
    pub fn draft(&self, day: DayKey) -> JournalDraft {
        JournalDraft::new(day, self.journal.entry(day), self.config.autosave_delay())
    }

    pub fn apply_draft(&mut self, save: DraftSave) -> Result<JournalEntry, TrackerError> {
        self.save_journal(save.day, save.content, save.mood)
    }

    /// Polls `draft` against the clock and writes it if it has gone quiet.
    pub fn autosave(&mut self, draft: &mut JournalDraft) -> Result<Option<JournalEntry>, TrackerError> {
        match draft.poll(self.clock.now()) {
            Some(save) => self.apply_draft(save).map(Some),
            None => Ok(None),
        }
    }

    pub fn dashboard(&self) -> Dashboard {
        let name = |h: &Habit| h.name.clone();
        Dashboard {
            progress: self.habits.today_progress(),
            total_streak: self.habits.total_streak(),
            best: self.habits.best_habit().map(name),
            weakest: self.habits.weakest_habit().map(name),
        }
    }

    /// Writes every collection back; call on shutdown.
    pub fn flush(&self) -> Result<(), TrackerError> {
        self.habits.save()?;
        self.goals.save()?;
        self.journal.save()?;
        preferences::save_theme(self.store.as_ref(), self.theme)?;
        log::debug!("Flushed all collections");
        Ok(())
    }
}
