//! Debounced auto-save.
//!
//! The debouncer is driven by the caller's clock: it only remembers what is
//! pending and when it becomes due, and hands the task back from [`Debouncer::poll`].
//! Hosts call `poll` from whatever timer or event loop they already run.

use chrono::{DateTime, Duration, FixedOffset};

use crate::day_key::DayKey;
use crate::journal::{JournalEntry, Mood};

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, DateTime<FixedOffset>)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Queues `task` to fire `delay` after `now`, replacing any task that has
    /// not fired yet. Returns true if a pending task was replaced.
    pub fn schedule(&mut self, task: T, now: DateTime<FixedOffset>) -> bool {
        self.pending.replace((task, now + self.delay)).is_some()
    }

    /// Takes the pending task once its quiet period has elapsed.
    pub fn poll(&mut self, now: DateTime<FixedOffset>) -> Option<T> {
        match &self.pending {
            Some((_, due)) if now >= *due => self.pending.take().map(|(task, _)| task),
            _ => None,
        }
    }

    /// Takes the pending task immediately, due or not.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(task, _)| task)
    }

    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<DateTime<FixedOffset>> {
        self.pending.as_ref().map(|(_, due)| *due)
    }
}

/// A journal save that became due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftSave {
    pub day: DayKey,
    pub content: String,
    pub mood: Option<Mood>,
}

/// Editor state for one day's entry. Every edit restarts the quiet period;
/// a blank draft with no mood is never saved.
#[derive(Debug, Clone)]
pub struct JournalDraft {
    day: DayKey,
    content: String,
    mood: Option<Mood>,
    pending: Debouncer<DraftSave>,
}

impl JournalDraft {
    pub fn new(day: DayKey, existing: Option<&JournalEntry>, delay: Duration) -> Self {
        Self {
            day,
            content: existing.map(|e| e.content.clone()).unwrap_or_default(),
            mood: existing.and_then(|e| e.mood),
            pending: Debouncer::new(delay),
        }
    }

    pub fn day(&self) -> DayKey {
        self.day
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn mood(&self) -> Option<Mood> {
        self.mood
    }

    pub fn edit(&mut self, content: impl Into<String>, now: DateTime<FixedOffset>) {
        self.content = content.into();
        self.reschedule(now);
    }

    pub fn set_mood(&mut self, mood: Option<Mood>, now: DateTime<FixedOffset>) {
        self.mood = mood;
        self.reschedule(now);
    }

    /// Appends the day's prompt on its own line, as the editor's
    /// "use prompt" action does.
    pub fn use_prompt(&mut self, prompt: &str, now: DateTime<FixedOffset>) {
        let content = if self.content.is_empty() {
            format!("{}\n", prompt)
        } else {
            format!("{}\n\n{}\n", self.content, prompt)
        };
        self.edit(content, now);
    }

    fn reschedule(&mut self, now: DateTime<FixedOffset>) {
        if self.content.trim().is_empty() && self.mood.is_none() {
            self.pending.cancel();
            return;
        }
        let save = DraftSave {
            day: self.day,
            content: self.content.clone(),
            mood: self.mood,
        };
        if self.pending.schedule(save, now) {
            log::debug!("Auto-save for {} restarted", self.day);
        }
    }

    pub fn poll(&mut self, now: DateTime<FixedOffset>) -> Option<DraftSave> {
        self.pending.poll(now)
    }

    pub fn flush(&mut self) -> Option<DraftSave> {
        self.pending.flush()
    }

    pub fn is_dirty(&self) -> bool {
        self.pending.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 20, 0, 0)
            .unwrap()
    }

    fn ms(n: i64) -> Duration {
        Duration::milliseconds(n)
    }

    #[test]
    fn fires_only_after_quiet_period() {
        let mut d = Debouncer::new(ms(1000));
        d.schedule("a", t0());
        assert_eq!(d.poll(t0() + ms(999)), None);
        assert_eq!(d.poll(t0() + ms(1000)), Some("a"));
        assert!(!d.is_pending());
        assert_eq!(d.poll(t0() + ms(5000)), None);
    }

    #[test]
    fn new_schedule_supersedes_pending() {
        let mut d = Debouncer::new(ms(1000));
        assert!(!d.schedule(1, t0()));
        assert!(d.schedule(2, t0() + ms(800)));
        assert_eq!(d.deadline(), Some(t0() + ms(1800)));
        assert_eq!(d.poll(t0() + ms(1000)), None);
        assert_eq!(d.poll(t0() + ms(1800)), Some(2));
    }

    #[test]
    fn flush_and_cancel() {
        let mut d = Debouncer::new(ms(1000));
        d.schedule("x", t0());
        assert_eq!(d.flush(), Some("x"));
        d.schedule("y", t0());
        assert!(d.cancel());
        assert!(!d.cancel());
        assert_eq!(d.flush(), None);
    }

    #[test]
    fn draft_saves_latest_text_once_idle() {
        let day = DayKey::parse("2024-03-05").unwrap();
        let mut draft = JournalDraft::new(day, None, ms(1000));
        draft.edit("Hel", t0());
        draft.edit("Hello", t0() + ms(300));
        assert_eq!(draft.poll(t0() + ms(1000)), None);

        let save = draft.poll(t0() + ms(1300)).unwrap();
        assert_eq!(save.content, "Hello");
        assert_eq!(save.day, day);
        assert!(!draft.is_dirty());
    }

    #[test]
    fn blank_draft_is_not_saved() {
        let day = DayKey::parse("2024-03-05").unwrap();
        let mut draft = JournalDraft::new(day, None, ms(1000));
        draft.edit("text", t0());
        draft.edit("   ", t0() + ms(100));
        assert!(!draft.is_dirty());
        assert_eq!(draft.poll(t0() + ms(5000)), None);

        draft.set_mood(Some(Mood::Okay), t0() + ms(200));
        assert_eq!(draft.flush().unwrap().mood, Some(Mood::Okay));
    }

    #[test]
    fn prompt_is_appended_on_new_paragraph() {
        let day = DayKey::parse("2024-03-05").unwrap();
        let mut draft = JournalDraft::new(day, None, ms(1000));
        draft.use_prompt("Why?", t0());
        assert_eq!(draft.content(), "Why?\n");
        draft.use_prompt("How?", t0());
        assert_eq!(draft.content(), "Why?\n\nHow?\n");
    }
}
