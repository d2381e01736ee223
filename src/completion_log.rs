use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::day_key::DayKey;
use crate::error::TrackerError;

/// The set of days on which something counted as done. Habits own one for
/// their completions; the journal derives one from its entry dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionLog {
    days: BTreeSet<DayKey>,
}

impl CompletionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, day: DayKey) -> bool {
        self.days.contains(&day)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Days in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = DayKey> + '_ {
        self.days.iter().copied()
    }

    pub fn first(&self) -> Option<DayKey> {
        self.days.first().copied()
    }

    pub fn last(&self) -> Option<DayKey> {
        self.days.last().copied()
    }

    /// Returns true if the day was not already present.
    pub fn insert(&mut self, day: DayKey) -> bool {
        self.days.insert(day)
    }

    /// Returns true if the day was present.
    pub fn remove(&mut self, day: DayKey) -> bool {
        self.days.remove(&day)
    }

    /// Flips membership of `day` and returns the new membership.
    pub fn toggle(&mut self, day: DayKey) -> bool {
        if self.days.remove(&day) {
            false
        } else {
            self.days.insert(day);
            true
        }
    }

    /// Insert that refuses days after `today`.
    pub fn record(&mut self, day: DayKey, today: DayKey) -> Result<bool, TrackerError> {
        if day.is_after(today) {
            return Err(TrackerError::FutureDay(day));
        }
        Ok(self.insert(day))
    }
}

impl FromIterator<DayKey> for CompletionLog {
    fn from_iter<I: IntoIterator<Item = DayKey>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CompletionLog {
    type Item = &'a DayKey;
    type IntoIter = std::collections::btree_set::Iter<'a, DayKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DayKey {
        DayKey::parse(s).unwrap()
    }

    #[test]
    fn duplicates_collapse() {
        let mut log = CompletionLog::new();
        assert!(log.insert(key("2024-01-01")));
        assert!(!log.insert(key("2024-01-01")));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn toggle_twice_restores_original() {
        let mut log: CompletionLog = [key("2024-01-01"), key("2024-01-03")].into_iter().collect();
        let original = log.clone();
        assert!(log.toggle(key("2024-01-02")));
        assert!(!log.toggle(key("2024-01-02")));
        assert_eq!(log, original);
    }

    #[test]
    fn record_rejects_future_days() {
        let mut log = CompletionLog::new();
        let today = key("2024-01-07");
        assert!(log.record(today, today).unwrap());
        assert!(matches!(
            log.record(key("2024-01-08"), today),
            Err(TrackerError::FutureDay(_))
        ));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn iterates_ascending_and_loads_unordered_json() {
        let log: CompletionLog =
            serde_json::from_str(r#"["2024-01-05","2024-01-01","2024-01-05","2024-01-03"]"#).unwrap();
        let days: Vec<String> = log.iter().map(|d| d.to_string()).collect();
        assert_eq!(days, ["2024-01-01", "2024-01-03", "2024-01-05"]);
        assert_eq!(
            serde_json::to_string(&log).unwrap(),
            r#"["2024-01-01","2024-01-03","2024-01-05"]"#
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn toggling_twice_is_identity(offsets in prop::collection::vec(0i64..90, 0..40), t in 0i64..90) {
                let base = key("2024-01-01");
                let mut log: CompletionLog = offsets.iter().map(|o| base.offset(*o).unwrap()).collect();
                let original = log.clone();
                let day = base.offset(t).unwrap();

                let first = log.toggle(day);
                prop_assert_eq!(first, !original.contains(day));
                log.toggle(day);
                prop_assert_eq!(log, original);
            }
        }
    }
}
