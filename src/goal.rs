//! Longer-running goals with a target day and manual progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::day_key::DayKey;
use crate::error::TrackerError;
use crate::storage::{GOALS_SLOT, Store, load_slot, save_slot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub target_date: DayKey,
    /// Percent, 0 to 100.
    pub progress: u8,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    /// Whole days left until the target, negative once it has passed.
    pub fn days_remaining(&self, today: DayKey) -> i64 {
        crate::day_key::days_between(today, self.target_date)
    }

    pub fn is_overdue(&self, today: DayKey) -> bool {
        !self.is_completed && self.target_date < today
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGoal {
    pub title: String,
    pub description: String,
    pub target_date: DayKey,
}

impl NewGoal {
    pub fn new(title: impl Into<String>, description: impl Into<String>, target_date: DayKey) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            target_date,
        }
    }
}

pub struct GoalRepository {
    goals: Vec<Goal>,
    store: Rc<dyn Store>,
    clock: Rc<dyn Clock>,
}

impl GoalRepository {
    pub fn load(store: Rc<dyn Store>, clock: Rc<dyn Clock>) -> Result<Self, TrackerError> {
        let goals: Vec<Goal> = load_slot(store.as_ref(), GOALS_SLOT)?.unwrap_or_default();
        log::debug!("Loaded {} goal(s)", goals.len());
        Ok(Self { goals, store, clock })
    }

    pub fn save(&self) -> Result<(), TrackerError> {
        save_slot(self.store.as_ref(), GOALS_SLOT, &self.goals)?;
        Ok(())
    }

    fn commit(&mut self, goals: Vec<Goal>) -> Result<(), TrackerError> {
        if let Err(e) = save_slot(self.store.as_ref(), GOALS_SLOT, &goals) {
            log::error!("Failed to save goals: {}", e);
            return Err(e.into());
        }
        self.goals = goals;
        Ok(())
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn get(&self, goal_id: Uuid) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == goal_id)
    }

    /// Open goals, nearest target first, as the profile card lists them.
    pub fn current(&self) -> Vec<&Goal> {
        let mut open: Vec<&Goal> = self.goals.iter().filter(|g| !g.is_completed).collect();
        open.sort_by_key(|g| g.target_date);
        open
    }

    pub fn completed_count(&self) -> usize {
        self.goals.iter().filter(|g| g.is_completed).count()
    }

    pub fn add(&mut self, new: NewGoal) -> Result<Uuid, TrackerError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(TrackerError::EmptyName);
        }

        let goal = Goal {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: new.description.trim().to_string(),
            target_date: new.target_date,
            progress: 0,
            is_completed: false,
            created_at: self.clock.now().with_timezone(&Utc),
        };
        let id = goal.id;

        let mut goals = self.goals.clone();
        goals.push(goal);
        self.commit(goals)?;
        log::info!("Added goal {}", id);
        Ok(id)
    }

    pub fn update(&mut self, goal_id: Uuid, edit: NewGoal) -> Result<bool, TrackerError> {
        let title = edit.title.trim();
        if title.is_empty() {
            return Err(TrackerError::EmptyName);
        }
        self.modify(goal_id, |goal| {
            goal.title = title.to_string();
            goal.description = edit.description.trim().to_string();
            goal.target_date = edit.target_date;
        })
    }

    /// Sets progress, capped at 100. Reaching 100 completes the goal and
    /// dropping below it reopens it.
    pub fn set_progress(&mut self, goal_id: Uuid, progress: u8) -> Result<bool, TrackerError> {
        let progress = progress.min(100);
        self.modify(goal_id, |goal| {
            goal.progress = progress;
            goal.is_completed = progress == 100;
        })
    }

    pub fn complete(&mut self, goal_id: Uuid) -> Result<bool, TrackerError> {
        self.set_progress(goal_id, 100)
    }

    pub fn remove(&mut self, goal_id: Uuid) -> Result<bool, TrackerError> {
        if self.get(goal_id).is_none() {
            return Ok(false);
        }
        let goals = self.goals.iter().filter(|g| g.id != goal_id).cloned().collect();
        self.commit(goals)?;
        log::info!("Removed goal {}", goal_id);
        Ok(true)
    }

    fn modify(&mut self, goal_id: Uuid, change: impl FnOnce(&mut Goal)) -> Result<bool, TrackerError> {
        let Some(index) = self.goals.iter().position(|g| g.id == goal_id) else {
            return Ok(false);
        };
        let mut goals = self.goals.clone();
        change(&mut goals[index]);
        self.commit(goals)?;
        Ok(true)
    }
}
