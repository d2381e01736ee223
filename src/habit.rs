use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::completion_log::CompletionLog;
use crate::day_key::DayKey;
use crate::error::TrackerError;
use crate::journal::HabitsSummary;
use crate::ranking::{self, OverallSummary, TodayProgress};
use crate::stats::{HabitStats, count};
use crate::storage::{HABITS_SLOT, Store, load_slot, save_slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitCategory {
    Growth,
    Fitness,
    Nutrition,
    Wellness,
    Custom,
}

impl HabitCategory {
    pub const ALL: [HabitCategory; 5] = [
        HabitCategory::Growth,
        HabitCategory::Fitness,
        HabitCategory::Nutrition,
        HabitCategory::Wellness,
        HabitCategory::Custom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Growth => "Personal Growth",
            Self::Fitness => "Health & Fitness",
            Self::Nutrition => "Nutrition",
            Self::Wellness => "Mental Wellness",
            Self::Custom => "Custom",
        }
    }

    /// Default color token for habits in this category.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Growth => "category-growth",
            Self::Fitness => "category-fitness",
            Self::Nutrition => "category-nutrition",
            Self::Wellness => "category-wellness",
            Self::Custom => "primary",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    pub category: HabitCategory,
    pub color: String,
    pub completed_dates: CompletionLog,
    /// Creation instant in the offset it happened in, so the creation day
    /// does not move when the user's offset later changes.
    pub created_at: DateTime<FixedOffset>,
    pub order: u32,
}

impl Habit {
    pub fn from_new(new: NewHabit, created_at: DateTime<FixedOffset>, order: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            icon: new.icon,
            category: new.category,
            color: new.color,
            completed_dates: CompletionLog::new(),
            created_at,
            order,
        }
    }

    pub fn is_completed_on(&self, day: DayKey) -> bool {
        self.completed_dates.contains(day)
    }

    pub fn created_day(&self) -> DayKey {
        DayKey::from_instant(&self.created_at)
    }

    pub fn stats(&self, now: &DateTime<FixedOffset>) -> HabitStats {
        HabitStats::compute(&self.completed_dates, self.created_day(), DayKey::from_instant(now))
    }
}

/// What the user fills in when adding or editing a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub name: String,
    pub icon: String,
    pub category: HabitCategory,
    pub color: String,
}

impl NewHabit {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, category: HabitCategory) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            category,
            color: category.color().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HabitTemplate {
    pub name: &'static str,
    pub icon: &'static str,
    pub category: HabitCategory,
}

impl HabitTemplate {
    const fn new(name: &'static str, icon: &'static str, category: HabitCategory) -> Self {
        Self { name, icon, category }
    }

    pub fn to_new_habit(&self) -> NewHabit {
        NewHabit::new(self.name, self.icon, self.category)
    }
}

const TEMPLATES: [HabitTemplate; 20] = [
    HabitTemplate::new("Read for 20 minutes", "BookOpen", HabitCategory::Growth),
    HabitTemplate::new("Journal for 5 minutes", "PenTool", HabitCategory::Growth),
    HabitTemplate::new("Practice a new language", "Globe", HabitCategory::Growth),
    HabitTemplate::new("Limit social media", "Smartphone", HabitCategory::Growth),
    HabitTemplate::new("Learn a new skill", "Brain", HabitCategory::Growth),
    HabitTemplate::new("Exercise", "Dumbbell", HabitCategory::Fitness),
    HabitTemplate::new("Stretch for 10 minutes", "Activity", HabitCategory::Fitness),
    HabitTemplate::new("Track workouts", "ClipboardList", HabitCategory::Fitness),
    HabitTemplate::new("Take supplements", "Pill", HabitCategory::Fitness),
    HabitTemplate::new("Hit daily step goal", "Footprints", HabitCategory::Fitness),
    HabitTemplate::new("Eat 3 healthy meals", "UtensilsCrossed", HabitCategory::Nutrition),
    HabitTemplate::new("Drink 8+ glasses of water", "Droplets", HabitCategory::Nutrition),
    HabitTemplate::new("Avoid junk food", "Ban", HabitCategory::Nutrition),
    HabitTemplate::new("Track calories", "Calculator", HabitCategory::Nutrition),
    HabitTemplate::new("Eat fruits & vegetables", "Apple", HabitCategory::Nutrition),
    HabitTemplate::new("Meditate for 10 minutes", "Sparkles", HabitCategory::Wellness),
    HabitTemplate::new("Write 3 gratitudes", "Heart", HabitCategory::Wellness),
    HabitTemplate::new("No phone after 9 PM", "Moon", HabitCategory::Wellness),
    HabitTemplate::new("Spend time outside", "Sun", HabitCategory::Wellness),
    HabitTemplate::new("Reflect on feelings", "MessageCircle", HabitCategory::Wellness),
];

pub fn default_templates() -> &'static [HabitTemplate] {
    &TEMPLATES
}

pub fn templates_in(category: HabitCategory) -> impl Iterator<Item = &'static HabitTemplate> {
    TEMPLATES.iter().filter(move |t| t.category == category)
}

/// The user's habits, kept sorted by display order and written back to the
/// store on every change.
pub struct HabitRepository {
    habits: Vec<Habit>,
    store: Rc<dyn Store>,
    clock: Rc<dyn Clock>,
}

impl HabitRepository {
    pub fn load(store: Rc<dyn Store>, clock: Rc<dyn Clock>) -> Result<Self, TrackerError> {
        let mut habits: Vec<Habit> = load_slot(store.as_ref(), HABITS_SLOT)?.unwrap_or_default();
        habits.sort_by_key(|h| h.order);
        log::debug!("Loaded {} habit(s)", habits.len());
        Ok(Self { habits, store, clock })
    }

    pub fn save(&self) -> Result<(), TrackerError> {
        save_slot(self.store.as_ref(), HABITS_SLOT, &self.habits)?;
        Ok(())
    }

    /// Persists `habits` and only then makes them the live collection.
    fn commit(&mut self, habits: Vec<Habit>) -> Result<(), TrackerError> {
        if let Err(e) = save_slot(self.store.as_ref(), HABITS_SLOT, &habits) {
            log::error!("Failed to save habits: {}", e);
            return Err(e.into());
        }
        self.habits = habits;
        Ok(())
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn get(&self, habit_id: Uuid) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == habit_id)
    }

    pub fn has_habit_named(&self, name: &str) -> bool {
        self.find_by_name(name, None).is_some()
    }

    fn find_by_name(&self, name: &str, except: Option<Uuid>) -> Option<&Habit> {
        let name = name.trim();
        self.habits
            .iter()
            .filter(|h| Some(h.id) != except)
            .find(|h| h.name.trim().eq_ignore_ascii_case(name))
    }

    fn validate_name(&self, name: &str, except: Option<Uuid>) -> Result<(), TrackerError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TrackerError::EmptyName);
        }
        if self.find_by_name(trimmed, except).is_some() {
            return Err(TrackerError::DuplicateName(trimmed.to_string()));
        }
        Ok(())
    }

    pub fn add(&mut self, new: NewHabit) -> Result<Uuid, TrackerError> {
        self.validate_name(&new.name, None)?;

        let order = self.habits.iter().map(|h| h.order + 1).max().unwrap_or(0);
        let habit = Habit::from_new(new, self.clock.now(), order);
        let id = habit.id;

        let mut habits = self.habits.clone();
        habits.push(habit);
        self.commit(habits)?;
        log::info!("Added habit {}", id);
        Ok(id)
    }

    pub fn add_template(&mut self, template: &HabitTemplate) -> Result<Uuid, TrackerError> {
        self.add(template.to_new_habit())
    }

    /// Replaces the editable fields. Unknown ids are ignored.
    pub fn update(&mut self, habit_id: Uuid, edit: NewHabit) -> Result<bool, TrackerError> {
        let Some(index) = self.index_of(habit_id) else {
            return Ok(false);
        };
        self.validate_name(&edit.name, Some(habit_id))?;

        let mut habits = self.habits.clone();
        let habit = &mut habits[index];
        habit.name = edit.name.trim().to_string();
        habit.icon = edit.icon;
        habit.category = edit.category;
        habit.color = edit.color;
        self.commit(habits)?;
        Ok(true)
    }

    pub fn remove(&mut self, habit_id: Uuid) -> Result<bool, TrackerError> {
        if self.index_of(habit_id).is_none() {
            return Ok(false);
        }
        let habits = self.habits.iter().filter(|h| h.id != habit_id).cloned().collect();
        self.commit(habits)?;
        log::info!("Removed habit {}", habit_id);
        Ok(true)
    }

    /// Flips completion of `day` and returns the new state, or `None` for an
    /// unknown habit. Marking a future day is refused; unmarking one is not.
    pub fn toggle(&mut self, habit_id: Uuid, day: DayKey) -> Result<Option<bool>, TrackerError> {
        let Some(index) = self.index_of(habit_id) else {
            return Ok(None);
        };
        let today = self.clock.today();

        let mut habits = self.habits.clone();
        let log = &mut habits[index].completed_dates;
        let completed = if log.remove(day) {
            false
        } else {
            log.record(day, today)?;
            true
        };
        self.commit(habits)?;
        Ok(Some(completed))
    }

    pub fn toggle_today(&mut self, habit_id: Uuid) -> Result<Option<bool>, TrackerError> {
        self.toggle(habit_id, self.clock.today())
    }

    pub fn is_completed_on(&self, habit_id: Uuid, day: DayKey) -> bool {
        self.get(habit_id).is_some_and(|h| h.is_completed_on(day))
    }

    /// Moves a habit to position `index` (clamped) and renumbers display order.
    pub fn move_to(&mut self, habit_id: Uuid, index: usize) -> Result<bool, TrackerError> {
        let Some(from) = self.index_of(habit_id) else {
            return Ok(false);
        };

        let mut habits = self.habits.clone();
        let habit = habits.remove(from);
        let to = index.min(habits.len());
        habits.insert(to, habit);
        for (order, habit) in habits.iter_mut().enumerate() {
            habit.order = count(order);
        }
        self.commit(habits)?;
        Ok(true)
    }

    /// Drops every habit and clears the habits slot. Journal and theme stay.
    pub fn reset(&mut self) -> Result<(), TrackerError> {
        if let Err(e) = self.store.remove(HABITS_SLOT) {
            log::error!("Failed to clear habits: {}", e);
            return Err(e.into());
        }
        log::info!("Reset {} habit(s)", self.habits.len());
        self.habits.clear();
        Ok(())
    }

    fn index_of(&self, habit_id: Uuid) -> Option<usize> {
        self.habits.iter().position(|h| h.id == habit_id)
    }

    pub fn stats(&self, habit_id: Uuid) -> Option<HabitStats> {
        self.get(habit_id).map(|h| self.stats_for(h))
    }

    pub fn stats_for(&self, habit: &Habit) -> HabitStats {
        habit.stats(&self.clock.now())
    }

    pub fn today_progress(&self) -> TodayProgress {
        ranking::today_progress(&self.habits, self.clock.today())
    }

    pub fn best_habit(&self) -> Option<&Habit> {
        ranking::best_habit(&self.habits, &self.clock.now())
    }

    pub fn weakest_habit(&self) -> Option<&Habit> {
        ranking::weakest_habit(&self.habits, &self.clock.now())
    }

    pub fn total_streak(&self) -> u32 {
        ranking::total_streak(&self.habits, &self.clock.now())
    }

    pub fn summary(&self) -> OverallSummary {
        ranking::overall_summary(&self.habits, &self.clock.now())
    }

    /// Snapshot of which habits were done on `day`, for a journal entry.
    pub fn habits_summary(&self, day: DayKey) -> HabitsSummary {
        let habits: Vec<String> = self
            .habits
            .iter()
            .filter(|h| h.is_completed_on(day))
            .map(|h| h.name.clone())
            .collect();
        HabitsSummary {
            completed: count(habits.len()),
            total: count(self.habits.len()),
            habits,
        }
    }
}
