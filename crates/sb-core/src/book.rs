//! The skill book: the whole application state, owned by one controller.
//!
//! Habits keep their insertion order (the skill panel is laid out in that
//! order). Every change to a habit goes through the [`ProgressionEngine`];
//! the book only swaps the stored value for the engine's successor.

use serde::{Deserialize, Serialize};

use crate::day::Moment;
use crate::engine::{Progress, ProgressionEngine};
use crate::error::{EngineError, Result};
use crate::habit::{Habit, HabitId, HabitKind};
use crate::icon::SkillIcon;

/// Result of [`SkillBook::toggle_timer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerToggle {
    Started(Habit),
    Stopped(Progress),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillBook {
    habits: Vec<Habit>,
    #[serde(default)]
    focus: Vec<HabitId>,
}

impl SkillBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a book from stored parts. Focus ids without a habit are dropped.
    pub fn from_parts(habits: Vec<Habit>, focus: Vec<HabitId>) -> Self {
        let mut book = Self {
            habits,
            focus: Vec::new(),
        };
        for id in focus {
            book.focus(&id);
        }
        book
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    pub fn get(&self, id: &HabitId) -> Option<&Habit> {
        self.habits.iter().find(|h| &h.id == id)
    }

    /// Create and append a new habit.
    pub fn create(&mut self, name: &str, icon: SkillIcon, kind: HabitKind) -> Result<&Habit> {
        let habit = Habit::new(name, icon, kind)?;
        Ok(self.insert(habit))
    }

    /// Append a habit, replacing any existing one with the same id in place.
    pub fn insert(&mut self, habit: Habit) -> &Habit {
        let index = match self.position(&habit.id) {
            Some(i) => {
                self.habits[i] = habit;
                i
            }
            None => {
                self.habits.push(habit);
                self.habits.len() - 1
            }
        };
        &self.habits[index]
    }

    /// Permanently delete a habit; it also leaves the focus list.
    pub fn remove(&mut self, id: &HabitId) -> Option<Habit> {
        let index = self.position(id)?;
        self.focus.retain(|f| f != id);
        Some(self.habits.remove(index))
    }

    /// Drop every habit and the focus list.
    pub fn reset(&mut self) {
        self.habits.clear();
        self.focus.clear();
    }

    /// Find a habit by exact id, unique id prefix, or case-insensitive name.
    pub fn resolve(&self, key: &str) -> Result<&Habit> {
        let key = key.trim();
        if let Some(habit) = self.habits.iter().find(|h| h.id.as_str() == key) {
            return Ok(habit);
        }

        let by_name: Vec<&Habit> = self
            .habits
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case(key))
            .collect();
        match by_name.as_slice() {
            [one] => return Ok(*one),
            [] => {}
            _ => return Err(EngineError::AmbiguousHabit(key.to_string())),
        }

        if key.is_empty() {
            return Err(EngineError::UnknownHabit(key.to_string()));
        }
        let by_prefix: Vec<&Habit> = self
            .habits
            .iter()
            .filter(|h| h.id.as_str().starts_with(key))
            .collect();
        match by_prefix.as_slice() {
            [one] => Ok(*one),
            [] => Err(EngineError::UnknownHabit(key.to_string())),
            _ => Err(EngineError::AmbiguousHabit(key.to_string())),
        }
    }

    pub fn complete(&mut self, id: &HabitId, now: &Moment) -> Result<Progress> {
        let habit = self.get(id).ok_or_else(|| EngineError::unknown(id))?;
        let progress = ProgressionEngine::standard().complete_daily(habit, now)?;
        self.insert(progress.habit.clone());
        Ok(progress)
    }

    pub fn start_timer(&mut self, id: &HabitId, now: &Moment) -> Result<&Habit> {
        let habit = self.get(id).ok_or_else(|| EngineError::unknown(id))?;
        let started = ProgressionEngine::standard().start_timer(habit, now)?;
        Ok(self.insert(started))
    }

    pub fn stop_timer(&mut self, id: &HabitId, now: &Moment) -> Result<Progress> {
        let habit = self.get(id).ok_or_else(|| EngineError::unknown(id))?;
        let progress = ProgressionEngine::standard().stop_timer(habit, now)?;
        self.insert(progress.habit.clone());
        Ok(progress)
    }

    /// Start an idle timer or stop a running one.
    pub fn toggle_timer(&mut self, id: &HabitId, now: &Moment) -> Result<TimerToggle> {
        let running = self
            .get(id)
            .ok_or_else(|| EngineError::unknown(id))?
            .is_timer_running();
        if running {
            self.stop_timer(id, now).map(TimerToggle::Stopped)
        } else {
            self.start_timer(id, now)
                .map(|habit| TimerToggle::Started(habit.clone()))
        }
    }

    pub fn pending_experience(&self, id: &HabitId, now: &Moment) -> Result<u64> {
        let habit = self.get(id).ok_or_else(|| EngineError::unknown(id))?;
        Ok(ProgressionEngine::standard().pending_experience(habit, now))
    }

    /// Sum of all skill levels (the "Total level" banner).
    pub fn total_level(&self) -> u32 {
        self.habits.iter().map(|h| u32::from(h.level)).sum()
    }

    pub fn total_experience(&self) -> u64 {
        self.habits.iter().map(|h| h.experience).sum()
    }

    pub fn best_streak(&self) -> u32 {
        self.habits.iter().map(|h| h.streak).max().unwrap_or(0)
    }

    pub fn running_timers(&self) -> impl Iterator<Item = &Habit> {
        self.habits.iter().filter(|h| h.is_timer_running())
    }

    // --- Focus list ---

    /// Pin a habit to the focus list. Returns false if unknown or already pinned.
    pub fn focus(&mut self, id: &HabitId) -> bool {
        if self.position(id).is_none() || self.focus.contains(id) {
            return false;
        }
        self.focus.push(id.clone());
        true
    }

    pub fn unfocus(&mut self, id: &HabitId) -> bool {
        let before = self.focus.len();
        self.focus.retain(|f| f != id);
        self.focus.len() != before
    }

    pub fn focus_ids(&self) -> &[HabitId] {
        &self.focus
    }

    /// Focused habits in pin order.
    pub fn focused(&self) -> Vec<&Habit> {
        self.focus.iter().filter_map(|id| self.get(id)).collect()
    }

    fn position(&self, id: &HabitId) -> Option<usize> {
        self.habits.iter().position(|h| &h.id == id)
    }
}
