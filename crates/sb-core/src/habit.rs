use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::curve::ExperienceTable;
use crate::day::CalendarDay;
use crate::error::{EngineError, Result};
use crate::icon::SkillIcon;

/// Opaque, stable identity of a habit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier (stored rows, imported documents).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HabitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitKind {
    /// One completion per calendar day.
    Daily,
    /// Experience from running-timer duration, any number of runs per day.
    Timed,
}

impl HabitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HabitKind::Daily => "daily",
            HabitKind::Timed => "timed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(HabitKind::Daily),
            "timed" => Some(HabitKind::Timed),
            _ => None,
        }
    }
}

impl fmt::Display for HabitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One experience award. Appended, never edited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub date: CalendarDay,
    pub experience_gained: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// A tracked skill: the persisted unit of progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    #[serde(default)]
    pub icon: SkillIcon,
    pub kind: HabitKind,
    pub level: u8,
    pub experience: u64,
    pub experience_to_next: u64,
    pub streak: u32,
    pub last_completed: Option<CalendarDay>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub timer_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_today_ms: u64,
}

impl Habit {
    /// Fresh habit at level 1 with no history. The name is trimmed.
    pub fn new(name: &str, icon: SkillIcon, kind: HabitKind) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::EmptyName);
        }
        let table = ExperienceTable::standard();
        Ok(Self {
            id: HabitId::new(),
            name: name.to_string(),
            icon,
            kind,
            level: 1,
            experience: 0,
            experience_to_next: table.experience_to_next(1, 0),
            streak: 0,
            last_completed: None,
            history: Vec::new(),
            timer_started_at: None,
            time_today_ms: 0,
        })
    }

    pub fn is_completed_today(&self, today: CalendarDay) -> bool {
        self.last_completed == Some(today)
    }

    pub fn is_timer_running(&self) -> bool {
        self.kind == HabitKind::Timed && self.timer_started_at.is_some()
    }

    /// Re-derive level and remaining experience from `experience`.
    /// Used after loading data that may have been edited by hand.
    pub fn normalize(&mut self, table: &ExperienceTable) {
        self.level = table.level_for(self.experience);
        self.experience_to_next = table.experience_to_next(self.level, self.experience);
        if self.kind == HabitKind::Daily {
            self.timer_started_at = None;
        }
    }

    /// Total experience earned on `day` across all history entries.
    pub fn experience_on(&self, day: CalendarDay) -> u64 {
        self.history
            .iter()
            .filter(|entry| entry.date == day)
            .map(|entry| entry.experience_gained)
            .sum()
    }

    pub(crate) fn require_kind(&self, expected: HabitKind) -> Result<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(EngineError::WrongKind {
                expected,
                found: self.kind,
            })
        }
    }
}
