//! JSON wire format for skill books.
//!
//! Exports are a versioned document with camelCase fields. Imports also
//! accept the browser widget's `habits-data` array, which stores days as
//! `"Mon Oct 19 2026"`, timer starts as epoch milliseconds, and icons as
//! numeric slots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use crate::book::SkillBook;
use crate::curve::ExperienceTable;
use crate::day::CalendarDay;
use crate::habit::{Habit, HabitId, HabitKind, HistoryEntry};
use crate::icon::SkillIcon;

pub const CURRENT_VERSION: &str = "1";

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WireExport {
    pub version: String,
    #[serde(default)]
    pub exported_at: String,
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub focus: Vec<HabitId>,
}

/// Browser ids were `Date.now()` numbers; newer builds used strings.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum LegacyId {
    Number(u64),
    Text(String),
}

impl LegacyId {
    fn into_string(self) -> String {
        match self {
            LegacyId::Number(n) => n.to_string(),
            LegacyId::Text(s) => s,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LegacyHabit {
    pub id: LegacyId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<LegacyId>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub last_completed: Option<String>,
    #[serde(default)]
    pub history: Vec<LegacyEntry>,
    #[serde(default)]
    pub timer_start: Option<i64>,
    #[serde(default)]
    pub total_time_today: u64,
}

#[derive(Deserialize, Debug)]
pub struct LegacyEntry {
    pub date: String,
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub duration: Option<u64>,
}

/// Parse either `2026-10-19` or the browser's `Mon Oct 19 2026`.
pub fn parse_day(raw: &str) -> Option<CalendarDay> {
    let raw = raw.trim();
    raw.parse::<CalendarDay>()
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%a %b %d %Y")
                .ok()
                .map(CalendarDay::new)
        })
}

impl LegacyHabit {
    fn into_habit(self) -> Result<Habit, String> {
        let kind = match self.kind.as_deref() {
            None => HabitKind::Daily,
            Some(raw) => HabitKind::parse(raw).ok_or_else(|| format!("unknown habit type '{raw}'"))?,
        };
        let icon = self
            .icon
            .map(LegacyId::into_string)
            .and_then(|raw| raw.parse::<SkillIcon>().ok())
            .unwrap_or_default();
        let last_completed = match self.last_completed.as_deref() {
            None => None,
            Some(raw) => Some(parse_day(raw).ok_or_else(|| format!("invalid day '{raw}'"))?),
        };
        let history = self
            .history
            .into_iter()
            .map(|entry| {
                let date = parse_day(&entry.date)
                    .ok_or_else(|| format!("invalid history day '{}'", entry.date))?;
                Ok(HistoryEntry {
                    date,
                    experience_gained: entry.xp,
                    duration_ms: entry.duration,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;
        let timer_started_at = match (kind, self.timer_start) {
            (HabitKind::Timed, Some(ms)) => DateTime::<Utc>::from_timestamp_millis(ms),
            _ => None,
        };

        Ok(Habit {
            id: HabitId::from_raw(self.id.into_string()),
            name: self.name.trim().to_string(),
            icon,
            kind,
            level: 1,
            experience: self.xp,
            experience_to_next: 0,
            streak: self.streak,
            last_completed,
            history,
            timer_started_at,
            time_today_ms: self.total_time_today,
        })
    }
}

/// Serialize a skill book as a versioned JSON document.
pub fn export_json(book: &SkillBook) -> Result<String, serde_json::Error> {
    let export = WireExport {
        version: CURRENT_VERSION.to_string(),
        exported_at: Utc::now().to_rfc3339(),
        habits: book.habits().to_vec(),
        focus: book.focus_ids().to_vec(),
    };
    serde_json::to_string_pretty(&export)
}

/// Parse a versioned export or a browser `habits-data` array.
/// Level and remaining experience are re-derived from experience.
pub fn import_json(json: &str) -> Result<SkillBook, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(json)?;

    let (mut habits, focus) = if value.is_array() {
        let legacy: Vec<LegacyHabit> = serde_json::from_value(value)?;
        let habits = legacy
            .into_iter()
            .map(LegacyHabit::into_habit)
            .collect::<Result<Vec<_>, String>>()
            .map_err(serde_json::Error::custom)?;
        (habits, Vec::new())
    } else {
        let export: WireExport = serde_json::from_value(value)?;
        if export.version != CURRENT_VERSION {
            return Err(serde_json::Error::custom(format!(
                "unsupported export version '{}'",
                export.version
            )));
        }
        (export.habits, export.focus)
    };

    let table = ExperienceTable::standard();
    for habit in &mut habits {
        if habit.name.trim().is_empty() {
            return Err(serde_json::Error::custom(format!(
                "habit {} has an empty name",
                habit.id
            )));
        }
        habit.normalize(table);
    }

    Ok(SkillBook::from_parts(habits, focus))
}
