//! Skill progression engine for the skillbook habit tracker.
//!
//! Habits ("skills") earn experience from daily completions or timed runs.
//! Experience maps to a level 1..=99 through a fixed exponential curve.
//! Streaks count consecutive calendar days.
//!
//! Zero I/O: the engine is a set of pure transitions over values. Storage
//! and identity sit behind the traits in [`collab`].

pub mod book;
pub mod collab;
pub mod constants;
pub mod cue;
pub mod curve;
pub mod day;
pub mod engine;
pub mod error;
pub mod habit;
pub mod heatmap;
pub mod icon;
pub mod serde_compat;

pub use book::{SkillBook, TimerToggle};
pub use collab::{AuthProvider, IdentityProvider, PersistenceStore, UserIdentity};
pub use constants::{HEATMAP_WEEKS, MAX_HEATMAP_WEEKS, MAX_LEVEL, STREAK_MILESTONES};
pub use cue::{Cue, Tone, tone_gain};
pub use curve::{ExperienceTable, build_experience_table, level_for_experience};
pub use day::{CalendarDay, Moment, format_duration};
pub use engine::{Progress, ProgressionEngine};
pub use error::{EngineError, Result};
pub use habit::{Habit, HabitId, HabitKind, HistoryEntry};
pub use heatmap::{Heatmap, HeatmapCell, completions_on, intensity};
pub use icon::SkillIcon;
pub use serde_compat::{CURRENT_VERSION, export_json, import_json};
