use std::fmt;

use crate::habit::{HabitId, HabitKind};

/// Caller contract violations. Expected edge cases (zero elapsed time,
/// experience at the cap, same-day repeats) are not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    WrongKind { expected: HabitKind, found: HabitKind },
    TimerAlreadyRunning,
    TimerNotRunning,
    EmptyName,
    UnknownHabit(String),
    AmbiguousHabit(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::WrongKind { expected, found } => {
                write!(f, "invalid operation: expected a {expected} skill, found {found}")
            }
            EngineError::TimerAlreadyRunning => write!(f, "invalid operation: timer already running"),
            EngineError::TimerNotRunning => write!(f, "invalid operation: timer not running"),
            EngineError::EmptyName => write!(f, "skill name must not be empty"),
            EngineError::UnknownHabit(key) => write!(f, "no skill matches '{key}'"),
            EngineError::AmbiguousHabit(key) => write!(f, "'{key}' matches more than one skill"),
        }
    }
}

impl std::error::Error for EngineError {}

impl EngineError {
    pub(crate) fn unknown(id: &HabitId) -> Self {
        EngineError::UnknownHabit(id.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
