//! Progression engine: the only code that changes a habit's experience.
//!
//! Every transition takes the habit by reference plus one sampled [`Moment`]
//! and returns the successor habit; nothing is mutated in place and nothing
//! reads the clock. Two award paths exist:
//!
//! - Daily: one completion per calendar day, reward grows quadratically with
//!   level. A second completion on the same day is a no-op.
//! - Timed: reward per minute of running timer, linear in level, any number
//!   of runs per day. Sub-minute runs only add to the day's time counter.

use crate::constants::{
    DAILY_BASE_XP, DAILY_LINEAR_XP, DAILY_QUADRATIC_XP, MAX_LEVEL, MS_PER_MINUTE,
    STREAK_MILESTONES, TIMED_BASE_XP_PER_MINUTE, TIMED_LEVEL_XP_PER_MINUTE,
};
use crate::curve::ExperienceTable;
use crate::day::{CalendarDay, Moment};
use crate::error::{EngineError, Result};
use crate::habit::{Habit, HabitKind, HistoryEntry};

/// Outcome of a completion or timer stop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub habit: Habit,
    pub experience_gained: u64,
    /// Set only when the level strictly increased.
    pub leveled_up_to: Option<u8>,
    /// Set when the streak moved onto one of the celebration lengths.
    pub streak_milestone: Option<u32>,
}

impl Progress {
    fn unchanged(habit: &Habit) -> Self {
        Self {
            habit: habit.clone(),
            experience_gained: 0,
            leveled_up_to: None,
            streak_milestone: None,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.experience_gained == 0
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ProgressionEngine<'t> {
    table: &'t ExperienceTable,
}

impl ProgressionEngine<'static> {
    /// Engine over the canonical curve.
    pub fn standard() -> Self {
        Self::new(ExperienceTable::standard())
    }
}

impl<'t> ProgressionEngine<'t> {
    pub fn new(table: &'t ExperienceTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'t ExperienceTable {
        self.table
    }

    /// ⌊50 + 10·L + 0.5·L²⌋
    pub fn daily_reward(level: u8) -> u64 {
        let l = f64::from(level);
        (DAILY_BASE_XP + l * DAILY_LINEAR_XP + l * l * DAILY_QUADRATIC_XP).floor() as u64
    }

    /// ⌊minutes · (10 + 2·L)⌋ with fractional minutes.
    pub fn timed_reward(level: u8, elapsed_ms: u64) -> u64 {
        let minutes = elapsed_ms as f64 / MS_PER_MINUTE;
        let rate = TIMED_BASE_XP_PER_MINUTE + f64::from(level) * TIMED_LEVEL_XP_PER_MINUTE;
        (minutes * rate).floor() as u64
    }

    /// Mark a daily habit done for `now.day`.
    pub fn complete_daily(&self, habit: &Habit, now: &Moment) -> Result<Progress> {
        habit.require_kind(HabitKind::Daily)?;
        if habit.is_completed_today(now.day) {
            return Ok(Progress::unchanged(habit));
        }

        let gained = Self::daily_reward(habit.level);
        let mut next = habit.clone();
        let leveled_up_to = self.award(&mut next, gained);
        let streak_milestone = advance_streak(&mut next, now.day);
        next.history.push(HistoryEntry {
            date: now.day,
            experience_gained: gained,
            duration_ms: None,
        });

        Ok(Progress {
            habit: next,
            experience_gained: gained,
            leveled_up_to,
            streak_milestone,
        })
    }

    /// Begin a timed run. No experience effect.
    pub fn start_timer(&self, habit: &Habit, now: &Moment) -> Result<Habit> {
        habit.require_kind(HabitKind::Timed)?;
        if habit.timer_started_at.is_some() {
            return Err(EngineError::TimerAlreadyRunning);
        }
        let mut next = habit.clone();
        next.timer_started_at = Some(now.instant);
        Ok(next)
    }

    /// End a timed run and award experience for its duration.
    pub fn stop_timer(&self, habit: &Habit, now: &Moment) -> Result<Progress> {
        habit.require_kind(HabitKind::Timed)?;
        let started = habit
            .timer_started_at
            .ok_or(EngineError::TimerNotRunning)?;

        let elapsed = now.elapsed_ms_since(started);
        let gained = Self::timed_reward(habit.level, elapsed);

        let mut next = habit.clone();
        next.timer_started_at = None;
        next.time_today_ms = next.time_today_ms.saturating_add(elapsed);

        if gained == 0 {
            return Ok(Progress {
                habit: next,
                experience_gained: 0,
                leveled_up_to: None,
                streak_milestone: None,
            });
        }

        let leveled_up_to = self.award(&mut next, gained);
        let streak_milestone = advance_streak(&mut next, now.day);
        next.history.push(HistoryEntry {
            date: now.day,
            experience_gained: gained,
            duration_ms: Some(elapsed),
        });

        Ok(Progress {
            habit: next,
            experience_gained: gained,
            leveled_up_to,
            streak_milestone,
        })
    }

    /// Experience a running timer would award if stopped at `now`.
    /// Zero for daily habits and idle timers. Never cached.
    pub fn pending_experience(&self, habit: &Habit, now: &Moment) -> u64 {
        match habit.timer_started_at {
            Some(started) if habit.kind == HabitKind::Timed => {
                Self::timed_reward(habit.level, now.elapsed_ms_since(started))
            }
            _ => 0,
        }
    }

    /// Add experience and re-derive level. Returns the new level on level-up.
    fn award(&self, habit: &mut Habit, gained: u64) -> Option<u8> {
        let previous = habit.level;
        habit.experience = habit.experience.saturating_add(gained);
        habit.level = self.table.level_for(habit.experience).min(MAX_LEVEL);
        habit.experience_to_next = self
            .table
            .experience_to_next(habit.level, habit.experience);
        (habit.level > previous).then_some(habit.level)
    }
}

/// Yesterday extends the streak; a same-day repeat (timed runs only) keeps
/// it; anything else, including "never", restarts at 1.
fn advance_streak(habit: &mut Habit, today: CalendarDay) -> Option<u32> {
    let previous = habit.streak;
    habit.streak = match habit.last_completed {
        Some(last) if last == today.pred() => previous.saturating_add(1),
        Some(last) if last == today => previous.max(1),
        _ => 1,
    };
    habit.last_completed = Some(today);

    (habit.streak != previous && STREAK_MILESTONES.contains(&habit.streak))
        .then_some(habit.streak)
}
