//! Feedback cues a presentation layer may render for engine events.
//!
//! The engine only says *that* something happened. Each cue carries the
//! vibration pattern and the square-wave tone the widget uses for it, so a
//! terminal, a phone, or a browser can all render the same event.

use serde::Serialize;

use crate::engine::Progress;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Cue {
    Click,
    Complete,
    LevelUp,
    Milestone,
    TimerStart,
    TimerStop,
}

/// Square-wave tone with an optional linear frequency ramp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tone {
    pub start_hz: f64,
    pub end_hz: Option<f64>,
    pub duration_secs: f64,
    pub decay_secs: f64,
}

/// Peak gain for a user volume; volume is clamped to 0..=1.
pub fn tone_gain(volume: f64) -> f64 {
    volume.clamp(0.0, 1.0) * 0.3
}

impl Cue {
    /// Vibrate/pause alternation in milliseconds.
    pub fn vibration(self) -> &'static [u32] {
        match self {
            Cue::Click => &[5],
            Cue::Complete => &[10, 50, 10],
            Cue::LevelUp => &[50, 30, 100, 30, 50],
            Cue::Milestone => &[30, 20, 30, 20, 100, 50, 100],
            Cue::TimerStart => &[20, 10, 20],
            Cue::TimerStop => &[30, 15, 15],
        }
    }

    pub fn tone(self) -> Tone {
        let (start_hz, end_hz, duration_secs, decay_secs) = match self {
            Cue::Click => (800.0, None, 0.05, 0.03),
            Cue::Complete => (600.0, Some(900.0), 0.15, 0.1),
            Cue::LevelUp => (400.0, Some(800.0), 0.4, 0.3),
            Cue::Milestone => (300.0, Some(900.0), 0.5, 0.4),
            Cue::TimerStart => (500.0, Some(700.0), 0.1, 0.05),
            Cue::TimerStop => (700.0, Some(400.0), 0.1, 0.05),
        };
        Tone {
            start_hz,
            end_hz,
            duration_secs,
            decay_secs,
        }
    }

    /// Cues for a daily completion, in playback order.
    pub fn for_completion(progress: &Progress) -> Vec<Cue> {
        let mut cues = vec![Cue::Complete];
        if progress.streak_milestone.is_some() {
            cues.push(Cue::Milestone);
        }
        if progress.leveled_up_to.is_some() {
            cues.push(Cue::LevelUp);
        }
        cues
    }

    /// Cues for a timer stop, in playback order.
    pub fn for_timer_stop(progress: &Progress) -> Vec<Cue> {
        let mut cues = vec![Cue::TimerStop];
        if progress.streak_milestone.is_some() {
            cues.push(Cue::Milestone);
        }
        if progress.leveled_up_to.is_some() {
            cues.push(Cue::LevelUp);
        }
        cues
    }
}
