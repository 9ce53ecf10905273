//! Calendar-day arithmetic and the per-operation "now" value.
//!
//! Completion and streak rules work at day granularity. The day is taken in
//! the caller's time zone, then every comparison is plain date arithmetic.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A day-granularity identity; time of day is discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// The previous calendar day.
    pub fn pred(self) -> Self {
        Self(self.0.pred_opt().unwrap_or(self.0))
    }

    /// The next calendar day.
    pub fn succ(self) -> Self {
        Self(self.0.succ_opt().unwrap_or(self.0))
    }

    /// Shift by a signed number of days (saturating at the calendar bounds).
    pub fn offset(self, days: i64) -> Self {
        let shifted = self
            .0
            .checked_add_signed(chrono::Duration::days(days))
            .unwrap_or(self.0);
        Self(shifted)
    }

    /// Days from `earlier` to `self` (negative when `earlier` is later).
    pub fn days_since(self, earlier: CalendarDay) -> i64 {
        (self.0 - earlier.0).num_days()
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CalendarDay {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Self)
    }
}

/// "Now", sampled once per operation and passed by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Moment {
    pub instant: DateTime<Utc>,
    pub day: CalendarDay,
}

impl Moment {
    /// Take the instant and the calendar day as seen from `at`'s time zone.
    pub fn at<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self {
            instant: at.with_timezone(&Utc),
            day: CalendarDay(at.date_naive()),
        }
    }

    pub fn now_local() -> Self {
        Self::at(&Local::now())
    }

    /// Milliseconds from `start` to this moment, clamped at zero.
    pub fn elapsed_ms_since(&self, start: DateTime<Utc>) -> u64 {
        let ms = (self.instant - start).num_milliseconds();
        u64::try_from(ms).unwrap_or(0)
    }
}

/// Render a duration as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_duration(ms: u64) -> String {
    let seconds = (ms / 1000) % 60;
    let minutes = (ms / 60_000) % 60;
    let hours = ms / 3_600_000;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
