//! Activity heatmap: how many skills earned experience on each day.

use chrono::Datelike;
use serde::Serialize;

use crate::constants::MAX_HEATMAP_WEEKS;
use crate::day::CalendarDay;
use crate::habit::Habit;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Habits with at least one history entry on `day`.
pub fn completions_on(habits: &[Habit], day: CalendarDay) -> usize {
    habits
        .iter()
        .filter(|h| h.history.iter().any(|entry| entry.date == day))
        .count()
}

/// Bucket a day's completions into 0..=4 relative to the number of habits.
pub fn intensity(completions: usize, habit_count: usize) -> u8 {
    if completions == 0 {
        return 0;
    }
    let ratio = completions as f64 / habit_count.max(1) as f64;
    if ratio <= 0.25 {
        1
    } else if ratio <= 0.5 {
        2
    } else if ratio <= 0.75 {
        3
    } else {
        4
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HeatmapCell {
    pub day: CalendarDay,
    pub completions: usize,
    pub intensity: u8,
    pub is_today: bool,
    pub is_future: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthLabel {
    pub column: usize,
    pub name: &'static str,
}

/// Week columns (Sunday first), oldest on the left; the last column holds today.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Heatmap {
    pub weeks: Vec<Vec<HeatmapCell>>,
    pub month_labels: Vec<MonthLabel>,
}

impl Heatmap {
    /// `weeks` is clamped to 1..=MAX_HEATMAP_WEEKS.
    pub fn build(habits: &[Habit], today: CalendarDay, weeks: u32) -> Self {
        let weeks = i64::from(weeks.clamp(1, MAX_HEATMAP_WEEKS));
        let weekday = i64::from(today.date().weekday().num_days_from_sunday());
        let start = today.offset(-weekday - (weeks - 1) * 7);

        let columns: Vec<Vec<HeatmapCell>> = (0..weeks)
            .map(|w| {
                (0..7)
                    .map(|d| {
                        let day = start.offset(w * 7 + d);
                        let is_future = day > today;
                        let completions = if is_future {
                            0
                        } else {
                            completions_on(habits, day)
                        };
                        HeatmapCell {
                            day,
                            completions,
                            intensity: intensity(completions, habits.len()),
                            is_today: day == today,
                            is_future,
                        }
                    })
                    .collect()
            })
            .collect();

        let mut month_labels = Vec::new();
        let mut last_month = None;
        for (column, week) in columns.iter().enumerate() {
            let month = week[0].day.date().month0() as usize;
            if last_month != Some(month) {
                month_labels.push(MonthLabel {
                    column,
                    name: MONTHS[month],
                });
                last_month = Some(month);
            }
        }

        Self {
            weeks: columns,
            month_labels,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = &HeatmapCell> {
        self.weeks.iter().flatten()
    }

    /// Days in range with at least one completion.
    pub fn active_days(&self) -> usize {
        self.cells().filter(|c| c.completions > 0).count()
    }
}
