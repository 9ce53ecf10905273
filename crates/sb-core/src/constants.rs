/// Highest attainable level.
pub const MAX_LEVEL: u8 = 99;

/// Entries in the experience table (levels 0..=99).
pub const TABLE_LEN: usize = MAX_LEVEL as usize + 1;

/// Growth constant of the curve: 300 · 2^(n / 7).
pub const CURVE_MULTIPLIER: f64 = 300.0;

/// Doubling period of the curve, in levels.
pub const CURVE_DOUBLING: f64 = 7.0;

/// Divisor applied to each term before it is floored.
pub const CURVE_DIVISOR: f64 = 4.0;

/// Daily completion: base experience before level scaling.
pub const DAILY_BASE_XP: f64 = 50.0;

/// Daily completion: linear per-level term.
pub const DAILY_LINEAR_XP: f64 = 10.0;

/// Daily completion: quadratic per-level term.
pub const DAILY_QUADRATIC_XP: f64 = 0.5;

/// Timed run: experience per minute before level scaling.
pub const TIMED_BASE_XP_PER_MINUTE: f64 = 10.0;

/// Timed run: extra experience per minute per level.
pub const TIMED_LEVEL_XP_PER_MINUTE: f64 = 2.0;

pub const MS_PER_MINUTE: f64 = 60_000.0;

/// Streak lengths (days) that warrant a celebration.
pub const STREAK_MILESTONES: [u32; 7] = [7, 14, 30, 60, 90, 180, 365];

/// Default heatmap span (~6 months).
pub const HEATMAP_WEEKS: u32 = 26;

/// Widest heatmap accepted (five years).
pub const MAX_HEATMAP_WEEKS: u32 = 260;
