//! The level curve: cumulative experience required for each level 1..=99.
//!
//! experience(L) = Σ_{n=1}^{L-1} ⌊(n + 300 · 2^(n/7)) / 4⌋
//!
//! Every quarter-term is floored on its own before it joins the sum, so
//! the table sits a few points under the textbook curve at higher levels.
//! Level 99 lands on 13,034,394.

use std::sync::LazyLock;

use crate::constants::{
    CURVE_DIVISOR, CURVE_DOUBLING, CURVE_MULTIPLIER, MAX_LEVEL, TABLE_LEN,
};

static STANDARD: LazyLock<ExperienceTable> = LazyLock::new(build_experience_table);

/// Level → cumulative experience, indexed 0..=99. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExperienceTable {
    entries: [u64; TABLE_LEN],
}

/// Build the canonical table. Pure and deterministic.
pub fn build_experience_table() -> ExperienceTable {
    let mut entries = [0u64; TABLE_LEN];
    let mut total = 0u64;

    for level in 2..TABLE_LEN {
        let n = (level - 1) as f64;
        let term = (n + CURVE_MULTIPLIER * 2f64.powf(n / CURVE_DOUBLING)) / CURVE_DIVISOR;
        total += term.floor() as u64;
        entries[level] = total;
    }

    ExperienceTable { entries }
}

/// Greatest level in 1..=99 whose threshold is at or below `xp`.
pub fn level_for_experience(table: &ExperienceTable, xp: u64) -> u8 {
    table.level_for(xp)
}

impl ExperienceTable {
    /// The process-wide canonical table.
    pub fn standard() -> &'static ExperienceTable {
        &STANDARD
    }

    pub fn entries(&self) -> &[u64; TABLE_LEN] {
        &self.entries
    }

    /// Cumulative experience to reach `level` (levels past 99 read as 99).
    pub fn experience_for(&self, level: u8) -> u64 {
        self.entries[level.min(MAX_LEVEL) as usize]
    }

    /// Scans from the top so that ties resolve to the level just reached.
    pub fn level_for(&self, xp: u64) -> u8 {
        (1..=MAX_LEVEL)
            .rev()
            .find(|&level| self.entries[level as usize] <= xp)
            .unwrap_or(1)
    }

    /// Remaining experience until `level + 1`; zero at the cap.
    pub fn experience_to_next(&self, level: u8, xp: u64) -> u64 {
        if level >= MAX_LEVEL {
            return 0;
        }
        self.experience_for(level + 1).saturating_sub(xp)
    }

    /// Progress through the current level as a percentage in 0..=100.
    pub fn progress_percent(&self, level: u8, xp: u64) -> f64 {
        if level >= MAX_LEVEL {
            return 100.0;
        }
        let floor = self.experience_for(level);
        let ceiling = self.experience_for(level + 1);
        let span = ceiling.saturating_sub(floor).max(1) as f64;
        let into = xp.saturating_sub(floor) as f64;
        (into / span * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_entries_are_zero() {
        let table = build_experience_table();
        assert_eq!(table.entries()[0], 0);
        assert_eq!(table.entries()[1], 0);
    }

    #[test]
    fn test_known_milestones() {
        let table = build_experience_table();
        assert_eq!(table.experience_for(2), 83);
        assert_eq!(table.experience_for(3), 174);
        assert_eq!(table.experience_for(4), 275);
        assert_eq!(table.experience_for(10), 1_151);
        assert_eq!(table.experience_for(50), 101_314);
        assert_eq!(table.experience_for(92), 6_517_219);
        assert_eq!(table.experience_for(99), 13_034_394);
    }

    #[test]
    fn test_terms_are_floored_individually() {
        let table = build_experience_table();
        let mut expected = 0u64;
        for level in 2..=MAX_LEVEL {
            let n = f64::from(level - 1);
            expected += ((n + 300.0 * 2f64.powf(n / 7.0)) / 4.0).floor() as u64;
            assert_eq!(table.experience_for(level), expected, "level {level}");
        }
    }

    #[test]
    fn test_non_decreasing() {
        let table = ExperienceTable::standard();
        for pair in table.entries().windows(2) {
            assert!(pair[0] <= pair[1], "{} > {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_boundary_exactness() {
        let table = ExperienceTable::standard();
        for level in 1..=MAX_LEVEL {
            assert_eq!(table.level_for(table.experience_for(level)), level);
        }
    }

    #[test]
    fn test_one_below_threshold_stays_lower() {
        let table = ExperienceTable::standard();
        for level in 2..=MAX_LEVEL {
            let xp = table.experience_for(level) - 1;
            assert_eq!(table.level_for(xp), level - 1);
        }
    }

    #[test]
    fn test_low_experience_is_level_one() {
        let table = ExperienceTable::standard();
        assert_eq!(level_for_experience(table, 0), 1);
        assert_eq!(level_for_experience(table, 82), 1);
    }

    #[test]
    fn test_huge_experience_caps_at_99() {
        let table = ExperienceTable::standard();
        assert_eq!(table.level_for(u64::MAX), MAX_LEVEL);
        assert_eq!(table.level_for(200_000_000), MAX_LEVEL);
    }

    #[test]
    fn test_experience_to_next() {
        let table = ExperienceTable::standard();
        assert_eq!(table.experience_to_next(1, 0), 83);
        assert_eq!(table.experience_to_next(1, 60), 23);
        assert_eq!(table.experience_to_next(MAX_LEVEL, 13_034_394), 0);
        assert_eq!(table.experience_to_next(MAX_LEVEL, 50_000_000), 0);
    }

    #[test]
    fn test_progress_percent() {
        let table = ExperienceTable::standard();
        assert_eq!(table.progress_percent(1, 0), 0.0);
        assert!((table.progress_percent(1, 83) - 100.0).abs() < 1e-9);
        assert!(table.progress_percent(2, 100) > 0.0);
        assert_eq!(table.progress_percent(MAX_LEVEL, 13_034_394), 100.0);
    }

    #[test]
    fn test_standard_is_shared() {
        let a = ExperienceTable::standard() as *const ExperienceTable;
        let b = ExperienceTable::standard() as *const ExperienceTable;
        assert_eq!(a, b);
        assert_eq!(*ExperienceTable::standard(), build_experience_table());
    }
}
