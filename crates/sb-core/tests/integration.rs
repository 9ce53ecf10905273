//! Cross-module scenarios: book + engine + heatmap + wire format.

use chrono::{FixedOffset, TimeZone, Utc};
use proptest::prelude::*;
use sb_core::{
    CalendarDay, Cue, ExperienceTable, HabitKind, Heatmap, MAX_LEVEL, Moment, ProgressionEngine,
    SkillBook, SkillIcon, TimerToggle, export_json, import_json, level_for_experience,
};

fn at(day: u32, hour: u32, minute: u32) -> Moment {
    Moment::at(&Utc.with_ymd_and_hms(2026, 10, day, hour, minute, 0).unwrap())
}

/// Test 1: A week of daily completions builds a streak, levels up, and
/// crosses the first milestone on day seven.
#[test]
fn week_of_daily_completions() {
    let mut book = SkillBook::new();
    let id = book
        .create("Stretch", SkillIcon::Agility, HabitKind::Daily)
        .unwrap()
        .id
        .clone();

    let mut milestones = Vec::new();
    let mut level_ups = Vec::new();
    for day in 12..=18 {
        let progress = book.complete(&id, &at(day, 7, 30)).unwrap();
        if let Some(m) = progress.streak_milestone {
            milestones.push(m);
        }
        if let Some(l) = progress.leveled_up_to {
            level_ups.push(l);
        }
        // a second tap the same evening changes nothing
        let repeat = book.complete(&id, &at(day, 21, 0)).unwrap();
        assert_eq!(repeat.experience_gained, 0);
    }

    let habit = book.get(&id).unwrap();
    assert_eq!(habit.streak, 7);
    assert_eq!(habit.history.len(), 7);
    assert_eq!(milestones, vec![7]);
    assert!(!level_ups.is_empty());
    assert_eq!(
        habit.level,
        level_for_experience(ExperienceTable::standard(), habit.experience)
    );
}

/// Test 2: Timed sessions with a live preview that never mutates.
#[test]
fn timed_session_with_live_preview() {
    let mut book = SkillBook::new();
    let id = book
        .create("Piano", SkillIcon::Crafting, HabitKind::Timed)
        .unwrap()
        .id
        .clone();

    assert!(matches!(
        book.toggle_timer(&id, &at(19, 18, 0)).unwrap(),
        TimerToggle::Started(_)
    ));

    let before = book.clone();
    let mut last = 0;
    for minute in [1, 5, 10, 25] {
        let pending = book.pending_experience(&id, &at(19, 18, minute)).unwrap();
        assert!(pending >= last);
        last = pending;
    }
    assert_eq!(book, before, "preview must not mutate");

    let TimerToggle::Stopped(progress) = book.toggle_timer(&id, &at(19, 18, 25)).unwrap() else {
        panic!("expected the timer to stop");
    };
    assert_eq!(progress.experience_gained, last);
    assert_eq!(Cue::for_timer_stop(&progress)[0], Cue::TimerStop);
    assert_eq!(book.get(&id).unwrap().time_today_ms, 25 * 60_000);
}

/// Test 3: Calendar day follows the caller's zone, not UTC.
#[test]
fn completion_day_in_local_zone() {
    let engine = ProgressionEngine::standard();
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    let mut book = SkillBook::new();
    let id = book
        .create("Journal", SkillIcon::Prayer, HabitKind::Daily)
        .unwrap()
        .id
        .clone();
    let habit = book.get(&id).unwrap().clone();

    // 23:00 UTC on the 18th is already the 19th in Tokyo
    let late_utc = tokyo.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
    let first = engine.complete_daily(&habit, &Moment::at(&late_utc)).unwrap();
    assert_eq!(first.habit.last_completed, CalendarDay::from_ymd(2026, 10, 19));

    let same_local_day = tokyo.with_ymd_and_hms(2026, 10, 19, 23, 0, 0).unwrap();
    let second = engine
        .complete_daily(&first.habit, &Moment::at(&same_local_day))
        .unwrap();
    assert_eq!(second.experience_gained, 0);
}

/// Test 4: Heatmap reflects completions across the book.
#[test]
fn heatmap_after_activity() {
    let mut book = SkillBook::new();
    let a = book
        .create("A", SkillIcon::Attack, HabitKind::Daily)
        .unwrap()
        .id
        .clone();
    let b = book
        .create("B", SkillIcon::Strength, HabitKind::Daily)
        .unwrap()
        .id
        .clone();
    book.complete(&a, &at(18, 9, 0)).unwrap();
    book.complete(&a, &at(19, 9, 0)).unwrap();
    book.complete(&b, &at(19, 9, 0)).unwrap();

    let today = CalendarDay::from_ymd(2026, 10, 19).unwrap();
    let map = Heatmap::build(book.habits(), today, 4);
    let cell = |d: CalendarDay| map.cells().find(|c| c.day == d).unwrap().clone();

    assert_eq!(cell(today).completions, 2);
    assert_eq!(cell(today).intensity, 4);
    assert_eq!(cell(today.pred()).completions, 1);
    assert_eq!(cell(today.pred()).intensity, 2);
    assert_eq!(map.active_days(), 2);
}

/// Test 5: A book survives export → import, focus list included.
#[test]
fn export_import_keeps_progress() {
    let mut book = SkillBook::new();
    let id = book
        .create("Cook", SkillIcon::Cooking, HabitKind::Daily)
        .unwrap()
        .id
        .clone();
    book.complete(&id, &at(19, 12, 0)).unwrap();
    book.focus(&id);

    let restored = import_json(&export_json(&book).unwrap()).unwrap();
    assert_eq!(restored.focused().len(), 1);
    assert_eq!(restored.get(&id).unwrap().experience, 60);
}

proptest! {
    /// Level is always consistent with experience and never leaves 1..=99.
    #[test]
    fn level_matches_table(xp in 0u64..20_000_000) {
        let table = ExperienceTable::standard();
        let level = table.level_for(xp);
        prop_assert!((1..=MAX_LEVEL).contains(&level));
        prop_assert!(table.experience_for(level) <= xp);
        if level < MAX_LEVEL {
            prop_assert!(table.experience_for(level + 1) > xp);
        }
    }

    /// Experience never decreases across any sequence of daily completions.
    #[test]
    fn daily_experience_monotone(days in proptest::collection::vec(1u32..=28, 1..20)) {
        let engine = ProgressionEngine::standard();
        let mut habit = sb_core::Habit::new("p", SkillIcon::Attack, HabitKind::Daily).unwrap();
        for day in days {
            let next = engine.complete_daily(&habit, &at(day, 12, 0)).unwrap().habit;
            prop_assert!(next.experience >= habit.experience);
            prop_assert!(next.history.len() >= habit.history.len());
            habit = next;
        }
    }

    /// Pending experience is non-decreasing in "now".
    #[test]
    fn pending_non_decreasing(a in 0u32..59, b in 0u32..59) {
        let engine = ProgressionEngine::standard();
        let habit = sb_core::Habit::new("t", SkillIcon::Mining, HabitKind::Timed).unwrap();
        let running = engine.start_timer(&habit, &at(19, 10, 0)).unwrap();
        let (lo, hi) = (a.min(b), a.max(b));
        let early = engine.pending_experience(&running, &at(19, 11, lo));
        let late = engine.pending_experience(&running, &at(19, 11, hi));
        prop_assert!(early <= late);
    }
}
