use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use sb_core::{
    CalendarDay, Habit, HabitId, HabitKind, HistoryEntry, PersistenceStore, SkillBook, SkillIcon,
};

use crate::error::{Result, StoreError};
use crate::schema;

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete_metadata(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM metadata WHERE key = ?1", [key])?;
        Ok(rows > 0)
    }

    // --- Save ---

    /// Replace every habit, history row and focus entry with `book`.
    pub fn save_book(&self, book: &SkillBook) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute_batch("DELETE FROM focus; DELETE FROM history; DELETE FROM habits;")?;

        for (position, habit) in book.habits().iter().enumerate() {
            insert_habit_on(&tx, habit, position as i64)?;
            insert_history_on(&tx, habit)?;
        }
        for (position, id) in book.focus_ids().iter().enumerate() {
            tx.execute(
                "INSERT INTO focus (habit_id, position) VALUES (?1, ?2)",
                params![id.as_str(), position as i64],
            )?;
        }

        tx.commit()?;
        tracing::debug!(habits = book.len(), "saved skill book");
        Ok(())
    }

    /// Upsert a single habit and rewrite its history, keeping its position.
    pub fn save_habit(&self, habit: &Habit) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let position: Option<i64> = tx
            .query_row(
                "SELECT position FROM habits WHERE id = ?1",
                [habit.id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match position {
            Some(_) => update_habit_on(&tx, habit)?,
            None => {
                let next: i64 = tx.query_row(
                    "SELECT COALESCE(MAX(position) + 1, 0) FROM habits",
                    [],
                    |row| row.get(0),
                )?;
                insert_habit_on(&tx, habit, next)?;
            }
        }
        tx.execute(
            "DELETE FROM history WHERE habit_id = ?1",
            [habit.id.as_str()],
        )?;
        insert_history_on(&tx, habit)?;

        tx.commit()?;
        Ok(())
    }

    pub fn delete_habit(&self, id: &HabitId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM habits WHERE id = ?1", [id.as_str()])?;
        if rows == 0 {
            return Err(StoreError::InvalidData(format!("habit not found: {id}")));
        }
        Ok(())
    }

    pub fn save_focus(&self, focus: &[HabitId]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM focus", [])?;
        for (position, id) in focus.iter().enumerate() {
            tx.execute(
                "INSERT INTO focus (habit_id, position) VALUES (?1, ?2)",
                params![id.as_str(), position as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // --- Load ---

    pub fn load_book(&self) -> Result<SkillBook> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, icon, kind, level, experience, experience_to_next,
                    streak, last_completed, timer_started_ms, time_today_ms
             FROM habits ORDER BY position, rowid",
        )?;

        let rows: Vec<HabitRow> = stmt
            .query_map([], |row| {
                Ok(HabitRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    icon: row.get(2)?,
                    kind: row.get(3)?,
                    level: row.get(4)?,
                    experience: row.get(5)?,
                    experience_to_next: row.get(6)?,
                    streak: row.get(7)?,
                    last_completed: row.get(8)?,
                    timer_started_ms: row.get(9)?,
                    time_today_ms: row.get(10)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;

        let mut habits = Vec::with_capacity(rows.len());
        for row in rows {
            let history = self.load_history(&row.id)?;
            habits.push(row.into_habit(history)?);
        }

        let mut focus_stmt = self
            .conn
            .prepare("SELECT habit_id FROM focus ORDER BY position")?;
        let focus = focus_stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|id| id.map(HabitId::from_raw))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(SkillBook::from_parts(habits, focus))
    }

    fn load_history(&self, habit_id: &str) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT day, experience, duration_ms FROM history WHERE habit_id = ?1 ORDER BY id",
        )?;

        let rows: Vec<(String, i64, Option<i64>)> = stmt
            .query_map([habit_id], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<std::result::Result<_, _>>()?;

        rows.into_iter()
            .map(|(day, experience, duration_ms)| {
                Ok(HistoryEntry {
                    date: parse_day(&day)?,
                    experience_gained: from_i64(experience),
                    duration_ms: duration_ms.map(from_i64),
                })
            })
            .collect()
    }

    // --- Stats ---

    pub fn habit_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM habits", [], |row| row.get(0))?;
        Ok(from_i64(count))
    }

    pub fn history_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(from_i64(count))
    }

    /// Database size in bytes.
    pub fn db_size(&self) -> Result<u64> {
        let pages: i64 = self
            .conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let page_size: i64 = self
            .conn
            .query_row("PRAGMA page_size", [], |row| row.get(0))?;
        Ok(from_i64(pages.saturating_mul(page_size)))
    }

    /// Fold the WAL into the main database file and truncate it.
    pub fn checkpoint_truncate(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}

impl PersistenceStore for Store {
    type Error = StoreError;

    fn load_book(&self) -> Result<SkillBook> {
        Store::load_book(self)
    }

    fn save_book(&self, book: &SkillBook) -> Result<()> {
        Store::save_book(self, book)
    }
}

struct HabitRow {
    id: String,
    name: String,
    icon: String,
    kind: String,
    level: i64,
    experience: i64,
    experience_to_next: i64,
    streak: i64,
    last_completed: Option<String>,
    timer_started_ms: Option<i64>,
    time_today_ms: i64,
}

impl HabitRow {
    fn into_habit(self, history: Vec<HistoryEntry>) -> Result<Habit> {
        let kind = HabitKind::parse(&self.kind)
            .ok_or_else(|| StoreError::InvalidData(format!("unknown habit kind: {}", self.kind)))?;
        let icon = self
            .icon
            .parse::<SkillIcon>()
            .map_err(StoreError::InvalidData)?;
        let last_completed = self.last_completed.as_deref().map(parse_day).transpose()?;
        let timer_started_at = self
            .timer_started_ms
            .map(|ms| {
                DateTime::<Utc>::from_timestamp_millis(ms)
                    .ok_or_else(|| StoreError::InvalidData(format!("bad timer start: {ms}")))
            })
            .transpose()?;

        Ok(Habit {
            id: HabitId::from_raw(self.id),
            name: self.name,
            icon,
            kind,
            level: u8::try_from(self.level.clamp(1, i64::from(u8::MAX))).unwrap_or(1),
            experience: from_i64(self.experience),
            experience_to_next: from_i64(self.experience_to_next),
            streak: u32::try_from(self.streak.max(0)).unwrap_or(u32::MAX),
            last_completed,
            history,
            timer_started_at,
            time_today_ms: from_i64(self.time_today_ms),
        })
    }
}

fn insert_habit_on(conn: &Connection, habit: &Habit, position: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO habits (id, position, name, icon, kind, level, experience,
                             experience_to_next, streak, last_completed,
                             timer_started_ms, time_today_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            habit.id.as_str(),
            position,
            habit.name,
            habit.icon.label().to_ascii_lowercase(),
            habit.kind.as_str(),
            habit.level,
            to_i64(habit.experience),
            to_i64(habit.experience_to_next),
            habit.streak,
            habit.last_completed.map(|d| d.to_string()),
            habit.timer_started_at.map(|t| t.timestamp_millis()),
            to_i64(habit.time_today_ms),
        ],
    )?;
    Ok(())
}

fn update_habit_on(conn: &Connection, habit: &Habit) -> Result<()> {
    conn.execute(
        "UPDATE habits SET name = ?2, icon = ?3, kind = ?4, level = ?5, experience = ?6,
                           experience_to_next = ?7, streak = ?8, last_completed = ?9,
                           timer_started_ms = ?10, time_today_ms = ?11
         WHERE id = ?1",
        params![
            habit.id.as_str(),
            habit.name,
            habit.icon.label().to_ascii_lowercase(),
            habit.kind.as_str(),
            habit.level,
            to_i64(habit.experience),
            to_i64(habit.experience_to_next),
            habit.streak,
            habit.last_completed.map(|d| d.to_string()),
            habit.timer_started_at.map(|t| t.timestamp_millis()),
            to_i64(habit.time_today_ms),
        ],
    )?;
    Ok(())
}

fn insert_history_on(conn: &Connection, habit: &Habit) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO history (habit_id, day, experience, duration_ms) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for entry in &habit.history {
        stmt.execute(params![
            habit.id.as_str(),
            entry.date.to_string(),
            to_i64(entry.experience_gained),
            entry.duration_ms.map(to_i64),
        ])?;
    }
    Ok(())
}

fn parse_day(s: &str) -> Result<CalendarDay> {
    s.parse::<CalendarDay>()
        .map_err(|e| StoreError::InvalidData(format!("bad day '{s}': {e}")))
}

fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn from_i64(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}
