use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 2;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    conn.pragma_update(None, "wal_autocheckpoint", 100)?;

    // Non-fatal: in-memory and fresh databases have nothing to checkpoint.
    if conn
        .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .is_ok()
    {
        tracing::debug!("startup WAL checkpoint complete");
    }

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS habits (
            id                 TEXT PRIMARY KEY,
            position           INTEGER NOT NULL DEFAULT 0,
            name               TEXT NOT NULL,
            icon               TEXT NOT NULL DEFAULT 'attack',
            kind               TEXT NOT NULL DEFAULT 'daily',
            level              INTEGER NOT NULL DEFAULT 1,
            experience         INTEGER NOT NULL DEFAULT 0,
            experience_to_next INTEGER NOT NULL DEFAULT 83,
            streak             INTEGER NOT NULL DEFAULT 0,
            last_completed     TEXT,
            timer_started_ms   INTEGER,
            time_today_ms      INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS history (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id    TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            day         TEXT NOT NULL,
            experience  INTEGER NOT NULL,
            duration_ms INTEGER
        );

        CREATE TABLE IF NOT EXISTS focus (
            habit_id TEXT PRIMARY KEY REFERENCES habits(id) ON DELETE CASCADE,
            position INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_history_habit ON history(habit_id);
        CREATE INDEX IF NOT EXISTS idx_history_day ON history(day);
        ",
    )?;

    // v1 databases predate skill icons
    if conn.prepare("SELECT icon FROM habits LIMIT 0").is_err() {
        conn.execute_batch("ALTER TABLE habits ADD COLUMN icon TEXT NOT NULL DEFAULT 'attack';")?;
    }

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        for table in &["metadata", "habits", "history", "focus"] {
            let count: i64 = conn
                .query_row(&format!("SELECT count(*) FROM {table}"), [], |row| {
                    row.get(0)
                })
                .unwrap();
            assert_eq!(count, if *table == "metadata" { 1 } else { 0 });
        }
    }

    #[test]
    fn test_schema_version_set() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_idempotent_initialize() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }

    #[test]
    fn test_busy_timeout_set() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let timeout: i64 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 5000);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let err = conn.execute(
            "INSERT INTO history (habit_id, day, experience) VALUES ('ghost', '2026-10-19', 60)",
            [],
        );
        assert!(err.is_err(), "history rows must reference a habit");
    }

    #[test]
    fn test_upgrade_v1_adds_icon() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL);
            INSERT INTO metadata (key, value) VALUES ('schema_version', '1');
            CREATE TABLE habits (
                id TEXT PRIMARY KEY,
                position INTEGER NOT NULL DEFAULT 0,
                name TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT 'daily',
                level INTEGER NOT NULL DEFAULT 1,
                experience INTEGER NOT NULL DEFAULT 0,
                experience_to_next INTEGER NOT NULL DEFAULT 83,
                streak INTEGER NOT NULL DEFAULT 0,
                last_completed TEXT,
                timer_started_ms INTEGER,
                time_today_ms INTEGER NOT NULL DEFAULT 0
            );
            INSERT INTO habits (id, name) VALUES ('h1', 'Read');
            ",
        )
        .unwrap();

        initialize(&conn).unwrap();

        let icon: String = conn
            .query_row("SELECT icon FROM habits WHERE id = 'h1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(icon, "attack");
        assert_eq!(get_schema_version(&conn).unwrap(), Some(2));
    }
}
