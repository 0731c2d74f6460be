// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod writer;

pub use writer::SnapshotWriter;

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use worktravel_app::{CompletedSet, ListMode, Snapshot, ToDoCollection, ToDoId, ToDoItem};

pub const APP_NAME: &str = "worktravel";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("records", &["key", "value", "seq", "updated_at"]),
    ("write_state", &["id", "last_seq"]),
];

const DEMO_ITEMS: [(&str, ListMode, bool); 6] = [
    ("Ship release notes", ListMode::Work, false),
    ("1:1 with Sam", ListMode::Work, true),
    ("Fix flaky CI job", ListMode::Work, false),
    ("Book train to Porto", ListMode::Travel, false),
    ("Renew passport", ListMode::Travel, true),
    ("Find a ryokan in Kyoto", ListMode::Travel, false),
];
const DEMO_BASE_ID: i64 = 1_700_000_000_000;

/// Fixed record names, one per independently loaded piece of state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKey {
    Mode,
    ToDos,
    Completed,
}

impl RecordKey {
    pub const ALL: [Self; 3] = [Self::Mode, Self::ToDos, Self::Completed];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mode => "navState",
            Self::ToDos => "@toDos",
            Self::Completed => "@completedToDos",
        }
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        }
        self.conn
            .execute_batch(include_str!("sql/schema.sql"))
            .context("create schema")?;
        Ok(())
    }

    pub fn get_record(&self, key: RecordKey) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM records WHERE key = ?",
                params![key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("load record {}", key.as_str()))
    }

    /// Writes one record outside the snapshot sequence. Meant for imports
    /// and diagnostics; the app itself goes through [`Store::save_snapshot`].
    pub fn put_record(&self, key: RecordKey, value: &str) -> Result<()> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO records (key, value, seq, updated_at)
                VALUES (?, ?, 0, ?)
                ON CONFLICT(key) DO UPDATE SET
                  value = excluded.value,
                  updated_at = excluded.updated_at
                ",
                params![key.as_str(), value, now],
            )
            .with_context(|| format!("upsert record {}", key.as_str()))?;
        Ok(())
    }

    pub fn load_mode(&self) -> Result<ListMode> {
        let raw = self.get_record(RecordKey::Mode)?;
        Ok(ListMode::parse_stored(raw.as_deref()))
    }

    pub fn load_todos(&self) -> Result<ToDoCollection> {
        match self.get_record(RecordKey::ToDos)? {
            Some(raw) => decode_todos(&raw)
                .with_context(|| format!("decode record {}", RecordKey::ToDos.as_str())),
            None => Ok(ToDoCollection::new()),
        }
    }

    pub fn load_completed(&self) -> Result<CompletedSet> {
        match self.get_record(RecordKey::Completed)? {
            Some(raw) => decode_completed(&raw)
                .with_context(|| format!("decode record {}", RecordKey::Completed.as_str())),
            None => Ok(CompletedSet::new()),
        }
    }

    pub fn last_applied_seq(&self) -> Result<u64> {
        let last: i64 = self
            .conn
            .query_row(
                "SELECT last_seq FROM write_state WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .context("load last applied write sequence")?;
        u64::try_from(last).map_err(|_| anyhow!("write sequence {last} is negative"))
    }

    /// Writes the records flagged in `snapshot.parts` in one transaction;
    /// unflagged records keep their stored value. Returns `false` without
    /// touching anything when `seq` is not newer than the last applied write.
    pub fn save_snapshot(&self, seq: u64, snapshot: &Snapshot) -> Result<bool> {
        let seq = i64::try_from(seq).map_err(|_| anyhow!("write sequence {seq} is too large"))?;
        let todos = encode_todos(&snapshot.todos)?;
        let completed = encode_completed(&snapshot.completed)?;
        let now = now_rfc3339()?;

        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin snapshot transaction")?;
        let last: i64 = tx
            .query_row(
                "SELECT last_seq FROM write_state WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .context("load last applied write sequence")?;
        if seq <= last {
            return Ok(false);
        }

        let parts = snapshot.parts;
        for (key, value, _) in [
            (RecordKey::Mode, snapshot.mode.as_str(), parts.mode),
            (RecordKey::ToDos, todos.as_str(), parts.todos),
            (RecordKey::Completed, completed.as_str(), parts.completed),
        ]
        .into_iter()
        .filter(|(_, _, writable)| *writable)
        {
            tx.execute(
                "
                INSERT INTO records (key, value, seq, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                  value = excluded.value,
                  seq = excluded.seq,
                  updated_at = excluded.updated_at
                ",
                params![key.as_str(), value, seq, now],
            )
            .with_context(|| format!("write record {}", key.as_str()))?;
        }
        tx.execute(
            "UPDATE write_state SET last_seq = ? WHERE id = 1",
            params![seq],
        )
        .context("advance write sequence")?;
        tx.commit().context("commit snapshot transaction")?;
        Ok(true)
    }

    pub fn seed_demo_data(&self) -> Result<()> {
        let mut snapshot = Snapshot::default();
        for (offset, (text, mode, done)) in (0_i64..).zip(DEMO_ITEMS) {
            let id = ToDoId::new(DEMO_BASE_ID + offset);
            snapshot.todos.insert(id, ToDoItem::new(text, mode));
            if done {
                snapshot.completed.insert(id);
            }
        }
        let seq = self.last_applied_seq()? + 1;
        self.save_snapshot(seq, &snapshot)?;
        Ok(())
    }
}

pub fn encode_todos(todos: &ToDoCollection) -> Result<String> {
    serde_json::to_string(todos).context("encode to-do collection")
}

pub fn decode_todos(raw: &str) -> Result<ToDoCollection> {
    serde_json::from_str(raw).context("parse to-do collection JSON")
}

pub fn encode_completed(completed: &CompletedSet) -> Result<String> {
    let flags = completed
        .iter()
        .map(|id| (*id, true))
        .collect::<BTreeMap<ToDoId, bool>>();
    serde_json::to_string(&flags).context("encode completed set")
}

/// Only keys mapped to `true` count as completed.
pub fn decode_completed(raw: &str) -> Result<CompletedSet> {
    let flags: BTreeMap<ToDoId, serde_json::Value> =
        serde_json::from_str(raw).context("parse completed set JSON")?;
    Ok(flags
        .into_iter()
        .filter(|(_, value)| value.as_bool() == Some(true))
        .map(|(id, _)| id)
        .collect())
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("WORKTRAVEL_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set WORKTRAVEL_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("worktravel.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        let columns = table_columns(conn, table)?;
        if columns.is_empty() {
            bail!(
                "database is missing required table `{table}`; point [storage].db_path at a worktravel database"
            );
        }

        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; move the file aside to start fresh",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

#[cfg(test)]
mod tests {
    use super::{RecordKey, decode_completed, encode_completed, validate_db_path};
    use anyhow::Result;
    use worktravel_app::{CompletedSet, ToDoId};

    #[test]
    fn record_names_are_distinct() {
        let names = RecordKey::ALL.map(RecordKey::as_str);
        assert_eq!(names, ["navState", "@toDos", "@completedToDos"]);
    }

    #[test]
    fn completed_set_encodes_as_true_flags() -> Result<()> {
        let completed = CompletedSet::from([ToDoId::new(10), ToDoId::new(2)]);
        let raw = encode_completed(&completed)?;
        assert_eq!(raw, r#"{"2":true,"10":true}"#);
        assert_eq!(decode_completed(&raw)?, completed);
        Ok(())
    }

    #[test]
    fn completed_set_ignores_false_and_non_bool_flags() -> Result<()> {
        let decoded = decode_completed(r#"{"1":true,"2":false,"3":"yes"}"#)?;
        assert_eq!(decoded, CompletedSet::from([ToDoId::new(1)]));
        Ok(())
    }

    #[test]
    fn validate_db_path_accepts_memory_and_plain_paths() {
        assert!(validate_db_path(":memory:").is_ok());
        assert!(validate_db_path("/tmp/worktravel.db").is_ok());
        assert!(validate_db_path("").is_err());
    }
}
