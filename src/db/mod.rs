//! Database layer for the Kanban API.

pub mod assignments;
pub mod boards;
pub mod cascade;
pub mod comments;
pub mod lists;
pub mod members;
pub mod positions;
pub mod projects;
pub mod tags;
pub mod tasks;
pub mod users;

use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;

        // WAL lets readers proceed while a transaction is writing
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;
        debug!(path = %path.as_ref().display(), "database opened");

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }

    /// Run database migrations.
    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.lock()?;
        let report = embedded::migrations::runner().run(&mut *conn)?;
        for migration in report.applied_migrations() {
            debug!(version = migration.version(), name = migration.name(), "migration applied");
        }
        Ok(())
    }

    /// Highest applied migration version, if any.
    pub fn schema_version(&self) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let version = conn.query_row(
                "SELECT MAX(version) FROM refinery_schema_history",
                [],
                |row| row.get(0),
            )?;
            Ok(version)
        })
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.lock()?;
        f(&mut conn)
    }
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a new time-ordered identifier.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Tables that may be probed by [`row_exists`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Table {
    Users,
    Projects,
    Boards,
    Lists,
    Tasks,
    Tags,
}

impl Table {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Projects => "projects",
            Table::Boards => "boards",
            Table::Lists => "lists",
            Table::Tasks => "tasks",
            Table::Tags => "tags",
        }
    }
}

/// Check whether a row with the given id exists.
pub(crate) fn row_exists(conn: &Connection, table: Table, id: &str) -> Result<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?1", table.name());
    let found = conn
        .query_row(&sql, params![id], |_| Ok(()))
        .optional()?
        .is_some();
    Ok(found)
}

/// Trim a required text field, rejecting blank input.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::ApiError::missing_field(field).into());
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_create_all_tables() {
        let db = Database::open_in_memory().unwrap();
        let tables: Vec<String> = db
            .with_conn(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table'
                     AND name NOT LIKE 'sqlite_%' AND name NOT LIKE 'refinery_%'
                     ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(names)
            })
            .unwrap();

        for expected in [
            "board_members",
            "boards",
            "lists",
            "projects",
            "task_assignments",
            "task_comments",
            "task_tags",
            "tags",
            "tasks",
            "users",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
        }
    }

    #[test]
    fn open_file_database_twice_reuses_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kanban.db");
        Database::open(&path).unwrap();
        let db = Database::open(&path).unwrap();
        assert!(db.with_conn(|conn| row_exists(conn, Table::Users, "nobody")).is_ok());
        assert_eq!(db.schema_version().unwrap(), Some(1));
    }

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("title", "  Todo ").unwrap(), "Todo");
        assert!(required_text("title", "   ").is_err());
    }
}
