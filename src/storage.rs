// Storage collaborator: the narrow SQL interface the table store runs on

use crate::config::{JournalMode, StoreConfig};
use crate::error::Result;
use crate::value::{Row, Value};
use parking_lot::Mutex;
use rusqlite::{Connection, params_from_iter};
use std::fs;
use std::time::Duration;
use tracing::{debug, info};

/// Outcome of a mutating statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertResult {
    pub last_insert_id: i64,
    pub changes: usize,
}

/// Minimal statement interface over a database connection
///
/// Parameters bind to positional `?` placeholders, left to right.
pub trait Storage: Send + Sync {
    /// Run DDL or pragma text without parameters
    fn execute(&self, sql: &str) -> Result<()>;

    /// Run a parameterized mutating statement
    fn run(&self, sql: &str, params: &[Value]) -> Result<InsertResult>;

    /// Run a parameterized query and collect every row
    fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;
}

/// SQLite-backed storage sharing a single connection
pub struct SqliteStorage {
    db: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database file named by `config`
    pub fn open(config: &StoreConfig) -> eyre::Result<Self> {
        use eyre::Context;

        if let Some(parent) = config.database.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("Failed to create database directory")?;
            }
        }

        let db = Connection::open(&config.database)
            .with_context(|| format!("Failed to open SQLite database at {}", config.database.display()))?;

        let storage = Self::from_connection(db);
        storage.configure(config).context("Failed to configure SQLite connection")?;

        info!(path = %config.database.display(), "Opened database");
        Ok(storage)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory()?;
        Ok(Self::from_connection(db))
    }

    pub fn from_connection(db: Connection) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn configure(&self, config: &StoreConfig) -> Result<()> {
        let db = self.db.lock();

        db.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        // journal_mode reports the mode actually in effect
        let mode: String = db.query_row(
            &format!("PRAGMA journal_mode = {}", config.journal_mode.as_pragma()),
            [],
            |row| row.get(0),
        )?;
        if config.journal_mode == JournalMode::Wal && !mode.eq_ignore_ascii_case("wal") {
            debug!(mode = %mode, "WAL journal mode not available, continuing");
        }

        db.execute_batch(if config.foreign_keys {
            "PRAGMA foreign_keys = ON"
        } else {
            "PRAGMA foreign_keys = OFF"
        })?;

        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn execute(&self, sql: &str) -> Result<()> {
        debug!(sql, "execute");
        self.db.lock().execute_batch(sql)?;
        Ok(())
    }

    fn run(&self, sql: &str, params: &[Value]) -> Result<InsertResult> {
        debug!(sql, params = params.len(), "run");
        let db = self.db.lock();
        let changes = db.execute(sql, params_from_iter(params.iter()))?;
        Ok(InsertResult {
            last_insert_id: db.last_insert_rowid(),
            changes,
        })
    }

    fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        debug!(sql, params = params.len(), "query_all");
        let db = self.db.lock();
        let mut stmt = db.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (i, name) in names.iter().enumerate() {
                record.insert(name.clone(), row.get::<_, Value>(i)?);
            }
            results.push(record);
        }

        Ok(results)
    }
}
