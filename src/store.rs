// Table store: schema and data operations over a shared SQLite connection

use crate::bus::{ChangeBus, ChangeEvent, ChangeKind};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::filter::{Filter, Sort};
use crate::predicate::{order_by, translate, validate_identifier};
use crate::schema::{ADDED_COLUMN, ColumnDef, ColumnInfo, ColumnSpec, TableInfo};
use crate::storage::{InsertResult, SqliteStorage, Storage};
use crate::value::{Row, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Table store publishing a change event after every successful mutation
///
/// Every table and column name is interpolated into SQL text and must be a
/// plain identifier; values are always bound as parameters.
pub struct TableStore {
    storage: Arc<dyn Storage>,
    bus: Arc<ChangeBus>,
}

impl TableStore {
    pub fn new(storage: Arc<dyn Storage>, bus: Arc<ChangeBus>) -> Self {
        Self { storage, bus }
    }

    /// Open the SQLite database named by `config` with a fresh change bus
    pub fn open(config: &StoreConfig) -> eyre::Result<Self> {
        let storage = SqliteStorage::open(config)?;
        Ok(Self::new(Arc::new(storage), Arc::new(ChangeBus::new())))
    }

    /// In-memory store, mostly useful in tests and demos
    pub fn open_in_memory() -> Result<Self> {
        let storage = SqliteStorage::open_in_memory()?;
        Ok(Self::new(Arc::new(storage), Arc::new(ChangeBus::new())))
    }

    pub fn bus(&self) -> &Arc<ChangeBus> {
        &self.bus
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    // ========================================================================
    // Schema operations
    // ========================================================================

    /// Create a table if it does not exist yet
    ///
    /// The reserved `added INTEGER` column is always declared; a caller-supplied
    /// `added` declaration is overridden.
    pub fn create_table(&self, name: &str, columns: &ColumnSpec) -> Result<()> {
        validate_identifier(name)?;

        let mut columns = columns.clone();
        columns.set(ADDED_COLUMN, ColumnDef::integer());

        let mut defs = Vec::with_capacity(columns.len());
        for (column, def) in columns.iter() {
            validate_identifier(column)?;
            defs.push(format!("{} {}", column, def.to_sql()));
        }

        let sql = format!("CREATE TABLE IF NOT EXISTS {} ({})", name, defs.join(", "));
        self.storage.execute(&sql)?;
        info!(table = name, columns = columns.len(), "Created table");

        self.bus.publish(&ChangeEvent::new(name, ChangeKind::CreateTable));
        Ok(())
    }

    /// Add columns one `ALTER TABLE` at a time
    ///
    /// Not atomic: if a later column fails, the earlier ones stay added.
    pub fn add_columns(&self, name: &str, columns: &ColumnSpec) -> Result<()> {
        validate_identifier(name)?;

        for (column, def) in columns.iter() {
            validate_identifier(column)?;
            let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", name, column, def.to_sql());
            self.storage.execute(&sql)?;
            info!(table = name, column, "Added column");
        }

        Ok(())
    }

    /// Create `idx_<table>_<column>` if it does not exist yet
    pub fn create_index(&self, name: &str, column: &str) -> Result<()> {
        validate_identifier(name)?;
        validate_identifier(column)?;

        let sql = format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {} ({})",
            name, column, name, column
        );
        self.storage.execute(&sql)?;
        debug!(table = name, column, "Ensured index");
        Ok(())
    }

    /// Every table, view and shadow table SQLite knows about
    pub fn get_all_tables(&self) -> Result<Vec<TableInfo>> {
        let rows = self.storage.query_all("PRAGMA table_list", &[])?;
        rows.iter().map(TableInfo::from_row).collect()
    }

    /// Column list of `name`; empty if the table does not exist
    pub fn get_table_schema(&self, name: &str) -> Result<Vec<ColumnInfo>> {
        validate_identifier(name)?;
        let rows = self.storage.query_all(&format!("PRAGMA table_info({})", name), &[])?;
        rows.iter().map(ColumnInfo::from_row).collect()
    }

    /// True if every expected column exists in the live schema of `name`
    pub fn validate_schema(&self, name: &str, expected: &[&str]) -> Result<bool> {
        if expected.is_empty() {
            return Err(Error::EmptySchema { table: name.to_string() });
        }

        let existing = self.get_table_schema(name)?;
        Ok(expected
            .iter()
            .all(|column| existing.iter().any(|info| info.name == *column)))
    }

    /// Publishes `DropTable` before the table is dropped, so observers run
    /// while the table still exists.
    pub fn drop_table(&self, name: &str) -> Result<()> {
        validate_identifier(name)?;

        self.bus.publish(&ChangeEvent::new(name, ChangeKind::DropTable));
        self.storage.execute(&format!("DROP TABLE IF EXISTS {}", name))?;
        info!(table = name, "Dropped table");
        Ok(())
    }

    // ========================================================================
    // Data operations
    // ========================================================================

    /// Insert a row, stamping `added` with the current time in milliseconds
    pub fn insert(&self, name: &str, mut data: Row) -> Result<InsertResult> {
        validate_identifier(name)?;

        data.insert(ADDED_COLUMN, now_ms());

        let mut columns = Vec::with_capacity(data.len());
        for column in data.columns() {
            validate_identifier(column)?;
            columns.push(column);
        }
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            name,
            columns.join(", "),
            placeholders
        );
        let params: Vec<Value> = data.values().cloned().collect();

        let result = self.storage.run(&sql, &params)?;
        debug!(table = name, id = result.last_insert_id, "Inserted row");

        self.bus.publish(&ChangeEvent::new(name, ChangeKind::Insert));
        Ok(result)
    }

    /// Update matching rows and return how many changed
    ///
    /// An `Update` event carrying `data` is published even when nothing matched.
    pub fn update(&self, name: &str, filter: &Filter, data: Row) -> Result<usize> {
        validate_identifier(name)?;

        let mut assignments = Vec::with_capacity(data.len());
        for column in data.columns() {
            validate_identifier(column)?;
            assignments.push(format!("{} = ?", column));
        }
        let predicate = translate(filter)?;

        let sql = statement(&[
            format!("UPDATE {} SET {}", name, assignments.join(", ")),
            predicate.where_clause(),
        ]);
        let mut params: Vec<Value> = data.values().cloned().collect();
        params.extend(predicate.params);

        let result = self.storage.run(&sql, &params)?;
        debug!(table = name, changes = result.changes, "Updated rows");

        self.bus
            .publish(&ChangeEvent::new(name, ChangeKind::Update).with_data(data));
        Ok(result.changes)
    }

    /// Delete matching rows and return how many were removed
    ///
    /// An empty filter deletes every row in the table.
    pub fn delete(&self, name: &str, filter: &Filter) -> Result<usize> {
        validate_identifier(name)?;

        let predicate = translate(filter)?;
        let sql = statement(&[format!("DELETE FROM {}", name), predicate.where_clause()]);

        let result = self.storage.run(&sql, &predicate.params)?;
        debug!(table = name, changes = result.changes, "Deleted rows");

        self.bus.publish(&ChangeEvent::new(name, ChangeKind::Delete));
        Ok(result.changes)
    }

    /// Select rows; an empty column list selects `*`
    ///
    /// Rows are keyed by column name, so a projection naming the same column
    /// twice is rejected.
    pub fn select(&self, name: &str, columns: &[&str], filter: &Filter, sort: &Sort) -> Result<Vec<Row>> {
        validate_identifier(name)?;

        let projection = if columns.is_empty() {
            "*".to_string()
        } else {
            for (i, column) in columns.iter().enumerate() {
                if *column != "*" {
                    validate_identifier(column)?;
                }
                if columns[..i].contains(column) {
                    return Err(Error::DuplicateColumn {
                        column: column.to_string(),
                    });
                }
            }
            columns.join(", ")
        };
        let predicate = translate(filter)?;

        let sql = statement(&[
            format!("SELECT {} FROM {}", projection, name),
            predicate.where_clause(),
            order_by(sort)?,
        ]);

        self.storage.query_all(&sql, &predicate.params)
    }
}

/// Join non-empty statement parts with single spaces
fn statement(parts: &[String]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Current time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Subscription;
    use crate::schema::ColumnType;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn notes_store() -> TableStore {
        let store = TableStore::open_in_memory().unwrap();
        store
            .create_table(
                "notes",
                &ColumnSpec::new()
                    .column("id", ColumnDef::integer().primary_key())
                    .column("title", ColumnType::Text)
                    .column("status", ColumnType::Text)
                    .column("priority", ColumnType::Integer),
            )
            .unwrap();
        store
    }

    fn record_events(store: &TableStore, table: &str) -> (Arc<Mutex<Vec<ChangeEvent>>>, Subscription) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = Arc::clone(&events);
        let sub = store
            .bus()
            .subscribe(table, move |event| events_clone.lock().push(event.clone()));
        (events, sub)
    }

    fn titles(rows: &[Row]) -> Vec<String> {
        rows.iter()
            .map(|row| row.get("title").and_then(Value::as_str).unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_store_open_creates_database() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig {
            database: temp.path().join("data/notes.db"),
            ..StoreConfig::default()
        };

        let store = TableStore::open(&config).unwrap();
        store.create_table("notes", &ColumnSpec::new().column("title", ColumnType::Text)).unwrap();
        assert!(config.database.exists());

        // Reopen and find the table again
        drop(store);
        let store = TableStore::open(&config).unwrap();
        assert!(store.validate_schema("notes", &["title", "added"]).unwrap());
    }

    #[test]
    fn test_create_table_adds_reserved_column() {
        let store = notes_store();
        let schema = store.get_table_schema("notes").unwrap();
        let names: Vec<&str> = schema.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "title", "status", "priority", "added"]);

        let added = schema.iter().find(|c| c.name == "added").unwrap();
        assert_eq!(added.declared_type, "INTEGER");
        assert_eq!(schema[0].pk, 1);
    }

    #[test]
    fn test_create_table_overrides_supplied_added() {
        let store = TableStore::open_in_memory().unwrap();
        store
            .create_table(
                "logs",
                &ColumnSpec::new().column("added", ColumnType::Text).column("line", ColumnType::Text),
            )
            .unwrap();

        let schema = store.get_table_schema("logs").unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema[0].name, "added");
        assert_eq!(schema[0].declared_type, "INTEGER");
    }

    #[test]
    fn test_create_table_is_idempotent() {
        let store = notes_store();
        let spec = ColumnSpec::new()
            .column("id", ColumnDef::integer().primary_key())
            .column("title", ColumnType::Text)
            .column("status", ColumnType::Text)
            .column("priority", ColumnType::Integer);

        store.create_table("notes", &spec).unwrap();
        store.create_table("notes", &spec).unwrap();

        assert_eq!(store.get_table_schema("notes").unwrap().len(), 5);
    }

    #[test]
    fn test_create_table_publishes_event() {
        let store = TableStore::open_in_memory().unwrap();
        let (events, _sub) = record_events(&store, "tags");

        store.create_table("tags", &ColumnSpec::new().column("label", ColumnType::Text)).unwrap();

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::CreateTable);
    }

    #[test]
    fn test_create_table_rejects_bad_identifiers() {
        let store = TableStore::open_in_memory().unwrap();
        let spec = ColumnSpec::new().column("title", ColumnType::Text);

        assert!(matches!(
            store.create_table("notes; DROP TABLE x", &spec),
            Err(Error::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            store.create_table("notes", &ColumnSpec::new().column("bad name", ColumnType::Text)),
            Err(Error::InvalidIdentifier { .. })
        ));
        assert!(store.get_all_tables().unwrap().iter().all(|t| t.name != "notes"));
    }

    #[test]
    fn test_add_columns() {
        let store = notes_store();
        store
            .add_columns(
                "notes",
                &ColumnSpec::new().column("body", ColumnType::Text).column("score", ColumnType::Real),
            )
            .unwrap();

        assert!(store.validate_schema("notes", &["body", "score"]).unwrap());
    }

    #[test]
    fn test_add_columns_partial_failure_keeps_earlier_columns() {
        let store = notes_store();
        let err = store
            .add_columns(
                "notes",
                &ColumnSpec::new()
                    .column("body", ColumnType::Text)
                    .column("title", ColumnType::Text)
                    .column("later", ColumnType::Text),
            )
            .unwrap_err();

        assert!(matches!(err, Error::Storage(_)));
        assert!(store.validate_schema("notes", &["body"]).unwrap());
        assert!(!store.validate_schema("notes", &["later"]).unwrap());
    }

    #[test]
    fn test_create_index_is_idempotent() {
        let store = notes_store();
        store.create_index("notes", "status").unwrap();
        store.create_index("notes", "status").unwrap();

        let rows = store
            .storage()
            .query_all(
                "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = ?",
                &[Value::from("notes")],
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name").and_then(Value::as_str), Some("idx_notes_status"));
    }

    #[test]
    fn test_get_all_tables() {
        let store = notes_store();
        store.create_table("tags", &ColumnSpec::new().column("label", ColumnType::Text)).unwrap();

        let tables = store.get_all_tables().unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"notes"));
        assert!(names.contains(&"tags"));

        let notes = tables.iter().find(|t| t.name == "notes").unwrap();
        assert_eq!(notes.kind, "table");
        assert_eq!(notes.ncol, 5);
        assert!(!notes.strict);
    }

    #[test]
    fn test_validate_schema() {
        let store = notes_store();
        assert!(store.validate_schema("notes", &["title", "status"]).unwrap());
        assert!(!store.validate_schema("notes", &["title", "missing"]).unwrap());
        assert!(!store.validate_schema("nonexistent", &["title"]).unwrap());
    }

    #[test]
    fn test_validate_schema_empty_expected() {
        let store = notes_store();
        let err = store.validate_schema("notes", &[]).unwrap_err();
        assert!(matches!(err, Error::EmptySchema { ref table } if table == "notes"));
    }

    #[test]
    fn test_insert_then_select_round_trip() {
        let store = notes_store();
        let start = now_ms();

        let result = store
            .insert("notes", Row::new().with("title", "first").with("status", "open").with("priority", 2))
            .unwrap();
        assert_eq!(result.changes, 1);
        assert_eq!(result.last_insert_id, 1);

        let rows = store
            .select("notes", &[], &Filter::new().equals("title", "first"), &Sort::new())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("status").and_then(Value::as_str), Some("open"));
        assert_eq!(rows[0].get("priority"), Some(&Value::Integer(2)));

        let added = rows[0].get("added").and_then(Value::as_i64).unwrap();
        assert!(added >= start);
    }

    #[test]
    fn test_insert_overwrites_supplied_added() {
        let store = notes_store();
        let start = now_ms();
        store
            .insert("notes", Row::new().with("added", 5).with("title", "stamped"))
            .unwrap();

        let rows = store.select("notes", &["added"], &Filter::new(), &Sort::new()).unwrap();
        assert!(rows[0].get("added").and_then(Value::as_i64).unwrap() >= start);
    }

    #[test]
    fn test_insert_publishes_event() {
        let store = notes_store();
        let (events, _sub) = record_events(&store, "notes");

        store.insert("notes", Row::new().with("title", "x")).unwrap();

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].table, "notes");
        assert_eq!(events[0].kind, ChangeKind::Insert);
    }

    #[test]
    fn test_failed_insert_publishes_nothing() {
        let store = notes_store();
        let (events, _sub) = record_events(&store, "notes");

        let err = store.insert("notes", Row::new().with("missing_column", 1)).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_failed_update_publishes_nothing() {
        let store = notes_store();
        let (events, _sub) = record_events(&store, "notes");

        let err = store
            .update("notes", &Filter::new(), Row::new().with("missing_column", 1))
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        let err = store
            .update("notes", &Filter::new().equals("missing_column", 1), Row::new().with("title", "x"))
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_failed_delete_publishes_nothing() {
        let store = notes_store();
        let (events, _sub) = record_events(&store, "notes");

        let err = store
            .delete("notes", &Filter::new().equals("missing_column", 1))
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        let err = store.delete("no_such_table", &Filter::new()).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_select_membership_sorted_by_added_desc() {
        let store = TableStore::open_in_memory().unwrap();
        store.create_table("people", &ColumnSpec::new().column("name", ColumnType::Text)).unwrap();

        store.insert("people", Row::new().with("name", "a")).unwrap();
        // Distinct millisecond stamps
        thread::sleep(Duration::from_millis(5));
        store.insert("people", Row::new().with("name", "b")).unwrap();

        let filter = Filter::from_json(&json!({"name": {"$in": ["a", "b"]}})).unwrap();
        let sort = Sort::from_json(&json!({"added": -1})).unwrap();
        let rows = store.select("people", &["name"], &filter, &sort).unwrap();

        let names: Vec<&str> = rows.iter().filter_map(|r| r.get("name").and_then(Value::as_str)).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(rows[0].len(), 1);
    }

    #[test]
    fn test_select_filters_and_multi_key_sort() {
        let store = notes_store();
        for (title, status, priority) in [("a", "open", 1), ("b", "done", 3), ("c", "open", 3), ("d", "open", 2)] {
            store
                .insert(
                    "notes",
                    Row::new().with("title", title).with("status", status).with("priority", priority),
                )
                .unwrap();
        }

        let filter = Filter::new().equals("status", "open").gte("priority", 2);
        let rows = store
            .select("notes", &["title"], &filter, &Sort::new().desc("priority").asc("title"))
            .unwrap();
        assert_eq!(titles(&rows), vec!["c", "d"]);

        let rows = store
            .select("notes", &[], &Filter::new().like("title", "%"), &Sort::new().asc("priority").desc("title"))
            .unwrap();
        assert_eq!(titles(&rows), vec!["a", "d", "c", "b"]);

        let rows = store
            .select("notes", &[], &Filter::new().not_in("title", ["a", "b"]), &Sort::new().asc("title"))
            .unwrap();
        assert_eq!(titles(&rows), vec!["c", "d"]);
    }

    #[test]
    fn test_select_rejects_bad_columns() {
        let store = notes_store();
        let err = store
            .select("notes", &["title, (SELECT 1)"], &Filter::new(), &Sort::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier { .. }));

        assert!(store.select("notes", &["*"], &Filter::new(), &Sort::new()).is_ok());
    }

    #[test]
    fn test_select_rejects_duplicate_columns() {
        let store = notes_store();
        store.insert("notes", Row::new().with("title", "a")).unwrap();

        let err = store
            .select("notes", &["title", "title"], &Filter::new(), &Sort::new())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn { ref column } if column == "title"));

        let rows = store
            .select("notes", &["title", "added"], &Filter::new(), &Sort::new())
            .unwrap();
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn test_update_set_then_where_params() {
        let store = notes_store();
        store.insert("notes", Row::new().with("title", "a").with("status", "open")).unwrap();
        store.insert("notes", Row::new().with("title", "b").with("status", "open")).unwrap();

        let changes = store
            .update(
                "notes",
                &Filter::new().equals("title", "b"),
                Row::new().with("status", "done").with("priority", 9),
            )
            .unwrap();
        assert_eq!(changes, 1);

        let rows = store
            .select("notes", &[], &Filter::new().equals("status", "done"), &Sort::new())
            .unwrap();
        assert_eq!(titles(&rows), vec!["b"]);
        assert_eq!(rows[0].get("priority"), Some(&Value::Integer(9)));
    }

    #[test]
    fn test_update_without_match_still_publishes() {
        let store = notes_store();
        let (events, _sub) = record_events(&store, "notes");

        let changes = store
            .update("notes", &Filter::new().equals("id", 5), Row::new().with("status", "done"))
            .unwrap();
        assert_eq!(changes, 0);

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::Update);
        assert_eq!(events[0].data, Some(Row::new().with("status", "done")));
    }

    #[test]
    fn test_delete_with_filter() {
        let store = notes_store();
        for title in ["a", "b", "c"] {
            store.insert("notes", Row::new().with("title", title)).unwrap();
        }
        let (events, _sub) = record_events(&store, "notes");

        let removed = store.delete("notes", &Filter::new().is_in("title", ["a", "c"])).unwrap();
        assert_eq!(removed, 2);

        let rows = store.select("notes", &[], &Filter::new(), &Sort::new()).unwrap();
        assert_eq!(titles(&rows), vec!["b"]);
        assert_eq!(events.lock()[0].kind, ChangeKind::Delete);
    }

    #[test]
    fn test_delete_with_empty_filter_removes_everything() {
        let store = notes_store();
        for title in ["a", "b"] {
            store.insert("notes", Row::new().with("title", title)).unwrap();
        }

        assert_eq!(store.delete("notes", &Filter::new()).unwrap(), 2);
        assert!(store.select("notes", &[], &Filter::new(), &Sort::new()).unwrap().is_empty());
    }

    #[test]
    fn test_drop_table_publishes_before_drop() {
        let store = Arc::new(notes_store());
        let seen_during_dispatch = Arc::new(Mutex::new(None));

        let store_clone = Arc::clone(&store);
        let seen_clone = Arc::clone(&seen_during_dispatch);
        let sub = store.bus().subscribe("notes", move |event| {
            if event.kind == ChangeKind::DropTable {
                let exists = store_clone.validate_schema("notes", &["title"]).unwrap();
                *seen_clone.lock() = Some(exists);
            }
        });

        store.drop_table("notes").unwrap();
        store.bus().unsubscribe(sub);

        assert_eq!(*seen_during_dispatch.lock(), Some(true));
        assert!(store.get_table_schema("notes").unwrap().is_empty());
    }

    #[test]
    fn test_mutations_on_other_tables_do_not_notify() {
        let store = notes_store();
        store.create_table("tags", &ColumnSpec::new().column("label", ColumnType::Text)).unwrap();
        let (events, _sub) = record_events(&store, "notes");

        store.insert("tags", Row::new().with("label", "x")).unwrap();
        store.delete("tags", &Filter::new()).unwrap();

        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_concurrent_inserts_share_one_connection() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig {
            database: temp.path().join("concurrent.db"),
            ..StoreConfig::default()
        };
        let store = Arc::new(TableStore::open(&config).unwrap());
        store.create_table("counters", &ColumnSpec::new().column("value", ColumnType::Integer)).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|thread_id| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..25 {
                        store
                            .insert("counters", Row::new().with("value", thread_id * 100 + i))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let rows = store.select("counters", &[], &Filter::new(), &Sort::new()).unwrap();
        assert_eq!(rows.len(), 100);
    }

    #[test]
    fn test_statement_skips_empty_parts() {
        assert_eq!(
            statement(&["DELETE FROM t".to_string(), String::new()]),
            "DELETE FROM t"
        );
        assert_eq!(
            statement(&["SELECT * FROM t".to_string(), String::new(), "ORDER BY a ASC".to_string()]),
            "SELECT * FROM t ORDER BY a ASC"
        );
    }

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        // Should be reasonable timestamp (after year 2020)
        assert!(ts > 1_600_000_000_000);
    }
}
