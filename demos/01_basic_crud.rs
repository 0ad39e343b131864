//! Example 01: Basic CRUD Operations
//!
//! This example demonstrates creating a table, inserting, selecting with the
//! JSON filter syntax, updating and deleting rows with TableStore.
//!
//! Run with: cargo run --example 01_basic_crud

use eyre::Result;
use serde_json::json;
use tablestore::{ColumnDef, ColumnSpec, ColumnType, Filter, Row, Sort, StoreConfig, TableStore};

fn main() -> Result<()> {
    // Create a temporary directory for this example
    let temp_dir = tempfile::tempdir()?;
    let config = StoreConfig {
        database: temp_dir.path().join("notes.db"),
        ..StoreConfig::default()
    };

    println!("TableStore Basic CRUD Example");
    println!("=============================\n");
    println!("Database: {}\n", config.database.display());

    let store = TableStore::open(&config)?;

    // CREATE TABLE
    println!("1. CREATE TABLE - notes(id, title, status)...");
    store.create_table(
        "notes",
        &ColumnSpec::new()
            .column("id", ColumnDef::integer().autoincrement())
            .column("title", ColumnType::Text)
            .column("status", ColumnType::Text),
    )?;
    for column in store.get_table_schema("notes")? {
        println!("   - {} {}", column.name, column.declared_type);
    }
    println!();

    // INSERT
    println!("2. INSERT - Adding three notes...");
    for (title, status) in [("Buy milk", "open"), ("Write report", "open"), ("Call bank", "done")] {
        let result = store.insert("notes", Row::new().with("title", title).with("status", status))?;
        println!("   Inserted row {}", result.last_insert_id);
    }
    println!();

    // SELECT
    println!("3. SELECT - Open notes, newest first...");
    let filter = Filter::from_json(&json!({"status": {"$in": ["open"]}}))?;
    let sort = Sort::from_json(&json!({"added": -1, "id": -1}))?;
    for row in store.select("notes", &["id", "title"], &filter, &sort)? {
        println!("   {}", serde_json::to_string(&row)?);
    }
    println!();

    // UPDATE
    println!("4. UPDATE - Marking 'Buy milk' done...");
    let changes = store.update(
        "notes",
        &Filter::new().equals("title", "Buy milk"),
        Row::new().with("status", "done"),
    )?;
    println!("   {} row(s) changed\n", changes);

    // DELETE
    println!("5. DELETE - Removing done notes...");
    let removed = store.delete("notes", &Filter::new().equals("status", "done"))?;
    println!("   {} row(s) removed\n", removed);

    let remaining = store.select("notes", &["title"], &Filter::new(), &Sort::new())?;
    println!("   Remaining notes: {}", remaining.len());
    for row in &remaining {
        println!("   - {}", serde_json::to_string(row)?);
    }
    println!();

    println!("Example complete!");
    Ok(())
}
