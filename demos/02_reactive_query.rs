//! Example 02: Reactive Queries
//!
//! This example demonstrates keeping a result set in sync with a table:
//! - Opening a ReactiveQuery with a filter and sort
//! - Watching it refresh after inserts, updates and deletes
//! - Mutations on other tables leaving it alone
//! - Disposing it
//! - Watching a table without a query
//!
//! Run with: cargo run --example 02_reactive_query

use eyre::Result;
use std::sync::Arc;
use tablestore::{ColumnSpec, ColumnType, Filter, QuerySpec, ReactiveQuery, Row, Sort, TableStore, TableWatch, Value};

fn main() -> Result<()> {
    println!("TableStore Reactive Query Example");
    println!("=================================\n");

    let store = Arc::new(TableStore::open_in_memory()?);
    store.create_table(
        "tasks",
        &ColumnSpec::new()
            .column("title", ColumnType::Text)
            .column("priority", ColumnType::Integer),
    )?;
    store.create_table("audit", &ColumnSpec::new().column("entry", ColumnType::Text))?;

    println!("1. Opening a query for tasks with priority >= 2...");
    let spec = QuerySpec::new("tasks")
        .columns(["title", "priority"])
        .filter(Filter::new().gte("priority", 2))
        .sort(Sort::new().desc("priority").asc("title"));
    let query = ReactiveQuery::open(
        Arc::clone(&store),
        spec,
        |rows| {
            let titles: Vec<String> = rows
                .iter()
                .filter_map(|row| row.get("title").and_then(Value::as_str).map(str::to_string))
                .collect();
            println!("   -> update: {:?}", titles);
        },
        |err| println!("   -> error: {}", err),
    );
    println!();

    println!("2. Inserting tasks...");
    store.insert("tasks", Row::new().with("title", "triage").with("priority", 3))?;
    store.insert("tasks", Row::new().with("title", "lunch").with("priority", 1))?;
    store.insert("tasks", Row::new().with("title", "deploy").with("priority", 2))?;
    println!();

    println!("3. Writing to another table (no update expected)...");
    store.insert("audit", Row::new().with("entry", "inserted three tasks"))?;
    println!();

    println!("4. Raising the priority of 'lunch'...");
    store.update("tasks", &Filter::new().equals("title", "lunch"), Row::new().with("priority", 5))?;
    println!();

    println!("5. Deleting 'triage'...");
    store.delete("tasks", &Filter::new().equals("title", "triage"))?;
    println!();

    println!("6. Disposing the query, then inserting again (no update expected)...");
    query.dispose();
    store.insert("tasks", Row::new().with("title", "late").with("priority", 9))?;
    println!("   Cached rows at disposal: {}", query.rows().len());
    println!();

    println!("7. Watching the audit table...");
    let watch = TableWatch::open(&store, "audit", || println!("   -> audit changed"));
    store.insert("audit", Row::new().with("entry", "watched"))?;
    drop(watch);
    store.insert("audit", Row::new().with("entry", "unwatched"))?;
    println!();

    println!("Example complete!");
    Ok(())
}
