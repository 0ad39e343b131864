// TableStore - Embedded SQLite table store with a filter DSL and reactive queries

pub mod bus;
pub mod config;
pub mod error;
pub mod filter;
pub mod predicate;
pub mod reactive;
pub mod schema;
pub mod storage;
pub mod store;
pub mod value;

// Re-export main types for convenience
pub use bus::{ChangeBus, ChangeEvent, ChangeKind, Subscription};
pub use config::{JournalMode, StoreConfig};
pub use error::{Error, Result};
pub use filter::{CompareOp, Condition, Filter, MembershipOp, Sort, SortDirection};
pub use predicate::{Predicate, translate};
pub use reactive::{QuerySpec, ReactiveQuery, TableWatch};
pub use schema::{ColumnDef, ColumnInfo, ColumnSpec, ColumnType, TableInfo};
pub use storage::{InsertResult, SqliteStorage, Storage};
pub use store::{TableStore, now_ms};
pub use value::{Row, Value};

// Re-export rusqlite for callers implementing Storage
pub use rusqlite;
