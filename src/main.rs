use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use std::path::PathBuf;
use tablestore::{ColumnSpec, Filter, Row, Sort, StoreConfig, TableStore};

#[derive(Parser)]
#[command(name = "tablestore")]
#[command(about = "TableStore CLI - SQLite tables with a JSON filter syntax")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the SQLite database (overrides the config file)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Path to a YAML config file (default: <config_dir>/tablestore/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all tables
    Tables,

    /// Show the columns of a table
    Schema { table: String },

    /// Create a table from name:type pairs, e.g. `id:integer primary key` `title:text`
    CreateTable {
        table: String,
        #[arg(required = true)]
        columns: Vec<String>,
    },

    /// Add columns from name:type pairs
    AddColumns {
        table: String,
        #[arg(required = true)]
        columns: Vec<String>,
    },

    /// Create an index on one column
    CreateIndex { table: String, column: String },

    /// Check that a table has every listed column
    Validate { table: String, columns: Vec<String> },

    /// Insert a row given as a JSON object
    Insert { table: String, data: String },

    /// Update rows matching a JSON filter
    Update {
        table: String,
        #[arg(short, long)]
        filter: String,
        data: String,
    },

    /// Delete rows matching a JSON filter
    Delete {
        table: String,
        #[arg(short, long, conflicts_with = "all", required_unless_present = "all")]
        filter: Option<String>,
        /// Delete every row in the table
        #[arg(long)]
        all: bool,
    },

    /// Select rows, printed as JSON lines
    Select {
        table: String,
        /// Comma-separated column list (default: all columns)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        /// JSON filter, e.g. '{"status": {"$in": ["open", "blocked"]}}'
        #[arg(short, long)]
        filter: Option<String>,
        /// JSON sort, e.g. '{"added": -1}'
        #[arg(short, long)]
        sort: Option<String>,
    },

    /// Drop a table
    Drop { table: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::load_default()?,
    };
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }

    // Setup tracing
    let level = match cli.verbose {
        0 => config.tracing_level()?,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    // Open store
    let store = TableStore::open(&config)?;

    match cli.command {
        Commands::Tables => {
            for table in store.get_all_tables()? {
                println!("{} {}", table.name.bold(), format!("({})", table.kind).dimmed());
            }
        }
        Commands::Schema { table } => {
            let columns = store.get_table_schema(&table)?;
            if columns.is_empty() {
                return Err(eyre!("Table not found: {}", table));
            }
            for column in columns {
                let mut line = format!("{} {}", column.name.bold(), column.declared_type);
                if column.pk > 0 {
                    line.push_str(&" PRIMARY KEY".yellow().to_string());
                }
                if column.not_null {
                    line.push_str(" NOT NULL");
                }
                println!("{}", line);
            }
        }
        Commands::CreateTable { table, columns } => {
            let spec = parse_columns(&columns)?;
            store.create_table(&table, &spec)?;
            println!("{} {}", "Created table".green(), table);
        }
        Commands::AddColumns { table, columns } => {
            let spec = parse_columns(&columns)?;
            store.add_columns(&table, &spec)?;
            println!("{} {} column(s) to {}", "Added".green(), spec.len(), table);
        }
        Commands::CreateIndex { table, column } => {
            store.create_index(&table, &column)?;
            println!("{} idx_{}_{}", "Index ready:".green(), table, column);
        }
        Commands::Validate { table, columns } => {
            let expected: Vec<&str> = columns.iter().map(String::as_str).collect();
            if store.validate_schema(&table, &expected)? {
                println!("{}", "Schema valid".green());
            } else {
                println!("{}", "Schema missing columns".red());
                std::process::exit(1);
            }
        }
        Commands::Insert { table, data } => {
            let row = parse_row(&data)?;
            let result = store.insert(&table, row)?;
            println!("{} row {}", "Inserted".green(), result.last_insert_id);
        }
        Commands::Update { table, filter, data } => {
            let filter = parse_filter(&filter)?;
            let row = parse_row(&data)?;
            let changes = store.update(&table, &filter, row)?;
            println!("{} {} row(s)", "Updated".green(), changes);
        }
        Commands::Delete { table, filter, all } => {
            let filter = match filter {
                Some(json) => parse_filter(&json)?,
                None if all => Filter::new(),
                None => return Err(eyre!("Pass --filter or --all")),
            };
            let changes = store.delete(&table, &filter)?;
            println!("{} {} row(s)", "Deleted".green(), changes);
        }
        Commands::Select {
            table,
            columns,
            filter,
            sort,
        } => {
            let filter = match filter {
                Some(json) => parse_filter(&json)?,
                None => Filter::new(),
            };
            let sort = match sort {
                Some(json) => Sort::from_json(&parse_json(&json)?)?,
                None => Sort::new(),
            };
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            for row in store.select(&table, &columns, &filter, &sort)? {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
        Commands::Drop { table } => {
            store.drop_table(&table)?;
            println!("{} {}", "Dropped table".green(), table);
        }
    }

    Ok(())
}

fn parse_json(text: &str) -> Result<serde_json::Value> {
    serde_json::from_str(text).with_context(|| format!("Invalid JSON: {}", text))
}

fn parse_filter(text: &str) -> Result<Filter> {
    Ok(Filter::from_json(&parse_json(text)?)?)
}

fn parse_row(text: &str) -> Result<Row> {
    Row::from_json(&parse_json(text)?).ok_or_else(|| eyre!("Row data must be a JSON object of scalar values"))
}

fn parse_columns(pairs: &[String]) -> Result<ColumnSpec> {
    ColumnSpec::parse_pairs(pairs).map_err(|e| eyre!("Invalid column list: {}", e))
}
