// Column declarations and schema introspection types

use crate::error::{Error, Result};
use crate::value::{Row, Value};
use serde::Serialize;
use std::str::FromStr;

/// Name of the timestamp column every table carries
pub const ADDED_COLUMN: &str = "added";

/// Declared storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Blob,
}

impl ColumnType {
    pub(crate) fn to_sql(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Blob => "BLOB",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ColumnType::Text),
            "integer" | "int" => Ok(ColumnType::Integer),
            "real" | "float" | "double" => Ok(ColumnType::Real),
            "blob" => Ok(ColumnType::Blob),
            other => Err(format!("unknown column type: {}", other)),
        }
    }
}

/// Column declaration: a type plus optional constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub ty: ColumnType,
    pub primary_key: bool,
    pub autoincrement: bool,
    pub not_null: bool,
}

impl ColumnDef {
    pub fn new(ty: ColumnType) -> Self {
        Self {
            ty,
            primary_key: false,
            autoincrement: false,
            not_null: false,
        }
    }

    pub fn text() -> Self {
        Self::new(ColumnType::Text)
    }

    pub fn integer() -> Self {
        Self::new(ColumnType::Integer)
    }

    pub fn real() -> Self {
        Self::new(ColumnType::Real)
    }

    pub fn blob() -> Self {
        Self::new(ColumnType::Blob)
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Only meaningful on an INTEGER PRIMARY KEY
    pub fn autoincrement(mut self) -> Self {
        self.primary_key = true;
        self.autoincrement = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub(crate) fn to_sql(self) -> String {
        let mut sql = self.ty.to_sql().to_string();
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.autoincrement {
            sql.push_str(" AUTOINCREMENT");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        sql
    }
}

impl From<ColumnType> for ColumnDef {
    fn from(ty: ColumnType) -> Self {
        ColumnDef::new(ty)
    }
}

impl FromStr for ColumnDef {
    type Err = String;

    /// Parses declarations such as `text`, `integer primary key autoincrement`
    /// or `real not null`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let words: Vec<String> = s.split_whitespace().map(|w| w.to_ascii_lowercase()).collect();
        let (first, rest) = words.split_first().ok_or_else(|| "empty column declaration".to_string())?;
        let mut def = ColumnDef::new(first.parse()?);

        let mut i = 0;
        while i < rest.len() {
            match (rest[i].as_str(), rest.get(i + 1).map(String::as_str)) {
                ("primary", Some("key")) => {
                    def.primary_key = true;
                    i += 2;
                }
                ("not", Some("null")) => {
                    def.not_null = true;
                    i += 2;
                }
                ("autoincrement", _) => {
                    def = def.autoincrement();
                    i += 1;
                }
                (other, _) => return Err(format!("unknown column constraint: {}", other)),
            }
        }

        Ok(def)
    }
}

/// Ordered set of column declarations for a table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSpec {
    columns: Vec<(String, ColumnDef)>,
}

impl ColumnSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style add; a repeated name replaces the earlier declaration in place
    pub fn column(mut self, name: impl Into<String>, def: impl Into<ColumnDef>) -> Self {
        self.set(name, def);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, def: impl Into<ColumnDef>) {
        let name = name.into();
        let def = def.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = def,
            None => self.columns.push((name, def)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnDef)> {
        self.columns.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Parse `name:declaration` pairs, e.g. `["id:integer primary key", "title:text"]`
    pub fn parse_pairs<S: AsRef<str>>(pairs: &[S]) -> std::result::Result<Self, String> {
        let mut spec = ColumnSpec::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (name, decl) = pair
                .split_once(':')
                .ok_or_else(|| format!("expected name:type, got {:?}", pair))?;
            spec.set(name.trim(), decl.parse::<ColumnDef>()?);
        }
        Ok(spec)
    }
}

/// One entry of `PRAGMA table_list`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    /// `table`, `view`, `shadow` or `virtual`
    pub kind: String,
    pub ncol: i64,
    pub without_rowid: bool,
    pub strict: bool,
}

impl TableInfo {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            schema: text(row, "schema")?,
            name: text(row, "name")?,
            kind: text(row, "type")?,
            ncol: integer(row, "ncol")?,
            without_rowid: integer(row, "wr")? != 0,
            strict: integer(row, "strict")? != 0,
        })
    }
}

/// One entry of `PRAGMA table_info(<table>)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    /// 1-based position in the primary key, 0 when not part of it
    pub pk: i64,
}

impl ColumnInfo {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        let default_value = match row.get("dflt_value") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v.to_string()),
        };
        Ok(Self {
            cid: integer(row, "cid")?,
            name: text(row, "name")?,
            declared_type: text(row, "type")?,
            not_null: integer(row, "notnull")? != 0,
            default_value,
            pk: integer(row, "pk")?,
        })
    }
}

fn text(row: &Row, column: &str) -> Result<String> {
    row.get(column)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing(column))
}

fn integer(row: &Row, column: &str) -> Result<i64> {
    row.get(column).and_then(Value::as_i64).ok_or_else(|| missing(column))
}

fn missing(column: &str) -> Error {
    Error::Storage(rusqlite::Error::InvalidColumnName(column.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_def_to_sql() {
        assert_eq!(ColumnDef::text().to_sql(), "TEXT");
        assert_eq!(ColumnDef::integer().primary_key().to_sql(), "INTEGER PRIMARY KEY");
        assert_eq!(
            ColumnDef::integer().autoincrement().to_sql(),
            "INTEGER PRIMARY KEY AUTOINCREMENT"
        );
        assert_eq!(ColumnDef::real().not_null().to_sql(), "REAL NOT NULL");
    }

    #[test]
    fn test_column_def_parse() {
        assert_eq!("text".parse::<ColumnDef>().unwrap(), ColumnDef::text());
        assert_eq!(
            "INTEGER primary KEY autoincrement".parse::<ColumnDef>().unwrap(),
            ColumnDef::integer().autoincrement()
        );
        assert_eq!("blob not null".parse::<ColumnDef>().unwrap(), ColumnDef::blob().not_null());

        assert!("".parse::<ColumnDef>().is_err());
        assert!("varchar".parse::<ColumnDef>().is_err());
        assert!("text unique".parse::<ColumnDef>().is_err());
    }

    #[test]
    fn test_column_spec_keeps_order_and_replaces() {
        let spec = ColumnSpec::new()
            .column("name", ColumnType::Text)
            .column("count", ColumnType::Integer)
            .column("name", ColumnType::Blob);

        assert_eq!(spec.names().collect::<Vec<_>>(), vec!["name", "count"]);
        assert_eq!(spec.get("name"), Some(&ColumnDef::blob()));
    }

    #[test]
    fn test_column_spec_parse_pairs() {
        let spec = ColumnSpec::parse_pairs(&["id:integer primary key", "title: text"]).unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.get("id"), Some(&ColumnDef::integer().primary_key()));
        assert_eq!(spec.get("title"), Some(&ColumnDef::text()));

        assert!(ColumnSpec::parse_pairs(&["missing_type"]).is_err());
    }

    #[test]
    fn test_column_info_from_row() {
        let row = Row::new()
            .with("cid", 0)
            .with("name", "id")
            .with("type", "INTEGER")
            .with("notnull", 0)
            .with("dflt_value", Value::Null)
            .with("pk", 1);

        let info = ColumnInfo::from_row(&row).unwrap();
        assert_eq!(info.name, "id");
        assert_eq!(info.declared_type, "INTEGER");
        assert!(!info.not_null);
        assert_eq!(info.default_value, None);
        assert_eq!(info.pk, 1);

        assert!(ColumnInfo::from_row(&Row::new().with("cid", 0)).is_err());
    }
}
