// Error types for TableStore

use thiserror::Error;

/// All errors produced by the filter translator and the table store
#[derive(Debug, Error)]
pub enum Error {
    /// Filter used an operator outside the fixed operator table
    #[error("Unsupported operator: {operator}")]
    UnsupportedOperator { operator: String },

    /// Operand has the wrong shape for its operator
    #[error("Invalid operand for {operator}: {reason}")]
    InvalidOperand { operator: String, reason: String },

    /// Schema validation was asked to check an empty column list
    #[error("Table schema not defined for {table}")]
    EmptySchema { table: String },

    /// Table or column name is not a plain SQL identifier
    #[error("Invalid identifier: {name:?} (must match [A-Za-z_][A-Za-z0-9_]*, max 64 chars)")]
    InvalidIdentifier { name: String },

    /// Projection named the same column twice
    #[error("Duplicate column in projection: {column}")]
    DuplicateColumn { column: String },

    /// Failure surfaced unchanged from SQLite
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_operand(operator: &str, reason: impl Into<String>) -> Self {
        Error::InvalidOperand {
            operator: operator.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedOperator {
            operator: "$regex".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported operator: $regex");

        let err = Error::invalid_operand("$in", "expected an array");
        assert_eq!(err.to_string(), "Invalid operand for $in: expected an array");

        let err = Error::EmptySchema {
            table: "notes".to_string(),
        };
        assert_eq!(err.to_string(), "Table schema not defined for notes");

        let err = Error::DuplicateColumn {
            column: "title".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate column in projection: title");
    }

    #[test]
    fn test_storage_error_is_transparent() {
        let inner = rusqlite::Error::InvalidQuery;
        let expected = inner.to_string();
        let err: Error = inner.into();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(err.to_string(), expected);
    }
}
