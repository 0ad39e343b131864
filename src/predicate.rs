// Filter translation into parameterized SQL fragments

use crate::error::{Error, Result};
use crate::filter::{Condition, Filter, Sort};
use crate::value::Value;

/// WHERE clause fragments plus the values bound to their placeholders
///
/// `params` has exactly one entry per `?` in `clauses`, left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub clauses: Vec<String>,
    pub params: Vec<Value>,
}

impl Predicate {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Clauses joined with AND, without the WHERE keyword
    pub fn body(&self) -> String {
        self.clauses.join(" AND ")
    }

    /// `WHERE ...`, or an empty string when there are no clauses
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.body())
        }
    }
}

/// Translate a filter into a predicate
///
/// Field names are interpolated into the SQL text, so each one must pass
/// [`validate_identifier`]; values only ever travel through `params`.
pub fn translate(filter: &Filter) -> Result<Predicate> {
    let mut predicate = Predicate::default();

    for (field, condition) in filter.clauses() {
        validate_identifier(field)?;

        match condition {
            Condition::Equals(value) => {
                predicate.clauses.push(format!("{} = ?", field));
                predicate.params.push(value.clone());
            }
            Condition::Compare(op, value) => {
                predicate.clauses.push(format!("{} {} ?", field, op.to_sql()));
                predicate.params.push(value.clone());
            }
            Condition::Membership(op, values) => {
                let placeholders = vec!["?"; values.len()].join(", ");
                predicate
                    .clauses
                    .push(format!("{} {} ({})", field, op.to_sql(), placeholders));
                predicate.params.extend(values.iter().cloned());
            }
        }
    }

    Ok(predicate)
}

/// `ORDER BY a ASC, b DESC`, or an empty string for an empty sort
pub fn order_by(sort: &Sort) -> Result<String> {
    if sort.is_empty() {
        return Ok(String::new());
    }

    let mut keys = Vec::new();
    for (column, direction) in sort.keys() {
        validate_identifier(column)?;
        keys.push(format!("{} {}", column, direction.to_sql()));
    }
    Ok(format!("ORDER BY {}", keys.join(", ")))
}

/// Reject anything that is not a plain SQL identifier
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_start || name.len() > 64 || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::InvalidIdentifier { name: name.to_string() });
    }
    Ok(())
}
