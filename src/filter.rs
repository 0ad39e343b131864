// Filter expressions for querying rows

use crate::error::{Error, Result};
use crate::value::Value;

/// Scalar comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,   // =
    Ne,   // !=
    Gt,   // >
    Lt,   // <
    Gte,  // >=
    Lte,  // <=
    Like, // LIKE
}

impl CompareOp {
    pub(crate) fn to_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Gte => ">=",
            CompareOp::Lte => "<=",
            CompareOp::Like => "LIKE",
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}

/// Operators whose operand is a sequence of values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOp {
    In,
    NotIn,
}

impl MembershipOp {
    pub(crate) fn to_sql(self) -> &'static str {
        match self {
            MembershipOp::In => "IN",
            MembershipOp::NotIn => "NOT IN",
        }
    }
}

impl std::fmt::Display for MembershipOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}

/// Condition applied to a single field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Bare literal, matched with `=`
    Equals(Value),
    Compare(CompareOp, Value),
    Membership(MembershipOp, Vec<Value>),
}

/// Operator keys accepted by the JSON filter syntax
enum Operator {
    Compare(CompareOp),
    Membership(MembershipOp),
}

impl Operator {
    fn parse(key: &str) -> Result<Self> {
        Ok(match key {
            "$eq" => Operator::Compare(CompareOp::Eq),
            "$gt" => Operator::Compare(CompareOp::Gt),
            "$gte" => Operator::Compare(CompareOp::Gte),
            "$lt" => Operator::Compare(CompareOp::Lt),
            "$lte" => Operator::Compare(CompareOp::Lte),
            "$ne" => Operator::Compare(CompareOp::Ne),
            "$like" => Operator::Compare(CompareOp::Like),
            "$in" => Operator::Membership(MembershipOp::In),
            "$nin" => Operator::Membership(MembershipOp::NotIn),
            other => {
                return Err(Error::UnsupportedOperator {
                    operator: other.to_string(),
                });
            }
        })
    }
}

/// A conjunction of field conditions
///
/// Clauses keep insertion order, which is also the order of the bound
/// parameters once translated. A field may appear more than once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Condition)>,
}

impl Filter {
    /// Empty filter, matching every row
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.clauses.push((field.into(), condition));
        self
    }

    pub fn equals(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, Condition::Equals(value.into()))
    }

    pub fn compare(self, field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        self.condition(field, Condition::Compare(op, value.into()))
    }

    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(field, CompareOp::Ne, value)
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(field, CompareOp::Gt, value)
    }

    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(field, CompareOp::Gte, value)
    }

    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(field, CompareOp::Lt, value)
    }

    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(field, CompareOp::Lte, value)
    }

    pub fn like(self, field: impl Into<String>, pattern: impl Into<Value>) -> Self {
        self.compare(field, CompareOp::Like, pattern)
    }

    pub fn is_in<V: Into<Value>>(self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.condition(field, Condition::Membership(MembershipOp::In, values))
    }

    pub fn not_in<V: Into<Value>>(self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.condition(field, Condition::Membership(MembershipOp::NotIn, values))
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.clauses.iter().map(|(field, condition)| (field.as_str(), condition))
    }

    /// Parse the JSON operator syntax
    ///
    /// `{"status": "open", "priority": {"$gte": 2, "$lt": 5}, "tag": {"$in": ["a", "b"]}}`
    ///
    /// A non-object value is an equality literal. An object value maps operator
    /// keys (`$eq $gt $gte $lt $lte $ne $in $nin $like`) to operands; `$in` and
    /// `$nin` take arrays, the rest take scalars. An empty operator object is
    /// rejected rather than silently matching every row. Anything else is
    /// rejected too.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = match json {
            serde_json::Value::Object(object) => object,
            serde_json::Value::Null => return Ok(Filter::new()),
            _ => return Err(Error::invalid_operand("filter", "expected a JSON object")),
        };

        let mut filter = Filter::new();
        for (field, condition) in object {
            match condition {
                serde_json::Value::Object(operators) => {
                    if operators.is_empty() {
                        return Err(Error::invalid_operand(field, "expected at least one operator"));
                    }
                    for (key, operand) in operators {
                        let condition = match Operator::parse(key)? {
                            Operator::Compare(op) => Condition::Compare(op, scalar(key, operand)?),
                            Operator::Membership(op) => {
                                let items = operand
                                    .as_array()
                                    .ok_or_else(|| Error::invalid_operand(key, "expected an array"))?;
                                let values = items.iter().map(|item| scalar(key, item)).collect::<Result<_>>()?;
                                Condition::Membership(op, values)
                            }
                        };
                        filter.clauses.push((field.clone(), condition));
                    }
                }
                literal => {
                    filter
                        .clauses
                        .push((field.clone(), Condition::Equals(scalar("$eq", literal)?)));
                }
            }
        }

        Ok(filter)
    }
}

fn scalar(operator: &str, json: &serde_json::Value) -> Result<Value> {
    Value::from_json(json).ok_or_else(|| Error::invalid_operand(operator, format!("expected a scalar, got {}", json)))
}

/// Sort direction for one ORDER BY key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `1` is ascending, every other code descending
    pub fn from_code(code: i64) -> Self {
        if code == 1 { SortDirection::Asc } else { SortDirection::Desc }
    }

    pub(crate) fn to_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Ordered list of sort keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sort {
    keys: Vec<(String, SortDirection)>,
}

impl Sort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.keys.push((column.into(), direction));
        self
    }

    pub fn asc(self, column: impl Into<String>) -> Self {
        self.by(column, SortDirection::Asc)
    }

    pub fn desc(self, column: impl Into<String>) -> Self {
        self.by(column, SortDirection::Desc)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.keys.iter().map(|(column, direction)| (column.as_str(), *direction))
    }

    /// Parse `{"column": code, ...}` where code 1 is ascending
    ///
    /// Any other code, numeric or not, sorts descending.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = match json {
            serde_json::Value::Object(object) => object,
            serde_json::Value::Null => return Ok(Sort::new()),
            _ => return Err(Error::invalid_operand("sort", "expected a JSON object")),
        };

        let mut sort = Sort::new();
        for (column, code) in object {
            let direction = if code.as_f64() == Some(1.0) {
                SortDirection::Asc
            } else {
                SortDirection::Desc
            };
            sort.keys.push((column.clone(), direction));
        }
        Ok(sort)
    }
}
