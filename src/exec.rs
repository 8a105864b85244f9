//! Statement execution boundary.
//!
//! The dump core never talks to a database driver directly. It produces
//! [`Statement`]s and hands them to a [`StatementExecutor`], which is the
//! single synchronous collaborator the core depends on. Tests inject a
//! scripted executor; production code wraps an actual connection.

use serde::Deserialize;
use thiserror::Error;

use crate::sql::dialect::Dialect;

/// A bound parameter or row value.
///
/// Configuration files deserialize straight into this type, so filter
/// values keep whatever representation the operator wrote.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Type-normalize a harvested value: numeric-looking text becomes an
    /// integer, everything else keeps its original representation.
    ///
    /// Harvested foreign-key values arrive as driver-dependent text or
    /// integers; normalizing keeps the cache deduplicated across both.
    pub fn normalize(self) -> Value {
        match self {
            Value::Text(s) => match s.trim().parse::<i64>() {
                Ok(n) => Value::Int(n),
                Err(_) => Value::Text(s),
            },
            other => other,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// A result row: ordered, column-name-addressable values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from (column, value) pairs, preserving order.
    pub fn from_pairs<N, V, I>(pairs: I) -> Self
    where
        N: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (N, V)>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Look up a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// First value in the row, if any. Scalar results (counts) use this.
    pub fn first(&self) -> Option<&Value> {
        self.columns.first().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A built SQL statement with its bound parameters.
///
/// Parameter names are unique within one statement and appear in `params`
/// in the order their markers occur in `sql`.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<(String, Value)>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// Failure reported by the external executor (malformed SQL, connectivity
/// loss). Propagated unchanged to the caller; fatal for the current table.
#[derive(Debug, Clone, Error)]
#[error("statement execution failed: {message}")]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Synchronous statement execution.
///
/// The whole run is single-threaded by design: harvesting interleaves
/// statement builds and executions in a strict observable order, so the
/// executor is called from exactly one call chain at a time.
pub trait StatementExecutor {
    /// The SQL dialect this executor speaks; drives identifier quoting.
    fn dialect(&self) -> Dialect {
        Dialect::Ansi
    }

    /// Execute a statement and return its rows in result order.
    fn execute(&mut self, statement: &Statement) -> Result<Vec<Row>, ExecutionError>;
}
