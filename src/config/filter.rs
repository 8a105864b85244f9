//! The filter model: a closed predicate tree.
//!
//! Filters are value objects; all behavior lives in the compiler
//! (`dump::compiler`), which matches exhaustively over [`Filter`]. Adding
//! a variant is a compile-time exhaustiveness requirement, not a runtime
//! type check.
//!
//! Configuration files declare filters in a uniform raw form
//! ([`RawFilter`]) keyed by an operator string; conversion into the typed
//! model rejects unknown operators and structurally invalid declarations
//! while loading, so the compiler never sees a malformed filter.

use serde::Deserialize;

use crate::exec::Value;

use super::ConfigError;

/// Comparison operators binding exactly one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
}

impl CompareOp {
    pub fn sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "<>",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Like => "LIKE",
            CompareOp::NotLike => "NOT LIKE",
        }
    }
}

/// Membership operators binding one parameter per list element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    In,
    NotIn,
}

impl SetOp {
    pub fn sql(&self) -> &'static str {
        match self {
            SetOp::In => "IN",
            SetOp::NotIn => "NOT IN",
        }
    }
}

/// Boolean composition operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn sql(&self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

/// A predicate tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column <op> value`
    Comparison {
        column: String,
        op: CompareOp,
        value: Value,
    },

    /// `column IS [NOT] NULL`. Binds no parameter.
    Null { column: String, negated: bool },

    /// `column IN (…)` / `column NOT IN (…)` over a fixed value list.
    Membership {
        column: String,
        op: SetOp,
        values: Vec<Value>,
    },

    /// Membership whose values are harvested from another table's dumped
    /// rows at compile time. Always unioned with `column IS NULL` so rows
    /// with an optional relationship survive filtering. Never carries a
    /// pre-set value in configuration.
    Dependent {
        column: String,
        referenced_table: String,
        referenced_column: String,
    },

    /// Boolean composition of child filters, each fully parenthesized.
    Composite { op: BoolOp, filters: Vec<Filter> },
}

impl Filter {
    pub fn comparison(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Filter::Comparison {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::comparison(column, CompareOp::Eq, value)
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Filter::Null {
            column: column.into(),
            negated: false,
        }
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Filter::Null {
            column: column.into(),
            negated: true,
        }
    }

    pub fn membership(column: impl Into<String>, op: SetOp, values: Vec<Value>) -> Self {
        Filter::Membership {
            column: column.into(),
            op,
            values,
        }
    }

    pub fn dependent(
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Filter::Dependent {
            column: column.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
        }
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::Composite {
            op: BoolOp::And,
            filters,
        }
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Composite {
            op: BoolOp::Or,
            filters,
        }
    }
}

/// Uniform serde form of a filter declaration.
///
/// ```toml
/// [[tables.Customer.filters]]
/// op = "eq"
/// column = "id"
/// value = 1
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawFilter {
    pub op: String,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub values: Option<Vec<Value>>,
    #[serde(default)]
    pub referenced_table: Option<String>,
    #[serde(default)]
    pub referenced_column: Option<String>,
    #[serde(default)]
    pub filters: Vec<RawFilter>,
}

impl RawFilter {
    /// Convert into the typed model, rejecting unknown operators and
    /// missing fields.
    pub fn build(&self) -> Result<Filter, ConfigError> {
        let compare = |op: CompareOp| -> Result<Filter, ConfigError> {
            Ok(Filter::Comparison {
                column: self.require_column()?,
                op,
                value: self
                    .value
                    .clone()
                    .ok_or_else(|| self.invalid("missing 'value'"))?,
            })
        };
        let membership = |op: SetOp| -> Result<Filter, ConfigError> {
            Ok(Filter::Membership {
                column: self.require_column()?,
                op,
                values: self.values.clone().unwrap_or_default(),
            })
        };
        let composite = |op: BoolOp| -> Result<Filter, ConfigError> {
            let filters = self
                .filters
                .iter()
                .map(RawFilter::build)
                .collect::<Result<Vec<_>, _>>()?;
            if filters.is_empty() {
                return Err(self.invalid("composite filter has no children"));
            }
            Ok(Filter::Composite { op, filters })
        };

        match self.op.as_str() {
            "eq" => compare(CompareOp::Eq),
            "neq" => compare(CompareOp::Neq),
            "lt" => compare(CompareOp::Lt),
            "lte" => compare(CompareOp::Lte),
            "gt" => compare(CompareOp::Gt),
            "gte" => compare(CompareOp::Gte),
            "like" => compare(CompareOp::Like),
            "not_like" => compare(CompareOp::NotLike),
            "is_null" => Ok(Filter::Null {
                column: self.require_column()?,
                negated: false,
            }),
            "is_not_null" => Ok(Filter::Null {
                column: self.require_column()?,
                negated: true,
            }),
            "in" => membership(SetOp::In),
            "not_in" => membership(SetOp::NotIn),
            "depends" => {
                if self.value.is_some() || self.values.is_some() {
                    return Err(self.invalid("'depends' must not carry a value"));
                }
                Ok(Filter::Dependent {
                    column: self.require_column()?,
                    referenced_table: self
                        .referenced_table
                        .clone()
                        .ok_or_else(|| self.invalid("missing 'referenced_table'"))?,
                    referenced_column: self
                        .referenced_column
                        .clone()
                        .ok_or_else(|| self.invalid("missing 'referenced_column'"))?,
                })
            }
            "and" => composite(BoolOp::And),
            "or" => composite(BoolOp::Or),
            other => Err(ConfigError::UnknownOperator(other.to_string())),
        }
    }

    fn require_column(&self) -> Result<String, ConfigError> {
        self.column
            .clone()
            .ok_or_else(|| self.invalid("missing 'column'"))
    }

    fn invalid(&self, message: &str) -> ConfigError {
        ConfigError::InvalidFilter(format!("{} ({} filter)", message, self.op))
    }
}
