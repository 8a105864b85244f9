//! SELECT statement builder.
//!
//! The filter compiler writes predicate fragments and bound parameters
//! into a [`SelectQuery`]; rendering then assembles the final statement
//! text. Fragments arrive pre-compiled (with their bind markers already
//! in place), so rendering is deterministic string assembly: no dialect
//! re-interpretation happens after compilation.

use crate::exec::{Statement, Value};

use super::dialect::Dialect;

/// What the statement selects.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `SELECT *`, the normal data dump.
    Star,
    /// `SELECT DISTINCT <column>`, the harvesting form.
    Column(String),
}

/// A single SELECT statement under construction.
///
/// Each statement numbers its bind parameters from 0: `param_<i>` for
/// scalars, `param_<i>_<j>` for membership lists, with `<i>` advancing
/// once per bound filter. Names are unique within the statement and
/// `params` matches the markers 1:1 in order.
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until rendered"]
pub struct SelectQuery {
    dialect: Dialect,
    projection: Projection,
    distinct: bool,
    table: String,
    predicates: Vec<String>,
    order_by: Option<String>,
    limit: Option<u64>,
    params: Vec<(String, Value)>,
    next_param: usize,
}

impl SelectQuery {
    pub fn new(dialect: Dialect, table: impl Into<String>) -> Self {
        Self {
            dialect,
            projection: Projection::Star,
            distinct: false,
            table: table.into(),
            predicates: Vec::new(),
            order_by: None,
            limit: None,
            params: Vec::new(),
            next_param: 0,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Project a single column instead of `*`.
    pub fn project(&mut self, column: impl Into<String>) -> &mut Self {
        self.projection = Projection::Column(column.into());
        self
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    /// Append a compiled predicate; multiple predicates are AND-joined.
    pub fn push_predicate(&mut self, predicate: impl Into<String>) -> &mut Self {
        self.predicates.push(predicate.into());
        self
    }

    /// Raw ORDER BY clause body (declared opaque in configuration).
    pub fn set_order_by(&mut self, order_by: impl Into<String>) -> &mut Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn set_limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Reserve the next parameter index. Scalar and list binds share one
    /// counter, advanced once per filter.
    pub fn next_param_index(&mut self) -> usize {
        let index = self.next_param;
        self.next_param += 1;
        index
    }

    /// Bind a scalar parameter, returning its `:param_<i>` marker.
    pub fn bind_scalar(&mut self, value: Value) -> String {
        let index = self.next_param_index();
        let name = format!("param_{index}");
        let marker = format!(":{name}");
        self.params.push((name, value));
        marker
    }

    /// Bind a list of parameters under one index, returning the
    /// `:param_<i>_<j>` markers in element order.
    pub fn bind_list(&mut self, values: &[Value]) -> Vec<String> {
        let index = self.next_param_index();
        values
            .iter()
            .enumerate()
            .map(|(position, value)| {
                let name = format!("param_{index}_{position}");
                let marker = format!(":{name}");
                self.params.push((name, value.clone()));
                marker
            })
            .collect()
    }

    /// The WHERE clause body, if any predicate was pushed.
    ///
    /// A single predicate is emitted bare; multiple predicates are each
    /// parenthesized and AND-joined, matching how filters compose.
    pub fn where_sql(&self) -> Option<String> {
        match self.predicates.len() {
            0 => None,
            1 => Some(self.predicates[0].clone()),
            _ => Some(
                self.predicates
                    .iter()
                    .map(|p| format!("({p})"))
                    .collect::<Vec<_>>()
                    .join(" AND "),
            ),
        }
    }

    pub fn to_sql(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        match &self.projection {
            Projection::Star => sql.push('*'),
            Projection::Column(column) => sql.push_str(&self.dialect.quote_identifier(column)),
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.dialect.quote_identifier(&self.table));
        sql.push_str(" t");

        if let Some(where_clause) = self.where_sql() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause);
        }
        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql
    }

    /// Take the bound parameters, leaving the builder empty. Used when a
    /// custom statement template keeps the compiled predicate.
    pub fn take_params(&mut self) -> Vec<(String, Value)> {
        std::mem::take(&mut self.params)
    }

    pub fn into_statement(self) -> Statement {
        Statement {
            sql: self.to_sql(),
            params: self.params,
        }
    }
}
