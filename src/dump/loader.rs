//! Query building and execution for one dump run.
//!
//! [`DataLoader`] owns the borrowed trio every statement build needs: the
//! executor, the (already ordered and synthesized) configuration, and the
//! run state. Its builds are re-entrant: compiling a dependent filter can
//! trigger a nested build for the referenced table, guarded against
//! cycles by the [`QueryGuard`](super::state::QueryGuard) threaded down
//! the chain.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::{DumpConfig, TableConfig};
use crate::error::{DumpError, DumpResult};
use crate::exec::{ExecutionError, Row, Statement, StatementExecutor, Value};
use crate::sql::select::SelectQuery;

use super::state::{DumpState, QueryGuard};

/// Substitution marker for the compiled predicate inside a custom
/// statement template.
pub const AUTO_CONDITIONS_MARKER: &str = "$autoConditions";

static FROM_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bFROM\b").expect("valid regex"));

/// Builds, executes and counts the select statements of a dump run.
pub struct DataLoader<'a, E: StatementExecutor> {
    pub(crate) executor: &'a mut E,
    pub(crate) config: &'a DumpConfig,
    pub(crate) state: &'a mut DumpState,
}

impl<'a, E: StatementExecutor> DataLoader<'a, E> {
    pub fn new(executor: &'a mut E, config: &'a DumpConfig, state: &'a mut DumpState) -> Self {
        Self {
            executor,
            config,
            state,
        }
    }

    /// Build the select statement for a table's data section.
    pub fn build_select(&mut self, table: &str) -> DumpResult<Statement> {
        let mut guard = QueryGuard::new();
        self.build_select_with(table, None, &mut guard)
    }

    /// Build a select, optionally projecting a single distinct column
    /// (the harvesting form). `guard` carries the resolution chain across
    /// nested builds.
    pub(crate) fn build_select_with(
        &mut self,
        table: &str,
        projection_column: Option<&str>,
        guard: &mut QueryGuard,
    ) -> DumpResult<Statement> {
        if !self.state.has_table(table) {
            return Err(DumpError::UnknownTable {
                table: table.to_string(),
                context: "select build".to_string(),
            });
        }

        let config = self.config;
        let fallback = TableConfig::default();
        let table_config = config.table(table).unwrap_or(&fallback);

        let mut query = SelectQuery::new(self.executor.dialect(), table);
        if let Some(column) = projection_column {
            query.project(column).distinct();
        }

        for filter in &table_config.filters {
            if let Some(predicate) = self.compile_filter(filter, table, &mut query, guard)? {
                query.push_predicate(predicate);
            }
        }
        if let Some(limit) = table_config.limit {
            query.set_limit(limit);
        }
        if let Some(order_by) = &table_config.order_by {
            query.set_order_by(order_by.clone());
        }

        // A custom template replaces the generated statement, for the
        // data section and for harvest sub-queries alike. Harvested
        // values must come from the same statement that defines the
        // table's dump.
        if let Some(template) = &table_config.query {
            return Ok(Self::splice_template(template, &mut query));
        }

        Ok(query.into_statement())
    }

    /// Splice the compiled predicate into a custom template, or use the
    /// template verbatim when it carries no marker (a self-contained
    /// statement binds no compiled parameters).
    fn splice_template(template: &str, query: &mut SelectQuery) -> Statement {
        if template.contains(AUTO_CONDITIONS_MARKER) {
            // No compiled predicate still yields valid SQL at the marker.
            let predicate = query.where_sql().unwrap_or_else(|| "1 = 1".to_string());
            Statement {
                sql: template
                    .replace(AUTO_CONDITIONS_MARKER, &format!("({predicate})"))
                    .trim()
                    .to_string(),
                params: query.take_params(),
            }
        } else {
            Statement::new(template.trim())
        }
    }

    /// Build and execute the data-section select for a table.
    pub fn execute_select(&mut self, table: &str) -> DumpResult<Vec<Row>> {
        let statement = self.build_select(table)?;
        debug!(table, sql = %statement.sql, "executing select");
        Ok(self.executor.execute(&statement)?)
    }

    /// Count the rows the data-section select would return.
    ///
    /// Rewrites the built statement: everything before the first `FROM`
    /// becomes `SELECT 1`, and the whole statement is wrapped as a
    /// subquery so limits, groupings and DISTINCT keep their effect on
    /// the count.
    pub fn count_rows(&mut self, table: &str) -> DumpResult<u64> {
        let statement = self.build_select(table)?;
        let from = FROM_KEYWORD
            .find(&statement.sql)
            .ok_or_else(|| ExecutionError::new("statement has no FROM clause"))?;
        let inner = format!("SELECT 1 {}", &statement.sql[from.start()..]);
        let counting = Statement {
            sql: format!("SELECT COUNT(*) FROM ({inner}) AS tmp"),
            params: statement.params,
        };

        debug!(table, sql = %counting.sql, "counting rows");
        let rows = self.executor.execute(&counting)?;
        let count = rows
            .first()
            .and_then(Row::first)
            .cloned()
            .map(Value::normalize);
        match count {
            Some(Value::Int(n)) if n >= 0 => Ok(n as u64),
            other => Err(ExecutionError::new(format!(
                "count query returned no scalar: {other:?}"
            ))
            .into()),
        }
    }
}

/// Fetch the distinct values of one column, unfiltered.
///
/// Used for polymorphic dependency target discovery, before any dump
/// state exists.
pub fn distinct_values<E: StatementExecutor>(
    executor: &mut E,
    table: &str,
    column: &str,
) -> DumpResult<Vec<Value>> {
    let mut query = SelectQuery::new(executor.dialect(), table);
    query.project(column).distinct();
    let statement = query.into_statement();

    debug!(table, column, sql = %statement.sql, "fetching distinct values");
    let rows = executor.execute(&statement)?;
    let mut values = Vec::new();
    for row in rows {
        if let Some(value) = row.get(column) {
            let value = value.clone().normalize();
            if !value.is_null() && !values.contains(&value) {
                values.push(value);
            }
        }
    }
    Ok(values)
}
