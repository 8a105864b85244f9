//! Filter compilation and the harvesting protocol.
//!
//! Compilation turns a [`Filter`] tree into a predicate fragment against
//! the current [`SelectQuery`], binding parameters as it goes. Dependent
//! filters are the interesting case: their value set comes from the
//! harvest cache, or from a nested sub-query build against the referenced
//! table, which may itself recurse. The [`QueryGuard`] bounds that
//! recursion: a referenced table already on the stack means a cycle, and
//! the filter contributes no constraint for that invocation rather than
//! recursing forever.

use tracing::{debug, warn};

use crate::config::filter::Filter;
use crate::error::{DumpError, DumpResult};
use crate::exec::{StatementExecutor, Value};
use crate::sql::select::SelectQuery;

use super::loader::DataLoader;
use super::state::QueryGuard;

/// Placeholder bound into an empty membership list so the predicate stays
/// syntactically valid and matches no real row.
pub(crate) const EMPTY_LIST_SENTINEL: &str = "_________UNDEFINED__________";

impl<'a, E: StatementExecutor> DataLoader<'a, E> {
    /// Compile one filter into a predicate fragment, binding parameters
    /// on `query`. Returns `None` when the filter contributes no
    /// constraint (a dependent filter whose harvest was cycle-broken).
    pub(crate) fn compile_filter(
        &mut self,
        filter: &Filter,
        table: &str,
        query: &mut SelectQuery,
        guard: &mut QueryGuard,
    ) -> DumpResult<Option<String>> {
        match filter {
            Filter::Comparison { column, op, value } => {
                let marker = query.bind_scalar(value.clone());
                let column = query.dialect().quote_identifier(column);
                Ok(Some(format!("{column} {} {marker}", op.sql())))
            }

            Filter::Null { column, negated } => {
                let column = query.dialect().quote_identifier(column);
                let not = if *negated { "NOT " } else { "" };
                Ok(Some(format!("{column} IS {not}NULL")))
            }

            Filter::Membership { column, op, values } => {
                Ok(Some(Self::compile_membership(query, column, op.sql(), values)))
            }

            Filter::Dependent {
                column,
                referenced_table,
                referenced_column,
            } => self.compile_dependent(
                table,
                column,
                referenced_table,
                referenced_column,
                query,
                guard,
            ),

            Filter::Composite { op, filters } => {
                let mut parts = Vec::with_capacity(filters.len());
                for child in filters {
                    if let Some(predicate) = self.compile_filter(child, table, query, guard)? {
                        parts.push(format!("({predicate})"));
                    }
                }
                if parts.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(parts.join(&format!(" {} ", op.sql()))))
                }
            }
        }
    }

    /// Emit a membership predicate, substituting the sentinel for an
    /// empty value list.
    fn compile_membership(
        query: &mut SelectQuery,
        column: &str,
        op_sql: &str,
        values: &[Value],
    ) -> String {
        let sentinel = [Value::Text(EMPTY_LIST_SENTINEL.to_string())];
        let values = if values.is_empty() {
            &sentinel[..]
        } else {
            values
        };
        let markers = query.bind_list(values);
        let column = query.dialect().quote_identifier(column);
        format!("{column} {op_sql} ({})", markers.join(", "))
    }

    /// Resolve a dependent filter into a membership over harvested values,
    /// unioned with the null arm so optional relationships survive.
    fn compile_dependent(
        &mut self,
        table: &str,
        column: &str,
        referenced_table: &str,
        referenced_column: &str,
        query: &mut SelectQuery,
        guard: &mut QueryGuard,
    ) -> DumpResult<Option<String>> {
        let values = match self.harvest(table, column, referenced_table, referenced_column, guard)?
        {
            Some(values) => values,
            None => return Ok(None),
        };

        let membership = Self::compile_membership(query, column, "IN", &values);
        let column = query.dialect().quote_identifier(column);
        Ok(Some(format!("({membership}) OR ({column} IS NULL)")))
    }

    /// The harvesting protocol: cached values are reused; a referenced
    /// table already dumped without a cache entry is a fatal
    /// configuration error (continuing would silently under-filter); a
    /// referenced table already being resolved breaks the cycle; anything
    /// else runs the sub-query and caches its result.
    fn harvest(
        &mut self,
        table: &str,
        column: &str,
        referenced_table: &str,
        referenced_column: &str,
        guard: &mut QueryGuard,
    ) -> DumpResult<Option<Vec<Value>>> {
        if let Some(values) = self.state.cache.get(referenced_table, referenced_column) {
            return Ok(Some(values.to_vec()));
        }

        if self.state.is_dumped(referenced_table) {
            return Err(DumpError::MissingHarvest {
                table: referenced_table.to_string(),
                column: referenced_column.to_string(),
                dependent: format!("{table}.{column}"),
            });
        }

        if guard.contains(referenced_table) {
            warn!(
                table,
                referenced_table,
                chain = ?guard.chain(),
                "breaking circular dependency; filter contributes no constraint"
            );
            return Ok(None);
        }

        guard.push(table);
        let built = self.build_select_with(referenced_table, Some(referenced_column), guard);
        guard.pop();
        let statement = built?;

        debug!(
            referenced_table,
            referenced_column,
            dependent = table,
            sql = %statement.sql,
            "harvesting"
        );
        let rows = self.executor.execute(&statement)?;

        let mut values = Vec::new();
        for row in rows {
            if let Some(value) = row.get(referenced_column) {
                let value = value.clone().normalize();
                if !value.is_null() && !values.contains(&value) {
                    values.push(value);
                }
            }
        }
        debug!(referenced_table, referenced_column, count = values.len(), "harvest complete");

        self.state
            .cache
            .insert(referenced_table, referenced_column, values.clone());
        Ok(Some(values))
    }
}
