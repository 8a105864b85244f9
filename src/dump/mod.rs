//! The dump pipeline.
//!
//! - `state`: harvest cache, dump progress, recursion guard.
//! - `loader`: statement building, execution and counting.
//! - `compiler`: filter compilation and the harvesting protocol.
//! - `order`: table ordering and dependency synthesis.
//! - `sink`: the output boundary.
//!
//! [`Dumper`] ties them together: introspect, order, then stream each
//! table's filtered rows to the sink while harvesting the columns later
//! tables depend on.

mod compiler;
mod loader;
pub mod order;
mod sink;
mod state;

pub use loader::{distinct_values, DataLoader, AUTO_CONDITIONS_MARKER};
pub use order::OrderReport;
pub use sink::RowSink;
pub use state::{DumpState, HarvestCache, QueryGuard};

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::config::{Dependency, DumpConfig};
use crate::error::DumpResult;
use crate::exec::{StatementExecutor, Value};
use crate::schema::SchemaProvider;

/// Totals of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpSummary {
    pub tables_dumped: usize,
    pub rows_dumped: u64,
    /// Tables that sat on a dependency cycle and were dumped in original
    /// order instead (empty when the ordering fully resolved).
    pub cycle: Vec<String>,
}

/// Drives one dump run end to end.
pub struct Dumper {
    config: DumpConfig,
}

impl Dumper {
    pub fn new(config: DumpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Run the dump: introspect the schema, resolve the table order, then
    /// write each table's filtered rows to `sink`.
    pub fn run<S, E, W>(
        &mut self,
        schema: &mut S,
        executor: &mut E,
        sink: &mut W,
    ) -> DumpResult<DumpSummary>
    where
        S: SchemaProvider,
        E: StatementExecutor,
        W: RowSink,
    {
        let tables: Vec<_> = schema
            .list_tables()?
            .into_iter()
            .filter(|t| self.config.is_table_included(&t.name))
            .collect();
        info!(tables = tables.len(), "starting dump");

        let dumped: BTreeSet<String> = tables.iter().map(|t| t.name.clone()).collect();
        self.discover_polymorphic_targets(&dumped, executor)?;
        let report = order::order(tables, &mut self.config)?;
        let mut state = DumpState::new(&report.tables);

        let dialect = self.config.dialect;
        sink.write_comment(&format!("dump of {} tables", report.tables.len()))?;
        if self.config.disable_foreign_keys {
            if let Some(off) = dialect.foreign_key_checks(false) {
                sink.write_statement(&off)?;
            }
        }

        let mut rows_dumped = 0u64;
        for table in &report.tables {
            let harvest_columns = self
                .config
                .table(&table.name)
                .map(|c| c.harvest_columns.clone())
                .unwrap_or_default();
            for column in &harvest_columns {
                state.cache.ensure(&table.name, column);
            }

            let rows = {
                let mut loader = DataLoader::new(executor, &self.config, &mut state);
                loader.execute_select(&table.name)?
            };

            sink.begin_table(table)?;
            for row in &rows {
                sink.write_row(table, row)?;
                for column in &harvest_columns {
                    if let Some(value) = row.get(column) {
                        state.cache.add(&table.name, column, value.clone());
                    }
                }
            }
            state.mark_dumped(&table.name);
            rows_dumped += rows.len() as u64;
            info!(table = %table.name, rows = rows.len(), "table dumped");
        }

        if self.config.disable_foreign_keys {
            if let Some(on) = dialect.foreign_key_checks(true) {
                sink.write_statement(&on)?;
            }
        }

        Ok(DumpSummary {
            tables_dumped: report.tables.len(),
            rows_dumped,
            cycle: report.cycle,
        })
    }

    /// Fill in the targets of polymorphic dependencies that left them to
    /// be discovered: the distinct values of the discriminator column,
    /// restricted to tables that are part of the dump.
    fn discover_polymorphic_targets<E: StatementExecutor>(
        &mut self,
        dumped: &BTreeSet<String>,
        executor: &mut E,
    ) -> DumpResult<()> {
        for table_config in self.config.tables_mut() {
            if !dumped.contains(&table_config.name) {
                continue;
            }
            let table = table_config.name.clone();
            for dependency in &mut table_config.dependencies {
                let Dependency::Polymorphic {
                    table_column,
                    targets,
                    ..
                } = dependency
                else {
                    continue;
                };
                if !targets.is_empty() {
                    continue;
                }
                for value in distinct_values(executor, &table, table_column)? {
                    if let Value::Text(name) = value {
                        if dumped.contains(&name) {
                            targets.push(name);
                        }
                    }
                }
                debug!(table = %table, column = %table_column, targets = ?targets, "discovered polymorphic targets");
            }
        }
        Ok(())
    }
}
