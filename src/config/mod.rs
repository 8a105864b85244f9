//! Dump configuration.
//!
//! A dump is driven by a TOML file naming the tables to keep, the filters
//! and limits to apply, and the cross-table dependencies that must hold in
//! the output. Example:
//!
//! ```toml
//! dialect = "mysql"
//! disable_foreign_keys = true
//!
//! [tables.Customer]
//! limit = 100
//! order_by = "id DESC"
//!
//! [[tables.Billing.dependencies]]
//! column = "customer_id"
//! referenced_table = "Customer"
//! referenced_column = "id"
//! ```
//!
//! Loading happens in two steps: raw serde structs mirror the file, then
//! conversion builds the typed model (checked filters, typed
//! dependencies). Table configs are mutated in two places only: here
//! during load, and by the table orderer when it synthesizes dependent
//! filters; they are read-only afterwards.

pub mod filter;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::sql::dialect::Dialect;

use filter::{Filter, RawFilter};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown filter operator: {0}")]
    UnknownOperator(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid dependency on table {table}: {message}")]
    InvalidDependency { table: String, message: String },
}

/// A declared cross-table dependency, not yet compiled into a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Dependency {
    /// `column` must appear among the dumped values of
    /// `referenced_table.referenced_column` (or be null). The optional
    /// condition is ANDed onto the synthesized predicate.
    Plain {
        column: String,
        referenced_table: String,
        referenced_column: String,
        condition: Option<Filter>,
    },

    /// Polymorphic reference: the value of `table_column` names the table
    /// `column` points into. Targets come from configuration, or are
    /// discovered from the column's distinct data before ordering.
    Polymorphic {
        column: String,
        table_column: String,
        referenced_column: String,
        targets: Vec<String>,
    },
}

/// Per-table dump settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableConfig {
    pub name: String,
    /// Filters in declaration order; the orderer appends synthesized
    /// dependent filters at the end.
    pub filters: Vec<Filter>,
    pub limit: Option<u64>,
    /// Raw ORDER BY clause body.
    pub order_by: Option<String>,
    /// Custom statement template, optionally containing the
    /// `$autoConditions` marker.
    pub query: Option<String>,
    pub dependencies: Vec<Dependency>,
    /// Columns of *this* table that dependent tables need harvested.
    /// Filled by the orderer; consumed by the dumper while streaming rows.
    pub harvest_columns: Vec<String>,
}

impl TableConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Register a column dependents need harvested during this table's dump.
    pub fn add_harvest_column(&mut self, column: &str) {
        if !self.harvest_columns.iter().any(|c| c == column) {
            self.harvest_columns.push(column.to_string());
        }
    }
}

/// Whole-run configuration.
#[derive(Debug, Clone, Default)]
pub struct DumpConfig {
    pub dialect: Dialect,
    /// When non-empty, only these tables are dumped.
    pub only_tables: Vec<String>,
    pub ignored_tables: Vec<String>,
    /// Emit `SET FOREIGN_KEY_CHECKS` bracketing around the data section
    /// (dialects without the switch ignore this).
    pub disable_foreign_keys: bool,
    tables: BTreeMap<String, TableConfig>,
}

impl DumpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawDumpConfig = toml::from_str(contents)?;
        raw.build()
    }

    pub fn table(&self, name: &str) -> Option<&TableConfig> {
        self.tables.get(name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut TableConfig> {
        self.tables.get_mut(name)
    }

    /// Get or create the config for a table. Tables without explicit
    /// configuration dump unfiltered.
    pub fn ensure_table(&mut self, name: &str) -> &mut TableConfig {
        self.tables
            .entry(name.to_string())
            .or_insert_with(|| TableConfig::new(name))
    }

    pub fn insert_table(&mut self, config: TableConfig) {
        self.tables.insert(config.name.clone(), config);
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableConfig> {
        self.tables.values()
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut TableConfig> {
        self.tables.values_mut()
    }

    /// Apply white-list then ignore-list filtering.
    pub fn is_table_included(&self, name: &str) -> bool {
        if !self.only_tables.is_empty() && !self.only_tables.iter().any(|t| t == name) {
            return false;
        }
        !self.ignored_tables.iter().any(|t| t == name)
    }
}

// =============================================================================
// Raw serde mirror
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawDumpConfig {
    dialect: Dialect,
    only_tables: Vec<String>,
    ignored_tables: Vec<String>,
    disable_foreign_keys: bool,
    tables: BTreeMap<String, RawTableConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawTableConfig {
    filters: Vec<RawFilter>,
    limit: Option<u64>,
    order_by: Option<String>,
    query: Option<String>,
    dependencies: Vec<RawDependency>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawDependency {
    column: String,
    #[serde(default)]
    referenced_table: Option<String>,
    /// Polymorphic form: the column whose value names the referenced table.
    #[serde(default)]
    column_as_referenced_table: Option<String>,
    referenced_column: String,
    #[serde(default)]
    condition: Option<RawFilter>,
    /// Known targets for the polymorphic form; discovered from data when
    /// left empty.
    #[serde(default)]
    targets: Vec<String>,
}

impl RawDumpConfig {
    fn build(self) -> Result<DumpConfig, ConfigError> {
        let mut config = DumpConfig {
            dialect: self.dialect,
            only_tables: self.only_tables,
            ignored_tables: self.ignored_tables,
            disable_foreign_keys: self.disable_foreign_keys,
            tables: BTreeMap::new(),
        };
        for (name, raw) in self.tables {
            let table = raw.build(&name)?;
            config.tables.insert(name, table);
        }
        Ok(config)
    }
}

impl RawTableConfig {
    fn build(self, name: &str) -> Result<TableConfig, ConfigError> {
        let filters = self
            .filters
            .iter()
            .map(RawFilter::build)
            .collect::<Result<Vec<_>, _>>()?;
        let dependencies = self
            .dependencies
            .into_iter()
            .map(|raw| raw.build(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TableConfig {
            name: name.to_string(),
            filters,
            limit: self.limit,
            order_by: self.order_by,
            query: self.query,
            dependencies,
            harvest_columns: Vec::new(),
        })
    }
}

impl RawDependency {
    fn build(self, table: &str) -> Result<Dependency, ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidDependency {
            table: table.to_string(),
            message: message.to_string(),
        };
        match (self.referenced_table, self.column_as_referenced_table) {
            (Some(referenced_table), None) => Ok(Dependency::Plain {
                column: self.column,
                referenced_table,
                referenced_column: self.referenced_column,
                condition: self.condition.as_ref().map(RawFilter::build).transpose()?,
            }),
            (None, Some(table_column)) => {
                if self.condition.is_some() {
                    return Err(invalid(
                        "'condition' is not supported on a polymorphic dependency",
                    ));
                }
                Ok(Dependency::Polymorphic {
                    column: self.column,
                    table_column,
                    referenced_column: self.referenced_column,
                    targets: self.targets,
                })
            }
            (Some(_), Some(_)) => Err(invalid(
                "'referenced_table' and 'column_as_referenced_table' are mutually exclusive",
            )),
            (None, None) => Err(invalid(
                "one of 'referenced_table' or 'column_as_referenced_table' is required",
            )),
        }
    }
}
