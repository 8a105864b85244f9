//! # Molt
//!
//! Dump a filtered, referentially consistent subset of a relational
//! database.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Configuration (TOML)                        │
//! │  (table filters, limits, declared dependencies)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [schema introspection]
//! ┌─────────────────────────────────────────────────────────┐
//! │          Table Ordering + Dependency Synthesis           │
//! │  (referenced tables first, dependencies become filters)  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [per table]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Filter Compilation → SELECT Statement             │
//! │        + Harvesting (values dumped so far)               │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [executor / sink]
//! ┌─────────────────────────────────────────────────────────┐
//! │              Filtered, Consistent Rows                   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The crate is a core, not a tool: database access and output rendering
//! stay behind the [`exec::StatementExecutor`], [`schema::SchemaProvider`]
//! and [`dump::RowSink`] traits.

pub mod config;
pub mod dump;
pub mod error;
pub mod exec;
pub mod schema;
pub mod sql;

pub use config::filter::Filter;
pub use config::{ConfigError, Dependency, DumpConfig, TableConfig};
pub use dump::{DataLoader, DumpState, Dumper, DumpSummary, HarvestCache, QueryGuard, RowSink};
pub use error::{DumpError, DumpResult};
pub use exec::{ExecutionError, Row, Statement, StatementExecutor, Value};
pub use schema::{Column, ForeignKey, SchemaProvider, Table};
pub use sql::{Dialect, SelectQuery};
