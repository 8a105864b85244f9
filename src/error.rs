//! Crate-level error type for a dump run.

use thiserror::Error;

use crate::config::ConfigError;
use crate::exec::ExecutionError;

/// Result type for dump operations.
pub type DumpResult<T> = Result<T, DumpError>;

/// Errors that abort a dump run.
///
/// Cycle detection never surfaces here: both circular harvests and cyclic
/// table orderings degrade gracefully with a logged warning, because an
/// incomplete filter beats infinite recursion. Missing-harvest and
/// configuration errors are fatal, since continuing would silently produce
/// an under-filtered dump.
#[derive(Debug, Error)]
pub enum DumpError {
    /// Invalid or unloadable configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The external executor reported a failure; propagated unchanged.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// Writing to the output sink failed.
    #[error("output failed: {0}")]
    Io(#[from] std::io::Error),

    /// A dependent filter targets a table that was already fully dumped
    /// without its referenced column being captured.
    #[error("column {column} of table {table} has not been captured in the dump (required by {dependent})")]
    MissingHarvest {
        table: String,
        column: String,
        dependent: String,
    },

    /// A statement build referenced a table that is not part of the dump.
    #[error("unknown table {table} (referenced by {context})")]
    UnknownTable { table: String, context: String },
}
