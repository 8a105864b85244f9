//! Output boundary of a dump run.
//!
//! The dumper never formats rows itself; everything that ends up in the
//! dump file goes through a [`RowSink`]. That keeps the rendering format
//! (INSERT statements, CSV, a test recorder) out of the core.

use std::io;

use crate::exec::Row;
use crate::schema::Table;

/// Receives the ordered output of a dump run.
///
/// Calls arrive in file order: preamble comments and session statements
/// first, then for each table one `begin_table` followed by its rows,
/// then trailing session statements.
pub trait RowSink {
    /// A free-form comment line (without the comment prefix).
    fn write_comment(&mut self, text: &str) -> io::Result<()> {
        let _ = text;
        Ok(())
    }

    /// A raw session statement outside any table's data section, such as
    /// a foreign-key-checks toggle.
    fn write_statement(&mut self, sql: &str) -> io::Result<()>;

    /// Start of a table's data section, in dump order.
    fn begin_table(&mut self, table: &Table) -> io::Result<()>;

    /// One row of the current table, in result order.
    fn write_row(&mut self, table: &Table, row: &Row) -> io::Result<()>;
}
