//! Schema types and the introspection boundary.
//!
//! The core treats the schema as read-only input: a [`SchemaProvider`]
//! enumerates tables once at the start of a run, and everything after that
//! works on the returned value types. How tables are discovered (driver
//! catalogs, information_schema, a fixture) is the provider's business.

use crate::exec::ExecutionError;

/// A database table as reported by the schema source.
///
/// Identity is the name, case-sensitive, matching the source schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    /// Columns in schema order.
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    #[must_use]
    pub fn with_foreign_keys(mut self, foreign_keys: Vec<ForeignKey>) -> Self {
        self.foreign_keys = foreign_keys;
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// A column: name plus the source type as an opaque string.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub sql_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// A foreign-key reference: local column pointing into another table.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

impl ForeignKey {
    pub fn new(
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
        }
    }
}

/// Enumerates the tables of the source database.
pub trait SchemaProvider {
    /// List all tables, including their columns and foreign keys, in the
    /// order the source reports them. That order is the tie-breaker for
    /// the dump ordering, so providers should keep it stable.
    fn list_tables(&mut self) -> Result<Vec<Table>, ExecutionError>;
}
