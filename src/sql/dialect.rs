//! SQL dialect differences.
//!
//! The dumper only needs a thin slice of dialect awareness: how to quote
//! identifiers, how to start a comment line, and whether foreign-key
//! checks can be toggled around the data section. The set is closed, so a
//! plain enum with exhaustive matches does the job.

use serde::Deserialize;

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// ANSI double-quoted identifiers. The default.
    #[default]
    Ansi,
    /// MySQL / MariaDB backtick quoting.
    MySql,
    /// PostgreSQL (ANSI quoting, kept separate for future divergence).
    Postgres,
    /// SQL Server bracket quoting.
    TSql,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Ansi => "ansi",
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::TSql => "tsql",
        }
    }

    /// Quote an identifier (table, column, alias), doubling any embedded
    /// closing quote character.
    pub fn quote_identifier(&self, ident: &str) -> String {
        match self {
            Dialect::Ansi | Dialect::Postgres => {
                format!("\"{}\"", ident.replace('"', "\"\""))
            }
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
            Dialect::TSql => format!("[{}]", ident.replace(']', "]]")),
        }
    }

    /// Prefix for a comment line in a dump file.
    pub fn comment_prefix(&self) -> &'static str {
        "-- "
    }

    /// Statement toggling foreign-key enforcement, where the dialect has
    /// a session-level switch.
    pub fn foreign_key_checks(&self, enabled: bool) -> Option<String> {
        match self {
            Dialect::MySql => Some(format!(
                "SET FOREIGN_KEY_CHECKS={};",
                if enabled { 1 } else { 0 }
            )),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
