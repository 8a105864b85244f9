//! Mutable per-run state: the harvest cache, the dump progress, and the
//! per-build recursion guard.
//!
//! All three are plain owned objects threaded explicitly through the call
//! chain, never ambient globals. The cache and dump state live for one
//! run; a guard lives for one top-level statement build.

use std::collections::{BTreeMap, HashSet};

use crate::exec::Value;
use crate::schema::Table;

/// Distinct values already fetched per (table, column).
///
/// Populated either lazily by a harvesting sub-query or eagerly while a
/// table's rows stream through the dumper. Entries are never invalidated
/// within a run; values are type-normalized and kept in first-seen order
/// so parameter lists are deterministic.
#[derive(Debug, Clone, Default)]
pub struct HarvestCache {
    values: BTreeMap<(String, String), Vec<Value>>,
}

impl HarvestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, table: &str, column: &str) -> Option<&[Value]> {
        self.values
            .get(&(table.to_string(), column.to_string()))
            .map(Vec::as_slice)
    }

    /// Create the entry for (table, column) if absent. A dumped table
    /// with zero rows still gets an (empty) entry, so dependents see
    /// "harvested, nothing matched" rather than "never captured".
    pub fn ensure(&mut self, table: &str, column: &str) {
        self.values
            .entry((table.to_string(), column.to_string()))
            .or_default();
    }

    /// Add one value, normalizing and deduplicating. Nulls are skipped:
    /// they are re-admitted by the compiled `IS NULL` arm instead.
    pub fn add(&mut self, table: &str, column: &str, value: Value) {
        let entry = self
            .values
            .entry((table.to_string(), column.to_string()))
            .or_default();
        let value = value.normalize();
        if value.is_null() {
            return;
        }
        if !entry.contains(&value) {
            entry.push(value);
        }
    }

    /// Store a full harvest result, replacing nothing (first write wins).
    pub fn insert(&mut self, table: &str, column: &str, values: Vec<Value>) {
        self.values
            .entry((table.to_string(), column.to_string()))
            .or_insert(values);
    }
}

/// State shared across the whole dump run.
#[derive(Debug, Default)]
pub struct DumpState {
    tables: BTreeMap<String, Table>,
    dumped: HashSet<String>,
    pub cache: HarvestCache,
}

impl DumpState {
    pub fn new(tables: &[Table]) -> Self {
        Self {
            tables: tables
                .iter()
                .map(|t| (t.name.clone(), t.clone()))
                .collect(),
            dumped: HashSet::new(),
            cache: HarvestCache::new(),
        }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Record that a table's data section is fully written. Dependent
    /// filters hitting this table afterwards must find their values in
    /// the cache or fail.
    pub fn mark_dumped(&mut self, name: &str) {
        self.dumped.insert(name.to_string());
    }

    pub fn is_dumped(&self, name: &str) -> bool {
        self.dumped.contains(name)
    }
}

/// LIFO stack of tables currently being resolved within one top-level
/// statement build. Detects dependency cycles during harvesting.
#[derive(Debug, Default)]
pub struct QueryGuard {
    stack: Vec<String>,
}

impl QueryGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, table: &str) {
        self.stack.push(table.to_string());
    }

    pub fn pop(&mut self) {
        self.stack.pop();
    }

    pub fn contains(&self, table: &str) -> bool {
        self.stack.iter().any(|t| t == table)
    }

    /// The resolution chain, for cycle diagnostics.
    pub fn chain(&self) -> &[String] {
        &self.stack
    }
}
