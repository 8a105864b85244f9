//! Table ordering and dependent-filter synthesis.
//!
//! Runs once before any data is read. Builds a directed dependency graph
//! (an edge referenced→dependent for every foreign key and every declared
//! dependency), topologically sorts it with a stable Kahn pass, and
//! synthesizes the declared dependencies into dependent filters on the
//! affected table configs. By the time statements are built, dependencies
//! are just filters.
//!
//! A cyclic subset cannot be ordered correctly; those tables are emitted
//! in their original order with a surfaced diagnostic, trading referential
//! correctness for termination (harvest-time cycle breaking catches the
//! rest).

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tracing::warn;

use crate::config::filter::Filter;
use crate::config::{ConfigError, Dependency, DumpConfig};
use crate::schema::Table;

/// Result of ordering: the tables in dump order, plus the subset left
/// unresolved by a dependency cycle (empty when the graph is acyclic).
#[derive(Debug)]
pub struct OrderReport {
    pub tables: Vec<Table>,
    pub cycle: Vec<String>,
}

/// Order `tables` for dumping and synthesize dependent filters into
/// `config`.
///
/// The input order is the determinism anchor: ties in the topological
/// sort, and the cyclic remainder, both fall back to it.
pub fn order(tables: Vec<Table>, config: &mut DumpConfig) -> Result<OrderReport, ConfigError> {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut nodes: HashMap<String, NodeIndex> = HashMap::new();
    for table in &tables {
        let idx = graph.add_node(table.name.clone());
        nodes.insert(table.name.clone(), idx);
    }

    // Foreign keys: referenced table must be dumped first. Keys pointing
    // outside the dumped set impose no ordering; self-references cannot.
    for table in &tables {
        let from = nodes[&table.name];
        for fk in &table.foreign_keys {
            if fk.referenced_table == table.name {
                continue;
            }
            if let Some(&referenced) = nodes.get(&fk.referenced_table) {
                graph.add_edge(referenced, from, ());
            }
        }
    }

    synthesize_dependencies(&tables, config, &mut graph, &nodes)?;

    // Stable Kahn: repeatedly emit the first table (in input order) whose
    // remaining in-degree is zero.
    let mut in_degree: HashMap<NodeIndex, usize> = graph
        .node_indices()
        .map(|idx| (idx, graph.neighbors_directed(idx, Direction::Incoming).count()))
        .collect();
    let mut emitted = vec![false; tables.len()];
    let mut ordered = Vec::with_capacity(tables.len());

    loop {
        let next = tables.iter().enumerate().find(|(position, table)| {
            !emitted[*position] && in_degree[&nodes[&table.name]] == 0
        });
        let Some((position, table)) = next else { break };
        emitted[position] = true;
        let idx = nodes[&table.name];
        for dependent in graph.neighbors_directed(idx, Direction::Outgoing) {
            if let Some(degree) = in_degree.get_mut(&dependent) {
                *degree = degree.saturating_sub(1);
            }
        }
        ordered.push(table.clone());
    }

    // Whatever remains sits on a cycle; emit it in input order.
    let cycle: Vec<String> = tables
        .iter()
        .enumerate()
        .filter(|(position, _)| !emitted[*position])
        .map(|(_, table)| table.name.clone())
        .collect();
    if !cycle.is_empty() {
        warn!(
            tables = ?cycle,
            "cyclic table dependencies; falling back to original order for the cyclic subset"
        );
        for table in &tables {
            if cycle.contains(&table.name) {
                ordered.push(table.clone());
            }
        }
    }

    Ok(OrderReport {
        tables: ordered,
        cycle,
    })
}

/// Turn each declared dependency into a dependent filter on its table and
/// register the referenced columns for harvesting during the referenced
/// table's dump.
fn synthesize_dependencies(
    tables: &[Table],
    config: &mut DumpConfig,
    graph: &mut DiGraph<String, ()>,
    nodes: &HashMap<String, NodeIndex>,
) -> Result<(), ConfigError> {
    for table in tables {
        let Some(table_config) = config.table(&table.name) else {
            continue;
        };
        let dependencies = table_config.dependencies.clone();
        let mut synthesized = Vec::new();

        for dependency in &dependencies {
            match dependency {
                Dependency::Plain {
                    column,
                    referenced_table,
                    referenced_column,
                    condition,
                } => {
                    let &referenced = nodes.get(referenced_table.as_str()).ok_or_else(|| {
                        ConfigError::InvalidDependency {
                            table: table.name.clone(),
                            message: format!(
                                "referenced table {referenced_table} is not part of the dump"
                            ),
                        }
                    })?;
                    if referenced_table != &table.name {
                        graph.add_edge(referenced, nodes[&table.name], ());
                    }
                    config
                        .ensure_table(referenced_table)
                        .add_harvest_column(referenced_column);

                    let dependent =
                        Filter::dependent(column.clone(), referenced_table.clone(), referenced_column.clone());
                    synthesized.push(match condition {
                        Some(condition) => Filter::and(vec![dependent, condition.clone()]),
                        None => dependent,
                    });
                }

                Dependency::Polymorphic {
                    column,
                    table_column,
                    referenced_column,
                    targets,
                } => {
                    if targets.is_empty() {
                        warn!(
                            table = %table.name,
                            column = %table_column,
                            "polymorphic dependency has no targets; filter contributes no constraint"
                        );
                        continue;
                    }
                    let mut branches = Vec::with_capacity(targets.len());
                    for target in targets {
                        let &referenced = nodes.get(target.as_str()).ok_or_else(|| {
                            ConfigError::InvalidDependency {
                                table: table.name.clone(),
                                message: format!("target table {target} is not part of the dump"),
                            }
                        })?;
                        if target != &table.name {
                            graph.add_edge(referenced, nodes[&table.name], ());
                        }
                        config
                            .ensure_table(target)
                            .add_harvest_column(referenced_column);

                        branches.push(Filter::and(vec![
                            Filter::dependent(
                                column.clone(),
                                target.clone(),
                                referenced_column.clone(),
                            ),
                            Filter::eq(table_column.clone(), target.as_str()),
                        ]));
                    }
                    synthesized.push(if branches.len() == 1 {
                        branches.swap_remove(0)
                    } else {
                        Filter::or(branches)
                    });
                }
            }
        }

        if !synthesized.is_empty() {
            config
                .ensure_table(&table.name)
                .filters
                .extend(synthesized);
        }
    }
    Ok(())
}
