//! Table ordering driven by a loaded configuration.

use molt::dump::order::order;
use molt::{ConfigError, DumpConfig, Filter, ForeignKey, Table};

fn names(tables: &[Table]) -> Vec<&str> {
    tables.iter().map(|t| t.name.as_str()).collect()
}

#[test]
fn test_foreign_keys_and_declared_dependencies_combine() {
    // Order has a foreign key to Billing; Billing declares a dependency
    // on Customer in configuration only.
    let tables = vec![
        Table::new("Order")
            .with_foreign_keys(vec![ForeignKey::new("billing_id", "Billing", "id")]),
        Table::new("Billing"),
        Table::new("Customer"),
    ];
    let mut config = DumpConfig::from_toml_str(
        r#"
        [[tables.Billing.dependencies]]
        column = "customer_id"
        referenced_table = "Customer"
        referenced_column = "id"
        "#,
    )
    .unwrap();

    let report = order(tables, &mut config).unwrap();
    assert_eq!(names(&report.tables), vec!["Customer", "Billing", "Order"]);
    assert!(report.cycle.is_empty());

    // The declared dependency became a filter, and Customer now knows
    // which column to keep harvested while it dumps.
    assert_eq!(
        config.table("Billing").unwrap().filters,
        vec![Filter::dependent("customer_id", "Customer", "id")]
    );
    assert_eq!(
        config.table("Customer").unwrap().harvest_columns,
        vec!["id".to_string()]
    );
}

#[test]
fn test_conditioned_dependency_is_anded() {
    let tables = vec![Table::new("Table1"), Table::new("Table2")];
    let mut config = DumpConfig::from_toml_str(
        r#"
        [[tables.Table1.dependencies]]
        column = "ref_id"
        referenced_table = "Table2"
        referenced_column = "id"
        condition = { op = "eq", column = "ref_table", value = "Table2" }
        "#,
    )
    .unwrap();

    order(tables, &mut config).unwrap();
    assert_eq!(
        config.table("Table1").unwrap().filters,
        vec![Filter::and(vec![
            Filter::dependent("ref_id", "Table2", "id"),
            Filter::eq("ref_table", "Table2"),
        ])]
    );
}

#[test]
fn test_foreign_keys_outside_the_dump_are_ignored() {
    let tables = vec![
        Table::new("Billing")
            .with_foreign_keys(vec![ForeignKey::new("customer_id", "Customer", "id")]),
    ];
    let mut config = DumpConfig::new();
    let report = order(tables, &mut config).unwrap();
    assert_eq!(names(&report.tables), vec!["Billing"]);
}

#[test]
fn test_self_reference_does_not_cycle() {
    let tables = vec![
        Table::new("Employee")
            .with_foreign_keys(vec![ForeignKey::new("manager_id", "Employee", "id")]),
    ];
    let mut config = DumpConfig::new();
    let report = order(tables, &mut config).unwrap();
    assert_eq!(names(&report.tables), vec!["Employee"]);
    assert!(report.cycle.is_empty());
}

#[test]
fn test_cycle_is_reported_and_kept_in_input_order() {
    let tables = vec![
        Table::new("A").with_foreign_keys(vec![ForeignKey::new("b_id", "B", "id")]),
        Table::new("B").with_foreign_keys(vec![ForeignKey::new("a_id", "A", "id")]),
        Table::new("Standalone"),
    ];
    let mut config = DumpConfig::new();
    let report = order(tables, &mut config).unwrap();
    assert_eq!(names(&report.tables), vec!["Standalone", "A", "B"]);
    assert_eq!(report.cycle, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn test_declared_dependency_must_target_dumped_table() {
    let tables = vec![Table::new("Billing")];
    let mut config = DumpConfig::from_toml_str(
        r#"
        [[tables.Billing.dependencies]]
        column = "customer_id"
        referenced_table = "Customer"
        referenced_column = "id"
        "#,
    )
    .unwrap();
    let err = order(tables, &mut config).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidDependency { table, .. } if table == "Billing"));
}
