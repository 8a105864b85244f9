//! Configuration loading end to end: TOML in, typed model out.

use molt::config::filter::{CompareOp, SetOp};
use molt::{ConfigError, Dependency, Dialect, DumpConfig, Filter, Value};

#[test]
fn test_full_config_round() {
    let config = DumpConfig::from_toml_str(
        r#"
        dialect = "mysql"
        disable_foreign_keys = true
        ignored_tables = ["migrations"]

        [tables.Customer]
        limit = 100
        order_by = "id DESC"

        [[tables.Customer.filters]]
        op = "lte"
        column = "id"
        value = 100

        [tables.Billing]

        [[tables.Billing.dependencies]]
        column = "customer_id"
        referenced_table = "Customer"
        referenced_column = "id"
        "#,
    )
    .unwrap();

    assert_eq!(config.dialect, Dialect::MySql);
    assert!(config.disable_foreign_keys);
    assert!(!config.is_table_included("migrations"));
    assert!(config.is_table_included("Customer"));

    let customer = config.table("Customer").unwrap();
    assert_eq!(customer.limit, Some(100));
    assert_eq!(customer.order_by.as_deref(), Some("id DESC"));
    assert_eq!(
        customer.filters,
        vec![Filter::comparison("id", CompareOp::Lte, Value::Int(100))]
    );

    assert_eq!(
        config.table("Billing").unwrap().dependencies,
        vec![Dependency::Plain {
            column: "customer_id".into(),
            referenced_table: "Customer".into(),
            referenced_column: "id".into(),
            condition: None,
        }]
    );
}

#[test]
fn test_nested_composite_filters() {
    let config = DumpConfig::from_toml_str(
        r#"
        [[tables.Customer.filters]]
        op = "or"
        filters = [
            { op = "eq", column = "name", value = "Markus" },
            { op = "and", filters = [
                { op = "gt", column = "id", value = 10 },
                { op = "is_not_null", column = "email" },
            ] },
        ]
        "#,
    )
    .unwrap();

    assert_eq!(
        config.table("Customer").unwrap().filters,
        vec![Filter::or(vec![
            Filter::eq("name", "Markus"),
            Filter::and(vec![
                Filter::comparison("id", CompareOp::Gt, Value::Int(10)),
                Filter::is_not_null("email"),
            ]),
        ])]
    );
}

#[test]
fn test_membership_and_depends_filters() {
    let config = DumpConfig::from_toml_str(
        r#"
        [[tables.Billing.filters]]
        op = "not_in"
        column = "state"
        values = ["void", "draft"]

        [[tables.Billing.filters]]
        op = "depends"
        column = "customer_id"
        referenced_table = "Customer"
        referenced_column = "id"
        "#,
    )
    .unwrap();

    let filters = &config.table("Billing").unwrap().filters;
    assert_eq!(
        filters[0],
        Filter::membership(
            "state",
            SetOp::NotIn,
            vec![Value::from("void"), Value::from("draft")]
        )
    );
    assert_eq!(filters[1], Filter::dependent("customer_id", "Customer", "id"));
}

#[test]
fn test_custom_query_template() {
    let config = DumpConfig::from_toml_str(
        r#"
        [tables.Customer]
        query = "SELECT * FROM Customer c WHERE $autoConditions"
        "#,
    )
    .unwrap();
    assert_eq!(
        config.table("Customer").unwrap().query.as_deref(),
        Some("SELECT * FROM Customer c WHERE $autoConditions")
    );
}

#[test]
fn test_polymorphic_dependency_with_targets() {
    let config = DumpConfig::from_toml_str(
        r#"
        [[tables.BadgeMembership.dependencies]]
        column = "item_id"
        column_as_referenced_table = "item_table"
        referenced_column = "id"
        targets = ["Customer", "SKU"]
        "#,
    )
    .unwrap();
    assert_eq!(
        config.table("BadgeMembership").unwrap().dependencies,
        vec![Dependency::Polymorphic {
            column: "item_id".into(),
            table_column: "item_table".into(),
            referenced_column: "id".into(),
            targets: vec!["Customer".into(), "SKU".into()],
        }]
    );
}

#[test]
fn test_invalid_declarations_fail_loading() {
    let unknown = DumpConfig::from_toml_str(
        r#"
        [[tables.T.filters]]
        op = "between"
        column = "id"
        value = 1
        "#,
    )
    .unwrap_err();
    assert!(matches!(unknown, ConfigError::UnknownOperator(op) if op == "between"));

    let depends_with_value = DumpConfig::from_toml_str(
        r#"
        [[tables.T.filters]]
        op = "depends"
        column = "ref_id"
        value = 1
        referenced_table = "Other"
        referenced_column = "id"
        "#,
    )
    .unwrap_err();
    assert!(matches!(depends_with_value, ConfigError::InvalidFilter(_)));

    let both_forms = DumpConfig::from_toml_str(
        r#"
        [[tables.T.dependencies]]
        column = "ref_id"
        referenced_table = "Other"
        column_as_referenced_table = "ref_table"
        referenced_column = "id"
        "#,
    )
    .unwrap_err();
    assert!(matches!(both_forms, ConfigError::InvalidDependency { .. }));
}

#[test]
fn test_from_file() {
    let path = std::env::temp_dir().join("molt_config_test.toml");
    std::fs::write(&path, "dialect = \"postgres\"\n").unwrap();
    let config = DumpConfig::from_file(&path).unwrap();
    assert_eq!(config.dialect, Dialect::Postgres);
    std::fs::remove_file(&path).ok();

    let missing = DumpConfig::from_file("/nonexistent/molt.toml").unwrap_err();
    assert!(matches!(missing, ConfigError::FileNotFound(_)));
}
