//! Statement rendering through the public API.

use molt::{Dialect, SelectQuery, Value};

#[test]
fn test_bare_select_per_dialect() {
    assert_eq!(
        SelectQuery::new(Dialect::Ansi, "Customer").to_sql(),
        "SELECT * FROM \"Customer\" t"
    );
    assert_eq!(
        SelectQuery::new(Dialect::MySql, "Customer").to_sql(),
        "SELECT * FROM `Customer` t"
    );
    assert_eq!(
        SelectQuery::new(Dialect::TSql, "Customer").to_sql(),
        "SELECT * FROM [Customer] t"
    );
}

#[test]
fn test_identifier_quoting_doubles_embedded_quotes() {
    assert_eq!(
        Dialect::MySql.quote_identifier("weird`name"),
        "`weird``name`"
    );
    assert_eq!(
        Dialect::Ansi.quote_identifier("weird\"name"),
        "\"weird\"\"name\""
    );
    assert_eq!(Dialect::TSql.quote_identifier("weird]name"), "[weird]]name]");
}

#[test]
fn test_full_statement_shape() {
    let mut query = SelectQuery::new(Dialect::MySql, "Customer");
    let m0 = query.bind_scalar(Value::Int(100));
    query.push_predicate(format!("`id` < {m0}"));
    let markers = query.bind_list(&[Value::from("Markus"), Value::from("John")]);
    query.push_predicate(format!("`name` IN ({})", markers.join(", ")));
    query.set_order_by("id DESC").set_limit(10);

    let statement = query.into_statement();
    assert_eq!(
        statement.sql,
        "SELECT * FROM `Customer` t WHERE (`id` < :param_0) AND \
         (`name` IN (:param_1_0, :param_1_1)) ORDER BY id DESC LIMIT 10"
    );
    assert_eq!(
        statement.params,
        vec![
            ("param_0".to_string(), Value::Int(100)),
            ("param_1_0".to_string(), Value::from("Markus")),
            ("param_1_1".to_string(), Value::from("John")),
        ]
    );
}

#[test]
fn test_harvest_projection() {
    let mut query = SelectQuery::new(Dialect::MySql, "Customer");
    query.project("id").distinct();
    assert_eq!(query.to_sql(), "SELECT DISTINCT `id` FROM `Customer` t");
}

#[test]
fn test_parameter_indices_are_per_statement() {
    let mut first = SelectQuery::new(Dialect::Ansi, "A");
    let mut second = SelectQuery::new(Dialect::Ansi, "B");
    assert_eq!(first.bind_scalar(Value::Int(1)), ":param_0");
    assert_eq!(second.bind_scalar(Value::Int(2)), ":param_0");
    assert_eq!(first.bind_scalar(Value::Int(3)), ":param_1");
}
