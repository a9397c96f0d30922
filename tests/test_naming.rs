//! Index, constraint and file naming across a full generation

mod common;

use common::{files_in, generate, pk, plain, row};
use schemagen::GeneratorConfig;

#[test]
fn test_two_u1_columns_make_one_compound_unique_index() {
    let sink = generate(
        &[
            row("ORDERS", "ID", "NUMBER", pk),
            row("ORDERS", "REGION", "VARCHAR2", |r| r.index = "U1".to_string()),
            row("ORDERS", "CODE", "VARCHAR2", |r| r.index = "U1".to_string()),
        ],
        GeneratorConfig::default(),
    );

    assert_eq!(
        files_in(&sink, "INDEXES"),
        vec!["001_ORDERS_COMPOUND_UI.sql", "001_ORDERS_PK.sql"]
    );
    let index = sink.get("INDEXES/001_ORDERS_COMPOUND_UI.sql").unwrap();
    assert!(index.contains("CREATE UNIQUE INDEX APP_OWNER.ORDERS_COMPOUND_UI ON APP_OWNER.ORDERS\n(REGION, CODE)"));
    let constraint = sink.get("CONSTRAINTS/001_2_ORDERS_COMPOUND_UI.sql").unwrap();
    assert!(constraint.contains("CONSTRAINT ORDERS_COMPOUND_UI\n    UNIQUE\n    (REGION, CODE)"));
}

#[test]
fn test_single_primary_key_constraint_uses_its_index() {
    let sink = generate(&[row("ORDERS", "ID", "NUMBER", pk)], GeneratorConfig::default());

    let index = sink.get("INDEXES/001_ORDERS_PK.sql").unwrap();
    assert!(index.contains("CREATE UNIQUE INDEX APP_OWNER.ORDERS_PK"));
    let constraint = sink.get("CONSTRAINTS/001_1_ORDERS_PK.sql").unwrap();
    assert!(constraint.contains("PRIMARY KEY"));
    assert!(constraint.contains("USING INDEX APP_OWNER.ORDERS_PK"));
}

#[test]
fn test_primary_key_requested_as_plain_index_stays_unique() {
    let sink = generate(
        &[row("ORDERS", "ID", "NUMBER", |r| {
            pk(r);
            r.index = "Y".to_string();
        })],
        GeneratorConfig::default(),
    );
    assert_eq!(files_in(&sink, "INDEXES"), vec!["001_ORDERS_PK.sql"]);
    assert!(sink
        .get("INDEXES/001_ORDERS_PK.sql")
        .unwrap()
        .contains("CREATE UNIQUE INDEX"));
}

#[test]
fn test_compound_primary_key_suppresses_single_column_keys() {
    let sink = generate(
        &[
            row("ORDER_LINES", "ORDER_ID", "NUMBER", pk),
            row("ORDER_LINES", "LINE_NO", "NUMBER", pk),
            row("ORDER_LINES", "SKU", "VARCHAR2", plain),
        ],
        GeneratorConfig::default(),
    );

    assert_eq!(files_in(&sink, "INDEXES"), vec!["001_ORDER_LINES_COMPOUND_PK.sql"]);
    assert_eq!(
        files_in(&sink, "CONSTRAINTS"),
        vec!["001_1_ORDER_LINES_COMPOUND_PK.sql"]
    );
    let constraint = sink
        .get("CONSTRAINTS/001_1_ORDER_LINES_COMPOUND_PK.sql")
        .unwrap();
    assert!(constraint.contains("(ORDER_ID, LINE_NO)"));
}

#[test]
fn test_counter_suffix_rule_is_per_table() {
    let sink = generate(
        &[
            row("ORDERS", "ID", "NUMBER", pk),
            row("ORDERS", "EMAIL", "VARCHAR2", |r| r.index = "U".to_string()),
            row("ORDERS", "STATUS", "VARCHAR2", |r| r.index = "Y".to_string()),
            row("ORDERS", "CODE", "VARCHAR2", |r| r.index = "Y".to_string()),
            row("ITEMS", "SKU", "VARCHAR2", |r| r.index = "Y".to_string()),
        ],
        GeneratorConfig::default(),
    );

    assert_eq!(
        files_in(&sink, "INDEXES"),
        vec![
            "001_ORDERS_PK.sql",
            "001_ORDERS_UI.sql",
            "001_ORDERS_NI2.sql",
            "001_ORDERS_NI3.sql",
            "002_ITEMS_NI.sql"
        ]
    );
    assert_eq!(
        files_in(&sink, "CONSTRAINTS"),
        vec!["001_1_ORDERS_PK.sql", "001_2_ORDERS_UI.sql"]
    );
}

#[test]
fn test_status_column_type_and_options() {
    let sink = generate(
        &[row("ORDERS", "STATUS", "VARCHAR2", |r| {
            r.size = "20".to_string();
            r.units = "CHAR".to_string();
            r.not_null = "Y".to_string();
            r.default = "ACTIVE".to_string();
        })],
        GeneratorConfig::default(),
    );
    let table = sink.get("TABLES/001_ORDERS.sql").unwrap();
    let line = table
        .lines()
        .find(|l| l.trim_start().starts_with("STATUS"))
        .unwrap();
    assert!(line.contains("VARCHAR2(20 CHAR)"));
    assert!(line.ends_with("DEFAULT 'ACTIVE' NOT NULL"));
}

#[test]
fn test_owner_schema_uses_account_name() {
    let mut config = GeneratorConfig::default();
    config.loader.enable = true;
    let sink = generate(
        &[row("ORDERS", "ID", "NUMBER", |r| {
            pk(r);
            r.gen_loader = "Y".to_string();
        })],
        config,
    );

    assert!(sink
        .get("TABLES/001_ORDERS.sql")
        .unwrap()
        .contains("TABLESPACE APP;"));
    assert!(sink.get("PACKAGES/APP_LOADER_HEADER.sql").is_some());
    assert_eq!(
        sink.get("GRANTS/GRANTS.sql"),
        Some("GRANT EXECUTE ON APP_OWNER.APP_LOADER TO APP;\n")
    );
}
