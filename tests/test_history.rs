//! History table derivation and the scripts rendered for it

mod common;

use common::{files_in, generate, pk, row};
use schemagen::config::LobDefaults;
use schemagen::model::{ColumnOrigin, IndexKind, SequencePolicy};
use schemagen::{GeneratorConfig, TableKey, TableRegistry};

fn constrained_rows() -> Vec<schemagen::ingest::SchemaRow> {
    vec![
        row("ORDERS", "ID", "NUMBER", |r| {
            pk(r);
            r.sequence_start = "100".to_string();
            r.pop_by_trigger = "Y".to_string();
            r.gen_history_tables = "Y".to_string();
        }),
        row("ORDERS", "CUSTOMER_ID", "NUMBER", |r| {
            r.not_null = "Y".to_string();
            r.index = "Y".to_string();
            r.fk_to_table = "CUSTOMERS".to_string();
            r.fk_to_field = "ID".to_string();
        }),
        row("ORDERS", "STATUS", "VARCHAR2", |r| {
            r.size = "20".to_string();
            r.default = "NEW".to_string();
            r.index = "U1".to_string();
            r.check_constraint = "IN ('NEW', 'DONE')".to_string();
            r.column_comment = "Order state".to_string();
        }),
        row("ORDERS", "REGION", "VARCHAR2", |r| r.index = "U1".to_string()),
    ]
}

#[test]
fn test_history_columns_are_relaxed() {
    let mut registry = TableRegistry::from_rows(&constrained_rows(), &LobDefaults::default());
    registry.materialize();

    let history = registry
        .get(&TableKey::new("APP_OWNER", "H_ORDERS"))
        .expect("history table derived");
    assert!(history.is_history);
    assert_eq!(history.table_number, 1);
    assert!(history.primary_key_fields().iter().all(|f| f == "HIST_ID"));
    assert!(!history.has_compound_index());

    let declared: Vec<_> = history
        .columns()
        .iter()
        .filter(|c| c.origin == ColumnOrigin::Declared)
        .collect();
    assert_eq!(declared.len(), 4);
    for col in declared {
        assert!(!col.not_null, "{} kept NOT NULL", col.name);
        assert!(!col.primary_key, "{} kept its primary key", col.name);
        assert!(col.default.is_none(), "{} kept its default", col.name);
        assert_eq!(col.index, IndexKind::None);
        assert!(col.cluster_tags.is_empty());
        assert_eq!(col.sequence, SequencePolicy::None);
        assert!(!col.triggered);
        assert!(col.foreign_key.is_none());
        assert!(col.check.is_none());
    }
    let status = history.column("STATUS").unwrap();
    assert_eq!(status.type_string(), "VARCHAR2(20)");
    assert_eq!(status.comment.as_deref(), Some("Order state"));
}

#[test]
fn test_history_table_renders_only_its_tracking_key() {
    let sink = generate(&constrained_rows(), GeneratorConfig::default());

    let tables = files_in(&sink, "TABLES");
    assert_eq!(tables, vec!["001_ORDERS.sql", "001_H_ORDERS.sql"]);
    let history_indexes: Vec<String> = files_in(&sink, "INDEXES")
        .into_iter()
        .filter(|f| f.contains("H_ORDERS"))
        .collect();
    assert_eq!(history_indexes, vec!["001_H_ORDERS_PK.sql"]);
    assert!(!files_in(&sink, "REF_CONSTRAINTS")
        .iter()
        .any(|f| f.contains("H_ORDERS")));
    assert!(!files_in(&sink, "CONSTRAINTS")
        .iter()
        .any(|f| f.contains("H_ORDERS_") && f.contains("_4_")));

    let script = sink.get("TABLES/001_H_ORDERS.sql").unwrap();
    assert!(script.contains("CREATE TABLE APP_OWNER.H_ORDERS"));
    assert!(!script.contains("DEFAULT 'NEW'"));
    let comments = sink.get("COMMENTS/COMMENTS.sql").unwrap();
    assert!(comments.contains("COMMENT ON TABLE APP_OWNER.H_ORDERS IS 'History table for ORDERS';"));
}

#[test]
fn test_direct_history_triggers_without_package() {
    let sink = generate(&constrained_rows(), GeneratorConfig::default());

    let triggers = files_in(&sink, "TRIGGERS");
    assert!(triggers.contains(&"001_ORDERS_H_INS_TRG.sql".to_string()));
    assert!(triggers.contains(&"001_ORDERS_H_UPD_TRG.sql".to_string()));
    assert!(triggers.contains(&"001_ORDERS_H_DEL_TRG.sql".to_string()));
    assert!(sink.get("PACKAGES/APP_HISTORY_HEADER.sql").is_none());

    let insert = sink.get("TRIGGERS/001_ORDERS_H_INS_TRG.sql").unwrap();
    assert!(insert.contains("INSERT INTO APP_OWNER.H_ORDERS"));
}

#[test]
fn test_history_package_mode() {
    let mut config = GeneratorConfig::default();
    config.history.use_procedures = true;
    let sink = generate(&constrained_rows(), config);

    let header = sink.get("PACKAGES/APP_HISTORY_HEADER.sql").unwrap();
    assert!(header.contains("P_H_ORDERS_WRITE"));
    let body = sink.get("PACKAGE_BODIES/APP_HISTORY_BODY.sql").unwrap();
    assert!(body.contains("INSERT INTO APP_OWNER.H_ORDERS"));
    let trigger = sink.get("TRIGGERS/001_ORDERS_H_UPD_TRG.sql").unwrap();
    assert!(trigger.contains("APP_HISTORY.P_H_ORDERS_WRITE"));
}
