#![allow(dead_code)]

use schemagen::ingest::SchemaRow;
use schemagen::{Generator, GeneratorConfig, MemorySink};

pub fn row(table: &str, field: &str, data_type: &str, setup: impl FnOnce(&mut SchemaRow)) -> SchemaRow {
    let mut r = SchemaRow::new("APP_OWNER", table, field, data_type);
    setup(&mut r);
    r
}

pub fn pk(r: &mut SchemaRow) {
    r.primary_key = "Y".to_string();
    r.not_null = "Y".to_string();
}

pub fn plain(_: &mut SchemaRow) {}

pub fn generate(rows: &[SchemaRow], config: GeneratorConfig) -> MemorySink {
    let mut sink = MemorySink::new();
    Generator::new(config)
        .generate(rows, &[], &mut sink)
        .expect("generation succeeds");
    sink
}

/// File names written to one category folder, in write order
pub fn files_in(sink: &MemorySink, folder: &str) -> Vec<String> {
    sink.artifacts
        .iter()
        .filter(|a| a.category.dir_name() == folder)
        .map(|a| a.file_name.clone())
        .collect()
}

/// Orders -> customers -> regions, loader requested on the leaf only
pub fn three_level_rows() -> Vec<SchemaRow> {
    vec![
        row("REGIONS", "ID", "NUMBER", pk),
        row("REGIONS", "NAME", "VARCHAR2", |r| r.size = "40".to_string()),
        row("CUSTOMERS", "ID", "NUMBER", |r| {
            pk(r);
            r.loader_parent = "REGIONS".to_string();
        }),
        row("CUSTOMERS", "REGION_ID", "NUMBER", |r| {
            r.fk_to_table = "REGIONS".to_string();
            r.fk_to_field = "ID".to_string();
        }),
        row("CUSTOMERS", "EMAIL", "VARCHAR2", |r| r.size = "120".to_string()),
        row("ORDERS", "ID", "NUMBER", |r| {
            pk(r);
            r.gen_loader = "Y".to_string();
            r.loader_parent = "CUSTOMERS".to_string();
        }),
        row("ORDERS", "CUSTOMER_ID", "NUMBER", |r| {
            r.fk_to_table = "CUSTOMERS".to_string();
            r.fk_to_field = "ID".to_string();
        }),
        row("ORDERS", "STATUS", "VARCHAR2", |r| r.size = "20".to_string()),
    ]
}
