//! History triggers and the history-writer procedure.
//!
//! Triggers either insert straight into `H_<table>` or, in package mode,
//! call `P_H_<table>_WRITE` from the schema's `<ACCOUNT>_HISTORY` package.

use super::format::{file_prefix, spacing, SoftWrap, TAB};
use super::package::{PackageKind, Procedure};
use crate::artifact::{Artifact, Category};
use crate::config::GeneratorConfig;
use crate::model::{Column, Table};

/// DML event captured by a history trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 3] = [ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete];

    pub fn keyword(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "INSERT",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
        }
    }

    fn short(&self) -> &'static str {
        &self.keyword()[..3]
    }

    /// Row image saved for this event
    fn row_ref(&self) -> &'static str {
        match self {
            ChangeKind::Insert | ChangeKind::Update => "NEW",
            ChangeKind::Delete => "OLD",
        }
    }
}

pub fn history_trigger_name(table: &str, kind: ChangeKind) -> String {
    format!("{}_H_{}_TRG", table, kind.short())
}

pub fn history_procedure_name(table: &str) -> String {
    format!("P_H_{}_WRITE", table)
}

fn param_name(column: &str) -> String {
    format!("p_{}_in", column.to_lowercase())
}

fn base_type(column: &Column) -> &str {
    let full = column.data_type.as_str();
    full.split('(').next().unwrap_or(full)
}

/// History-writer procedure for `table`.
///
/// Returns the schema-qualified call name together with the header and body
/// destined for the schema's history package.
pub fn history_procedure(
    table: &Table,
    columns: &[&Column],
    config: &GeneratorConfig,
) -> (String, Procedure) {
    let name = history_procedure_name(&table.name);
    let package = PackageKind::History.package_name(&table.schema);
    let min = config.formatting.table_min_spacing;
    let mut wrap = SoftWrap::new(config.formatting.split_on);

    let mut params = format!(
        "{t}{t}p_change_in{sp}IN{t}{t}VARCHAR2\n",
        t = TAB,
        sp = spacing("p_change_in", min)
    );
    let mut insert_columns = format!("{t}{t}CHANGE", t = TAB);
    let mut values = format!("{t}{t}p_change_in", t = TAB);
    for col in columns {
        let param = param_name(&col.name);
        params.push_str(&format!(
            "{t}{t}, {param}{sp}IN{t}{t}{ty}\n",
            t = TAB,
            param = param,
            sp = spacing(&param, min),
            ty = base_type(col)
        ));
        let newline = if wrap.should_break(values.len()) {
            format!("\n{t}{t}", t = TAB)
        } else {
            String::new()
        };
        insert_columns.push_str(&format!("{}, {}", newline, col.name));
        values.push_str(&format!("{}, {}", newline, param));
    }

    let mut on_error = format!(
        "{t}{t}{t}message_out := 'Error inserting into history table {schema}.H_{table} - Error: ' || sqlerrm;\n",
        t = TAB,
        schema = table.schema,
        table = table.name
    );
    if config.history.use_logging {
        on_error.push_str(&format!(
            "{t}{t}{t}{logger}(message_out, '{package}.{name}');\n",
            t = TAB,
            logger = config.logging.plsql_logger,
            package = package,
            name = name
        ));
    }

    let header = format!(
        "{t}PROCEDURE {name}\n{t}(\n{params}{t});",
        t = TAB,
        name = name,
        params = params
    );
    let body = format!(
        "{t}PROCEDURE {name}\n\
         {t}(\n\
         {params}\
         {t}) IS\n\
         {t}{t}message_out VARCHAR2(4000);\n\
         {t}BEGIN\n\
         {t}INSERT INTO {schema}.H_{table} (\n\
         {columns}\n\
         {t}) VALUES (\n\
         {values}\n\
         {t});\n\
         {t}EXCEPTION\n\
         {t}{t}WHEN OTHERS THEN\n\
         {on_error}\
         {t}{t}{t}raise_application_error (-20000, message_out);\n\
         {t}END {name};\n",
        t = TAB,
        name = name,
        params = params,
        schema = table.schema,
        table = table.name,
        columns = insert_columns,
        values = values,
        on_error = on_error,
    );

    let call = format!("{}.{}.{}", table.schema, package, name);
    (call, Procedure { header, body })
}

/// INSERT, UPDATE and DELETE history triggers for `table`.
///
/// With `procedure` set, triggers call it with named arguments; otherwise
/// they insert directly into the history table.
pub fn history_triggers(
    table: &Table,
    columns: &[&Column],
    procedure: Option<&str>,
    config: &GeneratorConfig,
) -> Vec<Artifact> {
    ChangeKind::ALL
        .iter()
        .map(|kind| {
            let body = match procedure {
                Some(call) => procedure_call(call, columns, *kind, config.formatting.table_min_spacing),
                None => direct_insert(table, columns, *kind, config.formatting.split_on),
            };
            let name = history_trigger_name(&table.name, *kind);
            log::info!("Writing {} to file", name);
            let content = format!(
                "prompt --Adding {name} Trigger for automated history\n\n\
                 CREATE OR REPLACE EDITIONABLE TRIGGER {schema}.{name}\n\
                 BEFORE {event}\n\
                 ON {schema}.{table}\n\
                 REFERENCING NEW AS NEW OLD AS OLD\n\
                 FOR EACH ROW\n\
                 BEGIN\n\
                 {body}\
                 END {name};\n\
                 /\n\
                 show errors trigger {schema}.{name}\n",
                name = name,
                schema = table.schema,
                event = kind.keyword(),
                table = table.name,
                body = body,
            );
            Artifact::new(
                Category::Triggers,
                format!("{}_{}.sql", file_prefix(table.table_number), name),
                content,
            )
        })
        .collect()
}

fn procedure_call(call: &str, columns: &[&Column], kind: ChangeKind, min: usize) -> String {
    let mut args = format!(
        "{t}{t}p_change_in =>{sp}'{event}'\n",
        t = TAB,
        sp = spacing("p_change_in", min),
        event = kind.keyword()
    );
    for col in columns {
        let param = param_name(&col.name);
        args.push_str(&format!(
            "{t}{t}, {param} =>{sp}:{image}.{field}\n",
            t = TAB,
            param = param,
            sp = spacing(&param, min),
            image = kind.row_ref(),
            field = col.name
        ));
    }
    format!("{t}{call}\n{t}(\n{args}{t});\n", t = TAB, call = call, args = args)
}

fn direct_insert(table: &Table, columns: &[&Column], kind: ChangeKind, split_on: usize) -> String {
    let mut wrap = SoftWrap::new(split_on);
    let mut insert_columns = format!("{}CHANGE", TAB);
    let mut values = format!("{}'{}'", TAB, kind.keyword());
    for col in columns {
        let newline = if wrap.should_break(values.len()) {
            format!("\n{}", TAB)
        } else {
            String::new()
        };
        insert_columns.push_str(&format!("{}, {}", newline, col.name));
        values.push_str(&format!("{}, :{}.{}", newline, kind.row_ref(), col.name));
    }
    log::debug!("{}", insert_columns);
    log::debug!("{}", values);
    format!(
        "INSERT INTO {schema}.H_{table}\n(\n{columns}\n)\nVALUES\n(\n{values}\n);\n",
        schema = table.schema,
        table = table.name,
        columns = insert_columns,
        values = values
    )
}
