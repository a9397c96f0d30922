//! Table, index, constraint, sequence and trigger scripts.
//!
//! Every function here is pure: it takes model facts plus already-resolved
//! names and counters and returns finished [`Artifact`]s.

use super::format::{escape_literal, file_prefix, spacing, suffix, TAB};
use crate::artifact::{Artifact, Category};
use crate::model::{Column, LobOptions, SequencePolicy, Table};

/// Key class of an index and its backing constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Primary,
    Unique,
    Plain,
}

impl KeyKind {
    pub fn code(&self) -> &'static str {
        match self {
            KeyKind::Primary => "PK",
            KeyKind::Unique => "UI",
            KeyKind::Plain => "NI",
        }
    }

    fn create_clause(&self) -> &'static str {
        match self {
            KeyKind::Primary | KeyKind::Unique => "CREATE UNIQUE INDEX",
            KeyKind::Plain => "CREATE INDEX",
        }
    }
}

/// `{T}_{PK|UI|NI}{n}` or, for compound indexes, `{T}_COMPOUND_{PK|UI|NI}{n}`.
pub fn index_name(table: &str, kind: KeyKind, counter: u32, compound: bool) -> String {
    let infix = if compound { "_COMPOUND" } else { "" };
    format!("{}{}_{}{}", table, infix, kind.code(), suffix(counter))
}

pub fn fk_name(table: &str, field: &str, counter: u32) -> String {
    format!("{}_{}_FK{}", table, field, suffix(counter))
}

pub fn check_name(table: &str, field: &str, counter: u32) -> String {
    format!("{}_{}_CK{}", table, field, suffix(counter))
}

pub fn sequence_name(table: &str, field: &str) -> String {
    format!("{}_{}_SEQ", table, field)
}

pub fn sequence_trigger_name(table: &str, field: &str) -> String {
    format!("{}_{}_TRG", table, field)
}

pub fn audit_trigger_name(table: &str) -> String {
    format!("{}_BIU", table)
}

/// `CREATE TABLE` script with aligned column definitions and LOB storage blocks.
pub fn table_script(table: &Table, columns: &[&Column], min_spacing: usize) -> Artifact {
    log::info!("Prepping {} script", table.name);

    let mut lobs = String::new();
    let mut lines: Vec<String> = Vec::with_capacity(columns.len());
    for col in columns {
        if let Some(lob) = &col.lob {
            lobs.push_str(&lob_subscript(&col.name, &table.tablespace, lob));
            lobs.push('\n');
        }
        let type_string = col.type_string();
        let options = col.options_string();
        let mut line = format!(
            "{}{}{}{}",
            TAB,
            col.name,
            spacing(&col.name, min_spacing),
            type_string
        );
        if !options.is_empty() {
            line.push_str(&spacing(&type_string, min_spacing));
            line.push_str(&options);
        }
        lines.push(line);
    }
    let columns_formatted = lines.join(",\n");
    log::debug!("{}", columns_formatted);

    let content = format!(
        "prompt --Adding {schema}.{table} table\n\n\
         CREATE TABLE {schema}.{table}\n\
         (\n\
         {columns}\n\
         )\n\
         {lobs}\
         TABLESPACE {tablespace};\n\
         /\n",
        schema = table.schema,
        table = table.name,
        columns = columns_formatted,
        lobs = lobs,
        tablespace = table.tablespace,
    );
    Artifact::new(
        Category::Tables,
        format!("{}_{}.sql", file_prefix(table.table_number), table.name),
        content,
    )
}

/// `LOB (...) STORE AS SECUREFILE` block for one CLOB/BLOB column.
pub fn lob_subscript(column: &str, tablespace: &str, options: &LobOptions) -> String {
    let dedup = if options.deduplicate {
        "DEDUPLICATE"
    } else {
        "KEEP_DUPLICATES"
    };
    let compress = match options.compression.level() {
        Some(level) => format!("COMPRESS{}{}", TAB, level),
        None => "NOCOMPRESS".to_string(),
    };
    let cache = if options.cache { "CACHE" } else { "NOCACHE" };
    let logging = if options.logging { "LOGGING" } else { "NOLOGGING" };

    format!(
        "LOB ({column}) STORE AS SECUREFILE (\n\
         {t}TABLESPACE {tablespace}\n\
         {t}ENABLE{t}STORAGE IN ROW\n\
         {t}CHUNK{t}8192\n\
         {t}RETENTION\n\
         {t}{dedup}\n\
         {t}{compress}\n\
         {t}{cache}\n\
         {t}{logging}\n\
         )",
        t = TAB,
    )
}

/// Index script plus its PRIMARY KEY or UNIQUE constraint, if any.
///
/// `fields` keeps the member order of a compound index.
pub fn index_artifacts(
    table: &Table,
    fields: &[String],
    kind: KeyKind,
    counter: u32,
    compound: bool,
) -> Vec<Artifact> {
    let name = index_name(&table.name, kind, counter, compound);
    let field_list = fields.join(", ");
    log::info!("Prepping {} index script", name);

    let index = format!(
        "prompt --Adding {schema}.{name} index for {fields}\n\n\
         {create} {schema}.{name} ON {schema}.{table}\n\
         ({fields})\n\
         TABLESPACE {tablespace};\n\
         /\n\n",
        schema = table.schema,
        name = name,
        fields = field_list,
        create = kind.create_clause(),
        table = table.name,
        tablespace = table.tablespace,
    );
    let prefix = file_prefix(table.table_number);
    let mut out = vec![Artifact::new(
        Category::Indexes,
        format!("{}_{}.sql", prefix, name),
        index,
    )];

    match kind {
        KeyKind::Primary => {
            let constraint = format!(
                "prompt --Adding {schema}.{name} constraint for {fields}\n\n\
                 ALTER TABLE {schema}.{table} ADD (\n\
                 {t}CONSTRAINT {name}\n\
                 {t}PRIMARY KEY\n\
                 {t}({fields})\n\
                 {t}USING INDEX {schema}.{name}\n\
                 );\n\
                 /\n\n",
                schema = table.schema,
                name = name,
                fields = field_list,
                table = table.name,
                t = TAB,
            );
            out.push(Artifact::new(
                Category::Constraints,
                format!("{}_1_{}.sql", prefix, name),
                constraint,
            ));
        }
        KeyKind::Unique => {
            let constraint = format!(
                "prompt --Adding {name} unique constraint\n\n\
                 ALTER TABLE {schema}.{table} ADD (\n\
                 {t}CONSTRAINT {name}\n\
                 {t}UNIQUE\n\
                 {t}({fields})\n\
                 );\n\
                 /\n\n",
                schema = table.schema,
                name = name,
                fields = field_list,
                table = table.name,
                t = TAB,
            );
            out.push(Artifact::new(
                Category::Constraints,
                format!("{}_2_{}.sql", prefix, name),
                constraint,
            ));
        }
        KeyKind::Plain => {}
    }
    out
}

/// Foreign key from `column` to its target, as a REF_CONSTRAINTS script.
///
/// The target table is taken to live in the same schema unless it is qualified.
pub fn fk_constraint(table: &Table, column: &Column, counter: u32) -> Option<Artifact> {
    let fk = column.foreign_key.as_ref()?;
    let name = fk_name(&table.name, &column.name, counter);
    let target = if fk.table.contains('.') {
        fk.table.clone()
    } else {
        format!("{}.{}", table.schema, fk.table)
    };
    log::info!("Prepping {} FK constraint script", name);

    let content = format!(
        "prompt --Adding {schema}.{name} constraint for {source_field}\n\n\
         ALTER TABLE {schema}.{table} ADD (\n\
         {t}CONSTRAINT {name}\n\
         {t}FOREIGN KEY ({field})\n\
         {t}REFERENCES {target} ({source_field})\n\
         );\n\
         /\n\n",
        schema = table.schema,
        name = name,
        source_field = fk.field,
        table = table.name,
        field = column.name,
        target = target,
        t = TAB,
    );
    Some(Artifact::new(
        Category::RefConstraints,
        format!("{}_3_{}.sql", file_prefix(table.table_number), name),
        content,
    ))
}

/// Simple column check constraint, e.g. `CHECK (STATUS IN ('A','B'))`.
pub fn check_constraint(table: &Table, column: &Column, counter: u32) -> Option<Artifact> {
    let condition = column.check.as_ref()?;
    let name = check_name(&table.name, &column.name, counter);
    log::info!("Prepping {} check constraint script", name);

    let content = format!(
        "prompt --Adding {schema}.{name} check constraint for {field}\n\n\
         ALTER TABLE {schema}.{table} ADD (\n\
         {t}CONSTRAINT {name}\n\
         {t}CHECK ({field} {condition})\n\
         );\n\
         /\n\n",
        schema = table.schema,
        name = name,
        field = column.name,
        table = table.name,
        condition = condition,
        t = TAB,
    );
    Some(Artifact::new(
        Category::Constraints,
        format!("{}_4_{}.sql", file_prefix(table.table_number), name),
        content,
    ))
}

/// Sequence script and, when requested, the trigger that fills the column from it.
///
/// A reused sequence gets no `CREATE SEQUENCE`; only its trigger is rendered.
pub fn sequence_artifacts(table: &Table, column: &Column) -> Vec<Artifact> {
    let mut out = Vec::new();
    let sequence = match &column.sequence {
        SequencePolicy::None => return out,
        SequencePolicy::Start(start) => {
            let name = sequence_name(&table.name, &column.name);
            log::info!("Prepping {} sequence script", name);
            let content = format!(
                "prompt --Adding {schema}.{name} Sequence for {field}\n\n\
                 CREATE SEQUENCE {schema}.{name}\n\
                 {t}START WITH {start}\n\
                 {t}MINVALUE 1\n\
                 {t}NOMAXVALUE\n\
                 {t}CACHE 20\n\
                 {t}NOORDER\n\
                 ;\n\
                 /\n\n",
                schema = table.schema,
                name = name,
                field = column.name,
                start = start,
                t = TAB,
            );
            out.push(Artifact::new(
                Category::Sequences,
                format!("{}_{}.sql", file_prefix(table.table_number), name),
                content,
            ));
            format!("{}.{}", table.schema, name)
        }
        SequencePolicy::Reuse(existing) => {
            log::debug!(
                "{}.{} reuses sequence {}",
                table.name,
                column.name,
                existing
            );
            if existing.contains('.') {
                existing.clone()
            } else {
                format!("{}.{}", table.schema, existing)
            }
        }
    };

    if column.triggered {
        out.push(sequence_trigger(table, &column.name, &sequence));
    }
    out
}

fn sequence_trigger(table: &Table, field: &str, sequence: &str) -> Artifact {
    let name = sequence_trigger_name(&table.name, field);
    log::info!("Prepping {} trigger script", name);
    let content = format!(
        "prompt --Adding {schema}.{name} Trigger for {field}\n\n\
         CREATE OR REPLACE TRIGGER {schema}.{name}\n\
         {t}BEFORE INSERT\n\
         {t}ON {schema}.{table} REFERENCING NEW AS NEW OLD AS OLD\n\
         {t}FOR EACH ROW\n\
         {t}WHEN (new.{field} IS NULL)\n\
         {t}BEGIN\n\
         {t}:new.{field} := {sequence}.nextval;\n\
         {t}END {name};\n\
         /\n\n\
         show errors trigger {schema}.{name}\n",
        schema = table.schema,
        name = name,
        field = field,
        table = table.name,
        sequence = sequence,
        t = TAB,
    );
    Artifact::new(
        Category::Triggers,
        format!("{}_{}.sql", file_prefix(table.table_number), name),
        content,
    )
}

/// BEFORE INSERT OR UPDATE trigger stamping U_DATE and U_NAME.
pub fn audit_trigger(table: &Table) -> Artifact {
    let name = audit_trigger_name(&table.name);
    log::info!("Prepping {} trigger script", name);
    let content = format!(
        "prompt --Adding {schema}.{name} Trigger for audit\n\n\
         CREATE OR REPLACE TRIGGER {schema}.{name}\n\
         {t}BEFORE INSERT OR UPDATE\n\
         {t}ON {schema}.{table} REFERENCING NEW AS NEW OLD AS OLD\n\
         {t}FOR EACH ROW\n\
         {t}BEGIN\n\
         {t}:new.U_DATE := SYSDATE;\n\
         {t}:new.U_NAME := USER;\n\
         {t}END {name};\n\
         /\n\n\
         show errors trigger {schema}.{name}\n",
        schema = table.schema,
        name = name,
        table = table.name,
        t = TAB,
    );
    Artifact::new(
        Category::Triggers,
        format!("{}_{}.sql", file_prefix(table.table_number), name),
        content,
    )
}

/// Pending `COMMENT ON TABLE` line; table comments start on a new line.
pub fn table_comment(table: &Table, comment: &str) -> String {
    format!(
        "\nCOMMENT ON TABLE {}.{} IS '{}';\n",
        table.schema,
        table.name,
        escape_literal(comment)
    )
}

pub fn column_comment(table: &Table, field: &str, comment: &str) -> String {
    format!(
        "COMMENT ON COLUMN {}.{}.{} IS '{}';\n",
        table.schema,
        table.name,
        field,
        escape_literal(comment)
    )
}
