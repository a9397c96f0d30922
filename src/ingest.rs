//! Schema and grant outline ingestion.
//!
//! Both outlines are plain CSV files whose columns are addressed by position.
//! The first row is a header; blank separator rows and repeated header rows
//! (first cell empty or `Schema`) are skipped. A row that is shorter than the
//! fixed layout aborts the batch with [`SchemaError::RowShape`].

use crate::error::{Result, SchemaError};
use csv::{ReaderBuilder, StringRecord};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Header row for the schema outline, in file order
pub const SCHEMA_HEADERS: [&str; 28] = [
    "Schema",
    "Table",
    "Field",
    "Type",
    "Size",
    "Units",
    "Not Null",
    "Primary Key",
    "Default",
    "Index",
    "Sequence Start",
    "Pop by Trigger",
    "Invisible",
    "Virtual",
    "Virtual Expression",
    "Check Constraint",
    "LOB Deduplication",
    "LOB Compression (LOW, MEDIUM, HIGH)",
    "LOB Caching",
    "LOB Logging",
    "FK to Table",
    "FK to Field",
    "Gen Audit Columns",
    "Gen History Table (Automated)",
    "Gen Loader",
    "Loader Parent",
    "Table Comment",
    "Column Comment",
];

/// Header row for the grants outline, in file order
pub const GRANT_HEADERS: [&str; 6] = ["Schema", "Table", "User", "Insert", "Update", "Delete"];

/// One schema outline row: a single column of a single table.
///
/// Fields hold the raw cell text; interpretation happens in
/// [`Column::from_row`](crate::model::Column::from_row) and
/// [`Table::from_row`](crate::model::Table::from_row).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRow {
    pub schema: String,
    pub table: String,
    pub field: String,
    pub data_type: String,
    pub size: String,
    pub units: String,
    pub not_null: String,
    pub primary_key: String,
    pub default: String,
    pub index: String,
    pub sequence_start: String,
    pub pop_by_trigger: String,
    pub invisible: String,
    pub is_virtual: String,
    pub virtual_expr: String,
    pub check_constraint: String,
    pub lob_deduplication: String,
    pub lob_compression: String,
    pub lob_caching: String,
    pub lob_logging: String,
    pub fk_to_table: String,
    pub fk_to_field: String,
    pub gen_audit_columns: String,
    pub gen_history_tables: String,
    pub gen_loader: String,
    pub loader_parent: String,
    pub table_comment: String,
    pub column_comment: String,
}

impl SchemaRow {
    /// Build a row from positional cells. `line` is only used for error reporting.
    pub fn from_fields<S: AsRef<str>>(fields: &[S], line: usize) -> Result<Self> {
        if fields.len() < SCHEMA_HEADERS.len() {
            return Err(SchemaError::RowShape {
                line,
                expected: SCHEMA_HEADERS.len(),
                found: fields.len(),
            });
        }
        let cell = |i: usize| fields[i].as_ref().to_string();
        Ok(Self {
            schema: cell(0),
            table: cell(1),
            field: cell(2),
            data_type: cell(3),
            size: cell(4),
            units: cell(5),
            not_null: cell(6),
            primary_key: cell(7),
            default: cell(8),
            index: cell(9),
            sequence_start: cell(10),
            pop_by_trigger: cell(11),
            invisible: cell(12),
            is_virtual: cell(13),
            virtual_expr: cell(14),
            check_constraint: cell(15),
            lob_deduplication: cell(16),
            lob_compression: cell(17),
            lob_caching: cell(18),
            lob_logging: cell(19),
            fk_to_table: cell(20),
            fk_to_field: cell(21),
            gen_audit_columns: cell(22),
            gen_history_tables: cell(23),
            gen_loader: cell(24),
            loader_parent: cell(25),
            table_comment: cell(26),
            column_comment: cell(27),
        })
    }

    /// Convenience constructor for synthesized rows and tests.
    pub fn new(schema: &str, table: &str, field: &str, data_type: &str) -> Self {
        Self {
            schema: schema.to_string(),
            table: table.to_string(),
            field: field.to_string(),
            data_type: data_type.to_string(),
            ..Default::default()
        }
    }
}

/// Privileges requested for one user on one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrantLevel {
    pub insert: bool,
    pub update: bool,
    pub delete: bool,
}

impl GrantLevel {
    /// SELECT is always granted; the flags add to it.
    pub fn privileges(&self) -> String {
        let mut out = String::from("SELECT");
        if self.insert {
            out.push_str(", INSERT");
        }
        if self.update {
            out.push_str(", UPDATE");
        }
        if self.delete {
            out.push_str(", DELETE");
        }
        out
    }
}

/// One grants outline row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRow {
    pub schema: String,
    pub table: String,
    pub user: String,
    pub level: GrantLevel,
}

impl GrantRow {
    pub fn from_fields<S: AsRef<str>>(fields: &[S], line: usize) -> Result<Self> {
        if fields.len() < GRANT_HEADERS.len() {
            return Err(SchemaError::RowShape {
                line,
                expected: GRANT_HEADERS.len(),
                found: fields.len(),
            });
        }
        let marked = |i: usize| fields[i].as_ref().trim().eq_ignore_ascii_case("X");
        Ok(Self {
            schema: fields[0].as_ref().to_string(),
            table: fields[1].as_ref().to_string(),
            user: fields[2].as_ref().to_string(),
            level: GrantLevel {
                insert: marked(3),
                update: marked(4),
                delete: marked(5),
            },
        })
    }
}

/// `Y` (any case, surrounding blanks ignored) is the only truthy flag value.
pub fn flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("Y")
}

/// Read schema rows from any reader.
pub fn read_schema_rows<R: Read>(reader: R) -> Result<Vec<SchemaRow>> {
    collect_rows(reader, |f: &[&str], l| SchemaRow::from_fields(f, l))
}

/// Read grant rows from any reader.
pub fn read_grant_rows<R: Read>(reader: R) -> Result<Vec<GrantRow>> {
    collect_rows(reader, |f: &[&str], l| GrantRow::from_fields(f, l))
}

/// Read the schema outline, writing a header-only template when the file is missing.
pub fn load_schema_file(path: &Path) -> Result<Vec<SchemaRow>> {
    if ensure_template(path, &SCHEMA_HEADERS)? {
        return Ok(Vec::new());
    }
    log::info!("Reading schema outline {}", path.display());
    read_schema_rows(fs::File::open(path)?)
}

/// Read the grants outline, writing a header-only template when the file is missing.
pub fn load_grants_file(path: &Path) -> Result<Vec<GrantRow>> {
    if ensure_template(path, &GRANT_HEADERS)? {
        return Ok(Vec::new());
    }
    log::info!("Reading grants outline {}", path.display());
    read_grant_rows(fs::File::open(path)?)
}

/// Returns `true` when the file was missing and a template was written instead.
fn ensure_template(path: &Path, headers: &[&str]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    log::warn!(
        "{} not found; writing an empty template with headers",
        path.display()
    );
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(headers)?;
    writer.flush()?;
    Ok(true)
}

fn collect_rows<R, T, F>(reader: R, convert: F) -> Result<Vec<T>>
where
    R: Read,
    F: Fn(&[&str], usize) -> Result<T>,
{
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    let mut line = 0usize;
    while csv_reader.read_record(&mut record)? {
        line += 1;
        // header row
        if line == 1 {
            continue;
        }
        let first = record.get(0).unwrap_or("");
        if first.is_empty() || first == "Schema" {
            continue;
        }
        let fields: Vec<&str> = record.iter().collect();
        rows.push(convert(&fields, line)?);
    }
    log::debug!("Loaded {} outline row(s)", rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn schema_line(cells: &[(usize, &str)]) -> String {
        let mut row = vec![""; SCHEMA_HEADERS.len()];
        for (i, v) in cells {
            row[*i] = v;
        }
        row.join(",")
    }

    #[test]
    fn test_reads_rows_and_skips_headers_and_blanks() {
        let text = format!(
            "{}\n{}\n{}\n{}\n",
            SCHEMA_HEADERS.join(","),
            schema_line(&[(0, "APP_OWNER"), (1, "ORDERS"), (2, "ID"), (3, "NUMBER")]),
            schema_line(&[]),
            schema_line(&[(0, "APP_OWNER"), (1, "ORDERS"), (2, "NAME"), (3, "VARCHAR2")]),
        );
        let rows = read_schema_rows(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].field, "ID");
        assert_eq!(rows[1].data_type, "VARCHAR2");
    }

    #[test]
    fn test_short_row_is_a_shape_error() {
        let text = format!("{}\nAPP_OWNER,ORDERS,ID,NUMBER\n", SCHEMA_HEADERS.join(","));
        let err = read_schema_rows(text.as_bytes()).unwrap_err();
        match err {
            SchemaError::RowShape {
                line,
                expected,
                found,
            } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 28);
                assert_eq!(found, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_grant_rows_mark_privileges() {
        let text = "Schema,Table,User,Insert,Update,Delete\nAPP_OWNER,ORDERS,APP,x,,X\n";
        let rows = read_grant_rows(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].level.privileges(), "SELECT, INSERT, DELETE");
    }

    #[test]
    fn test_missing_file_writes_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Grants.csv");
        let rows = load_grants_file(&path).unwrap();
        assert!(rows.is_empty());
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim_end(), GRANT_HEADERS.join(","));
    }

    #[test]
    fn test_flag_is_case_insensitive() {
        assert!(flag("y"));
        assert!(flag(" Y "));
        assert!(!flag("N"));
        assert!(!flag(""));
        assert!(!flag("yes"));
    }
}
