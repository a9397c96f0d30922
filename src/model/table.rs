//! Tables, compound index clusters, and the history/audit derivations.

use super::column::{ClusterTag, Column, ColumnOrigin, IndexKind};
use crate::ingest::{flag, SchemaRow};
use std::fmt;

/// Schema-qualified table identity, used for registry lookups and parent links
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableKey {
    pub schema: String,
    pub name: String,
}

impl TableKey {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Parse `TABLE` (relative to `default_schema`) or `SCHEMA.TABLE`.
    pub fn parse_relative(value: &str, default_schema: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match value.split_once('.') {
            Some((schema, name)) if !schema.is_empty() && !name.is_empty() => {
                Some(Self::new(schema.trim(), name.trim()))
            }
            Some(_) => None,
            None => Some(Self::new(default_schema, value)),
        }
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Account / tablespace name for a schema: uppercased, `_OWNER` suffix removed.
pub fn account_name(schema: &str) -> String {
    let upper = schema.trim().to_uppercase();
    match upper.strip_suffix("_OWNER") {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => upper,
    }
}

/// Compound index: member field names in first-insertion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundIndex {
    pub tag: ClusterTag,
    pub members: Vec<String>,
}

impl CompoundIndex {
    pub fn is_unique(&self) -> bool {
        self.tag.unique
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub schema: String,
    pub name: String,
    pub comment: Option<String>,
    pub table_number: u32,
    pub tablespace: String,
    pub needs_audit: bool,
    pub needs_history: bool,
    pub needs_loader: bool,
    pub is_history: bool,
    /// Source table name when this is a history table
    pub source_table: Option<String>,
    /// Raw `Loader Parent` cell, resolved by the registry
    pub loader_parent_ref: Option<String>,
    /// Resolved loader parent (a lookup key, never an owning link)
    pub parent: Option<TableKey>,
    columns: Vec<Column>,
    primary_keys: Vec<String>,
    compound: Vec<CompoundIndex>,
}

impl Table {
    pub fn new(schema: &str, name: &str, table_number: u32) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            comment: None,
            table_number,
            tablespace: account_name(schema),
            needs_audit: false,
            needs_history: false,
            needs_loader: false,
            is_history: false,
            source_table: None,
            loader_parent_ref: None,
            parent: None,
            columns: Vec::new(),
            primary_keys: Vec::new(),
            compound: Vec::new(),
        }
    }

    /// Create a table from the first row that mentions it. Columns are added separately.
    pub fn from_row(row: &SchemaRow, table_number: u32) -> Self {
        let mut table = Self::new(row.schema.trim(), row.table.trim(), table_number);
        let comment = row.table_comment.trim().trim_matches('\'');
        if !comment.is_empty() {
            table.comment = Some(comment.to_string());
        }
        table.needs_audit = flag(&row.gen_audit_columns);
        table.needs_history = flag(&row.gen_history_tables);
        table.needs_loader = flag(&row.gen_loader);
        let parent = row.loader_parent.trim();
        if !parent.is_empty() {
            table.loader_parent_ref = Some(parent.to_string());
        }
        table
    }

    pub fn key(&self) -> TableKey {
        TableKey::new(self.schema.clone(), self.name.clone())
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Columns that came from the outline, in insertion order
    pub fn declared_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_declared())
    }

    /// Append a column, registering primary-key and cluster membership.
    ///
    /// Duplicate names are stored as given.
    pub fn add_column(&mut self, col: Column) {
        if col.primary_key {
            self.primary_keys.push(col.name.clone());
        }
        for tag in &col.cluster_tags {
            match self.compound.iter_mut().find(|c| c.tag == *tag) {
                Some(cluster) => cluster.members.push(col.name.clone()),
                None => self.compound.push(CompoundIndex {
                    tag: *tag,
                    members: vec![col.name.clone()],
                }),
            }
        }
        self.columns.push(col);
    }

    /// Discard clusters with fewer than two members.
    ///
    /// A discarded cluster's lone member is indexed on its own with the
    /// cluster's uniqueness unless it already asked for a single-column index.
    pub fn clean_compound_index(&mut self) {
        let (keep, discard): (Vec<_>, Vec<_>) = std::mem::take(&mut self.compound)
            .into_iter()
            .partition(|c| c.members.len() >= 2);
        self.compound = keep;

        for cluster in discard {
            log::warn!(
                "Group index key {} on {} does not have enough fields for a compound index; \
                 processing as a standard index",
                cluster.tag,
                self.name
            );
            for member in &cluster.members {
                if let Some(col) = self.columns.iter_mut().find(|c| &c.name == member) {
                    if col.index == IndexKind::None {
                        col.index = cluster.tag.index_kind();
                    }
                }
            }
        }
    }

    pub fn has_compound_primary_key(&self) -> bool {
        self.primary_keys.len() > 1
    }

    pub fn has_compound_index(&self) -> bool {
        !self.compound.is_empty()
    }

    pub fn compound_indexes(&self) -> &[CompoundIndex] {
        &self.compound
    }

    pub fn primary_key_fields(&self) -> &[String] {
        &self.primary_keys
    }

    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.primary_keys
            .iter()
            .filter_map(|name| self.columns.iter().find(|c| &c.name == name))
            .collect()
    }

    pub fn is_field_in_compound_index(&self, field: &str) -> bool {
        self.compound
            .iter()
            .any(|c| c.members.iter().any(|m| m == field))
    }

    /// Derive `H_<name>`, or `None` when history was not requested.
    ///
    /// The history table keeps this table's number unless one is given.
    pub fn gen_history_table(&self, table_number: Option<u32>) -> Option<Table> {
        if !self.needs_history || self.is_history {
            return None;
        }
        let mut hist = Table::new(
            &self.schema,
            &format!("H_{}", self.name),
            table_number.unwrap_or(self.table_number),
        );
        hist.comment = Some(format!("History table for {}", self.name));
        hist.is_history = true;
        hist.source_table = Some(self.name.clone());

        for col in history_tracking_columns(&self.schema, &hist.name) {
            hist.add_column(col);
        }
        for col in self.declared_columns() {
            hist.add_column(col.relaxed_for_history());
        }
        Some(hist)
    }

    /// Append U_NAME and U_DATE once when audit columns were requested.
    ///
    /// Returns `true` when the columns were added by this call.
    pub fn gen_audit_columns(&mut self) -> bool {
        if !self.needs_audit || self.columns.iter().any(|c| c.origin == ColumnOrigin::Audit) {
            return false;
        }
        for col in audit_columns(&self.schema, &self.name) {
            self.add_column(col);
        }
        true
    }

    /// Render order: insertion order, or NOT NULL columns first (stable) when sorting.
    pub fn ordered_columns(&self, sort_nullable: bool) -> Vec<&Column> {
        if !sort_nullable {
            return self.columns.iter().collect();
        }
        let (mut required, nullable): (Vec<&Column>, Vec<&Column>) =
            self.columns.iter().partition(|c| c.not_null);
        required.extend(nullable);
        required
    }
}

fn synthesized(
    schema: &str,
    table: &str,
    field: &str,
    data_type: &str,
    fill: impl FnOnce(&mut SchemaRow),
) -> SchemaRow {
    let mut row = SchemaRow::new(schema, table, field, data_type);
    fill(&mut row);
    row
}

fn audit_columns(schema: &str, table: &str) -> [Column; 2] {
    let u_name = synthesized(schema, table, "U_NAME", "VARCHAR2", |r| {
        r.size = "250".to_string();
        r.units = "CHAR".to_string();
        r.not_null = "Y".to_string();
        r.default = "USER".to_string();
        r.column_comment = "User Name for audit logging purposes".to_string();
    });
    let u_date = synthesized(schema, table, "U_DATE", "DATE", |r| {
        r.not_null = "Y".to_string();
        r.default = "SYSDATE".to_string();
        r.column_comment = "Date / Time for audit logging purposes".to_string();
    });
    [
        Column::synthetic(&u_name, ColumnOrigin::Audit),
        Column::synthetic(&u_date, ColumnOrigin::Audit),
    ]
}

fn history_tracking_columns(schema: &str, table: &str) -> [Column; 4] {
    let hist_id = synthesized(schema, table, "HIST_ID", "NUMBER", |r| {
        r.not_null = "Y".to_string();
        r.primary_key = "Y".to_string();
        r.sequence_start = "1".to_string();
        r.pop_by_trigger = "Y".to_string();
        r.column_comment = "Unique ID for History record".to_string();
    });
    let change = synthesized(schema, table, "CHANGE", "VARCHAR2", |r| {
        r.size = "10".to_string();
        r.units = "CHAR".to_string();
        r.not_null = "Y".to_string();
        r.column_comment = "Type of change performed".to_string();
    });
    let change_date = synthesized(schema, table, "CHANGE_DATE", "DATE", |r| {
        r.not_null = "Y".to_string();
        r.default = "SYSDATE".to_string();
        r.column_comment = "Time of change performed".to_string();
    });
    let change_user = synthesized(schema, table, "CHANGE_USER", "VARCHAR2", |r| {
        r.size = "50".to_string();
        r.units = "CHAR".to_string();
        r.not_null = "Y".to_string();
        r.default = "USER".to_string();
        r.column_comment = "DB USER that performed change".to_string();
    });
    [
        Column::synthetic(&hist_id, ColumnOrigin::HistoryTracking),
        Column::synthetic(&change, ColumnOrigin::HistoryTracking),
        Column::synthetic(&change_date, ColumnOrigin::HistoryTracking),
        Column::synthetic(&change_user, ColumnOrigin::HistoryTracking),
    ]
}
