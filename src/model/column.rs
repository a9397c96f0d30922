//! Column definitions and the fragments rendered from them.

use crate::config::LobDefaults;
use crate::ingest::{flag, SchemaRow};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Largest size accepted for character columns
pub const MAX_CHAR_SIZE: u32 = 4000;

/// Default expressions that are never wrapped in quotes
const DEFAULT_KEYWORDS: [&str; 6] = [
    "SYSDATE",
    "SYSTIMESTAMP",
    "USER",
    "CURRENT_DATE",
    "CURRENT_TIMESTAMP",
    "LOCALTIMESTAMP",
];

static NUMBER_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s*(?:,\s*(\d+)\s*)?$").expect("NUMBER size pattern is valid")
});

static CLUSTER_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([YU])(\d+)$").expect("cluster tag pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Char,
    Varchar,
    Varchar2,
    NChar,
    NVarchar2,
    Number,
    Date,
    Timestamp,
    Clob,
    Blob,
    Other(String),
}

impl ColumnType {
    pub fn parse(value: &str) -> Self {
        let upper = value.trim().to_uppercase();
        match upper.as_str() {
            "CHAR" => ColumnType::Char,
            "VARCHAR" => ColumnType::Varchar,
            "VARCHAR2" => ColumnType::Varchar2,
            "NCHAR" => ColumnType::NChar,
            "NVARCHAR2" => ColumnType::NVarchar2,
            "NUMBER" => ColumnType::Number,
            "DATE" => ColumnType::Date,
            "TIMESTAMP" => ColumnType::Timestamp,
            "CLOB" => ColumnType::Clob,
            "BLOB" => ColumnType::Blob,
            _ => ColumnType::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ColumnType::Char => "CHAR",
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Varchar2 => "VARCHAR2",
            ColumnType::NChar => "NCHAR",
            ColumnType::NVarchar2 => "NVARCHAR2",
            ColumnType::Number => "NUMBER",
            ColumnType::Date => "DATE",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Clob => "CLOB",
            ColumnType::Blob => "BLOB",
            ColumnType::Other(name) => name,
        }
    }

    pub fn is_character(&self) -> bool {
        matches!(
            self,
            ColumnType::Char
                | ColumnType::Varchar
                | ColumnType::Varchar2
                | ColumnType::NChar
                | ColumnType::NVarchar2
        )
    }

    pub fn is_lob(&self) -> bool {
        matches!(self, ColumnType::Clob | ColumnType::Blob)
    }

    /// Types that may be declared as virtual columns
    pub fn supports_virtual(&self) -> bool {
        self.is_character()
            || matches!(
                self,
                ColumnType::Number | ColumnType::Date | ColumnType::Timestamp
            )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Length semantics for character sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnits {
    Byte,
    Char,
}

impl SizeUnits {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "BYTE" => Some(SizeUnits::Byte),
            "CHAR" => Some(SizeUnits::Char),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeUnits::Byte => "BYTE",
            SizeUnits::Char => "CHAR",
        }
    }
}

/// Size of a column: a length for character types, precision and optional scale for NUMBER
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSize {
    pub precision: u32,
    pub scale: Option<u32>,
}

impl fmt::Display for ColumnSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scale {
            Some(scale) => write!(f, "{},{}", self.precision, scale),
            None => write!(f, "{}", self.precision),
        }
    }
}

fn parse_size(data_type: &ColumnType, raw: &str) -> Option<ColumnSize> {
    let raw = raw.trim();
    if data_type.is_character() {
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        // Digits only, so the only failure is overflow
        let length = raw.parse::<u64>().unwrap_or(u64::MAX);
        if length < 1 {
            return None;
        }
        let length = length.min(MAX_CHAR_SIZE as u64) as u32;
        return Some(ColumnSize {
            precision: length,
            scale: None,
        });
    }
    if *data_type == ColumnType::Number {
        let caps = NUMBER_SIZE.captures(raw)?;
        let precision = caps.get(1)?.as_str().parse().ok()?;
        let scale = match caps.get(2) {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };
        return Some(ColumnSize { precision, scale });
    }
    None
}

/// Single-column index requested by a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexKind {
    #[default]
    None,
    Plain,
    Unique,
}

/// Compound index cluster membership: `Y<n>` (plain) or `U<n>` (unique)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterTag {
    pub unique: bool,
    pub id: u32,
}

impl ClusterTag {
    pub fn parse(value: &str) -> Option<Self> {
        let caps = CLUSTER_TAG.captures(value.trim())?;
        let unique = caps.get(1)?.as_str() == "U";
        let id = caps.get(2)?.as_str().parse().ok()?;
        Some(ClusterTag { unique, id })
    }

    /// Index kind used when a lone member falls back to single-column indexing
    pub fn index_kind(&self) -> IndexKind {
        if self.unique {
            IndexKind::Unique
        } else {
            IndexKind::Plain
        }
    }
}

impl fmt::Display for ClusterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = if self.unique { 'U' } else { 'Y' };
        write!(f, "{}{}", class, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SequencePolicy {
    #[default]
    None,
    /// Create `<TABLE>_<FIELD>_SEQ` starting at the given value
    Start(u64),
    /// Use an existing sequence by name
    Reuse(String),
}

impl SequencePolicy {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            SequencePolicy::None
        } else if raw.chars().all(|c| c.is_ascii_digit()) {
            match raw.parse() {
                Ok(start) => SequencePolicy::Start(start),
                Err(_) => SequencePolicy::Reuse(raw.to_string()),
            }
        } else {
            SequencePolicy::Reuse(raw.to_string())
        }
    }

    pub fn is_sequenced(&self) -> bool {
        !matches!(self, SequencePolicy::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: String,
    pub field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LobCompression {
    #[default]
    Off,
    Low,
    Medium,
    High,
}

impl LobCompression {
    /// `N` means explicitly off; anything unrecognised yields `None`
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "N" => Some(LobCompression::Off),
            "LOW" => Some(LobCompression::Low),
            "MEDIUM" => Some(LobCompression::Medium),
            "HIGH" => Some(LobCompression::High),
            _ => None,
        }
    }

    /// Level keyword, or `None` when compression is off
    pub fn level(&self) -> Option<&'static str> {
        match self {
            LobCompression::Off => None,
            LobCompression::Low => Some("LOW"),
            LobCompression::Medium => Some("MEDIUM"),
            LobCompression::High => Some("HIGH"),
        }
    }
}

/// SECUREFILE storage settings of a CLOB/BLOB column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LobOptions {
    pub deduplicate: bool,
    pub compression: LobCompression,
    pub cache: bool,
    pub logging: bool,
}

impl LobOptions {
    /// Resolve each setting from the row, then the configured default, then off.
    pub fn resolve(row: &SchemaRow, defaults: &LobDefaults) -> Self {
        Self {
            deduplicate: resolve_toggle(&row.lob_deduplication, &defaults.deduplication),
            compression: LobCompression::parse(&row.lob_compression)
                .or_else(|| LobCompression::parse(&defaults.compression))
                .unwrap_or_default(),
            cache: resolve_toggle(&row.lob_caching, &defaults.caching),
            logging: resolve_toggle(&row.lob_logging, &defaults.logging),
        }
    }
}

fn resolve_toggle(explicit: &str, default: &str) -> bool {
    match explicit.trim().to_uppercase().as_str() {
        "Y" => true,
        "N" => false,
        _ => flag(default),
    }
}

/// Where a column came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnOrigin {
    #[default]
    Declared,
    /// U_NAME / U_DATE
    Audit,
    /// HIST_ID, CHANGE, CHANGE_DATE, CHANGE_USER
    HistoryTracking,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
    pub size: Option<ColumnSize>,
    pub units: Option<SizeUnits>,
    pub not_null: bool,
    pub primary_key: bool,
    /// Rendered default expression, already quoted where needed
    pub default: Option<String>,
    pub index: IndexKind,
    pub cluster_tags: Vec<ClusterTag>,
    pub sequence: SequencePolicy,
    pub triggered: bool,
    pub invisible: bool,
    /// Virtual expression; present only for virtual columns
    pub virtual_expr: Option<String>,
    pub check: Option<String>,
    pub foreign_key: Option<ForeignKey>,
    pub comment: Option<String>,
    /// Present iff the type is a LOB
    pub lob: Option<LobOptions>,
    pub origin: ColumnOrigin,
}

impl Column {
    /// Interpret one outline row.
    pub fn from_row(row: &SchemaRow, lob_defaults: &LobDefaults) -> Self {
        let name = row.field.trim().to_uppercase();
        let data_type = ColumnType::parse(&row.data_type);
        let size = parse_size(&data_type, &row.size);
        let units = if data_type.is_character() {
            SizeUnits::parse(&row.units)
        } else {
            None
        };

        let default = if row.default.trim().is_empty() {
            None
        } else {
            Some(render_default(&data_type, row.default.trim()))
        };

        let (index, cluster_tags) = parse_index_cell(&row.index, &name);

        let sequence = SequencePolicy::parse(&row.sequence_start);
        let triggered = sequence.is_sequenced() && flag(&row.pop_by_trigger);

        let virtual_expr = if data_type.supports_virtual()
            && flag(&row.is_virtual)
            && !row.virtual_expr.trim().is_empty()
        {
            Some(row.virtual_expr.trim().to_string())
        } else {
            None
        };

        let check = non_empty(row.check_constraint.trim());
        let foreign_key = match (non_empty(row.fk_to_table.trim()), non_empty(row.fk_to_field.trim())) {
            (Some(table), Some(field)) => Some(ForeignKey { table, field }),
            _ => None,
        };
        let comment = non_empty(row.column_comment.trim().trim_matches('\''));

        let lob = if data_type.is_lob() {
            Some(LobOptions::resolve(row, lob_defaults))
        } else {
            None
        };

        Self {
            name,
            data_type,
            size,
            units,
            not_null: flag(&row.not_null),
            primary_key: flag(&row.primary_key),
            default,
            index,
            cluster_tags,
            sequence,
            triggered,
            invisible: flag(&row.invisible),
            virtual_expr,
            check,
            foreign_key,
            comment,
            lob,
            origin: ColumnOrigin::Declared,
        }
    }

    /// Build a generator-owned column from a synthesized row.
    pub(crate) fn synthetic(row: &SchemaRow, origin: ColumnOrigin) -> Self {
        let mut col = Self::from_row(row, &LobDefaults::default());
        col.origin = origin;
        col
    }

    pub fn is_virtual(&self) -> bool {
        self.virtual_expr.is_some()
    }

    pub fn is_declared(&self) -> bool {
        self.origin == ColumnOrigin::Declared
    }

    pub fn is_indexed(&self) -> bool {
        self.index != IndexKind::None
    }

    /// Type with size and units, e.g. `VARCHAR2(20 CHAR)` or `NUMBER(10,2)`.
    pub fn type_string(&self) -> String {
        match (&self.size, self.units) {
            (Some(size), Some(units)) if size.scale.is_none() => {
                format!("{}({} {})", self.data_type, size, units.as_str())
            }
            (Some(size), _) => format!("{}({})", self.data_type, size),
            (None, _) => self.data_type.to_string(),
        }
    }

    /// Trailing clauses of the column definition, single-space separated.
    pub fn options_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.invisible {
            parts.push("INVISIBLE".to_string());
        }
        match &self.virtual_expr {
            Some(expr) => parts.push(format!("AS ({}) VIRTUAL", expr)),
            None => {
                if let Some(default) = &self.default {
                    parts.push(format!("DEFAULT {}", default));
                }
                if self.not_null {
                    parts.push("NOT NULL".to_string());
                }
            }
        }
        parts.join(" ")
    }

    /// Copy for a history table: identity, type and LOB storage kept, constraints dropped.
    pub fn relaxed_for_history(&self) -> Self {
        Self {
            name: self.name.clone(),
            data_type: self.data_type.clone(),
            size: self.size,
            units: self.units,
            not_null: false,
            primary_key: false,
            default: None,
            index: IndexKind::None,
            cluster_tags: Vec::new(),
            sequence: SequencePolicy::None,
            triggered: false,
            invisible: self.invisible,
            virtual_expr: None,
            check: None,
            foreign_key: None,
            comment: self.comment.clone(),
            lob: self.lob,
            origin: ColumnOrigin::Declared,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn render_default(data_type: &ColumnType, raw: &str) -> String {
    let is_keyword = DEFAULT_KEYWORDS
        .iter()
        .any(|kw| kw.eq_ignore_ascii_case(raw));
    let already_quoted = raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'');
    if data_type.is_character() && !is_keyword && !already_quoted {
        format!("'{}'", raw)
    } else {
        raw.to_string()
    }
}

fn parse_index_cell(cell: &str, column: &str) -> (IndexKind, Vec<ClusterTag>) {
    let mut kind = IndexKind::None;
    let mut tags: Vec<ClusterTag> = Vec::new();
    for entry in cell.split(',') {
        let entry = entry.trim().to_uppercase();
        match entry.as_str() {
            "" => {}
            "Y" => {
                if kind == IndexKind::None {
                    kind = IndexKind::Plain;
                }
            }
            "U" => kind = IndexKind::Unique,
            other => match ClusterTag::parse(other) {
                Some(tag) if tags.iter().any(|t| t.unique == tag.unique) => {
                    log::warn!(
                        "{} already belongs to a {} compound index; ignoring {}",
                        column,
                        if tag.unique { "unique" } else { "plain" },
                        tag
                    );
                }
                Some(tag) => tags.push(tag),
                None => log::debug!("Ignoring unrecognised index entry {} on {}", other, column),
            },
        }
    }
    (kind, tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(field: &str, data_type: &str) -> SchemaRow {
        SchemaRow::new("APP_OWNER", "ORDERS", field, data_type)
    }

    #[test]
    fn test_status_column_renders_type_and_options() {
        let mut r = row("status", "varchar2");
        r.size = "20".to_string();
        r.units = "CHAR".to_string();
        r.not_null = "Y".to_string();
        r.default = "ACTIVE".to_string();
        let col = Column::from_row(&r, &LobDefaults::default());

        assert_eq!(col.name, "STATUS");
        assert_eq!(col.type_string(), "VARCHAR2(20 CHAR)");
        assert_eq!(col.options_string(), "DEFAULT 'ACTIVE' NOT NULL");
    }

    #[test]
    fn test_char_size_is_clamped_and_zero_dropped() {
        let mut r = row("NOTES", "VARCHAR2");
        r.size = "9000".to_string();
        assert_eq!(Column::from_row(&r, &LobDefaults::default()).type_string(), "VARCHAR2(4000)");

        r.size = "0".to_string();
        assert_eq!(Column::from_row(&r, &LobDefaults::default()).type_string(), "VARCHAR2");
    }

    #[test]
    fn test_number_precision_and_scale() {
        let mut r = row("AMOUNT", "NUMBER");
        r.size = "10, 2".to_string();
        r.units = "CHAR".to_string();
        let col = Column::from_row(&r, &LobDefaults::default());
        assert_eq!(col.type_string(), "NUMBER(10,2)");
        assert!(col.units.is_none());
    }

    #[test]
    fn test_default_keywords_and_quoted_literals_are_not_requoted() {
        let mut r = row("CREATED_BY", "VARCHAR2");
        r.default = "user".to_string();
        assert_eq!(Column::from_row(&r, &LobDefaults::default()).default.as_deref(), Some("user"));

        r.default = "'X'".to_string();
        assert_eq!(Column::from_row(&r, &LobDefaults::default()).default.as_deref(), Some("'X'"));

        let mut n = row("QTY", "NUMBER");
        n.default = "0".to_string();
        assert_eq!(Column::from_row(&n, &LobDefaults::default()).default.as_deref(), Some("0"));
    }

    #[test]
    fn test_virtual_column_drops_default_and_not_null() {
        let mut r = row("TOTAL", "NUMBER");
        r.is_virtual = "Y".to_string();
        r.virtual_expr = "QTY * PRICE".to_string();
        r.default = "0".to_string();
        r.not_null = "Y".to_string();
        r.invisible = "Y".to_string();
        let col = Column::from_row(&r, &LobDefaults::default());
        assert_eq!(col.options_string(), "INVISIBLE AS (QTY * PRICE) VIRTUAL");
    }

    #[test]
    fn test_virtual_requires_supported_type_and_expression() {
        let mut r = row("DOC", "CLOB");
        r.is_virtual = "Y".to_string();
        r.virtual_expr = "'x'".to_string();
        assert!(!Column::from_row(&r, &LobDefaults::default()).is_virtual());

        let mut r = row("TOTAL", "NUMBER");
        r.is_virtual = "Y".to_string();
        assert!(!Column::from_row(&r, &LobDefaults::default()).is_virtual());
    }

    #[test]
    fn test_index_cell_parsing() {
        let mut r = row("CODE", "VARCHAR2");
        r.index = "u, Y1, U2, U3".to_string();
        let col = Column::from_row(&r, &LobDefaults::default());
        assert_eq!(col.index, IndexKind::Unique);
        assert_eq!(
            col.cluster_tags,
            vec![
                ClusterTag { unique: false, id: 1 },
                ClusterTag { unique: true, id: 2 }
            ]
        );
    }

    #[test]
    fn test_sequence_policy_number_versus_name() {
        let mut r = row("ID", "NUMBER");
        r.sequence_start = "100".to_string();
        r.pop_by_trigger = "Y".to_string();
        let col = Column::from_row(&r, &LobDefaults::default());
        assert_eq!(col.sequence, SequencePolicy::Start(100));
        assert!(col.triggered);

        r.sequence_start = "SHARED_SEQ".to_string();
        let col = Column::from_row(&r, &LobDefaults::default());
        assert_eq!(col.sequence, SequencePolicy::Reuse("SHARED_SEQ".to_string()));

        r.sequence_start = String::new();
        let col = Column::from_row(&r, &LobDefaults::default());
        assert_eq!(col.sequence, SequencePolicy::None);
        assert!(!col.triggered);
    }

    #[test]
    fn test_lob_options_fall_back_to_defaults_then_off() {
        let mut r = row("PAYLOAD", "CLOB");
        r.lob_caching = "Y".to_string();
        r.lob_compression = "ultra".to_string();
        let col = Column::from_row(&r, &LobDefaults::default());
        let lob = col.lob.unwrap();
        assert!(lob.deduplicate);
        assert_eq!(lob.compression, LobCompression::Medium);
        assert!(lob.cache);
        assert!(lob.logging);

        let broken = LobDefaults {
            deduplication: "?".to_string(),
            compression: "MAX".to_string(),
            caching: String::new(),
            logging: "N".to_string(),
        };
        let lob = Column::from_row(&r, &broken).lob.unwrap();
        assert!(!lob.deduplicate);
        assert_eq!(lob.compression, LobCompression::Off);
        assert!(lob.cache);
        assert!(!lob.logging);
    }

    #[test]
    fn test_lob_options_only_for_lob_types() {
        let col = Column::from_row(&row("NAME", "VARCHAR2"), &LobDefaults::default());
        assert!(col.lob.is_none());
    }

    #[test]
    fn test_history_relaxation_keeps_shape() {
        let mut r = row("ID", "NUMBER");
        r.primary_key = "Y".to_string();
        r.not_null = "Y".to_string();
        r.index = "U,U1".to_string();
        r.sequence_start = "1".to_string();
        r.pop_by_trigger = "Y".to_string();
        r.fk_to_table = "CUSTOMERS".to_string();
        r.fk_to_field = "ID".to_string();
        r.check_constraint = " > 0".to_string();
        r.size = "12".to_string();
        r.column_comment = "Order id".to_string();
        let relaxed = Column::from_row(&r, &LobDefaults::default()).relaxed_for_history();

        assert_eq!(relaxed.type_string(), "NUMBER(12)");
        assert!(!relaxed.not_null && !relaxed.primary_key);
        assert_eq!(relaxed.index, IndexKind::None);
        assert!(relaxed.cluster_tags.is_empty());
        assert_eq!(relaxed.sequence, SequencePolicy::None);
        assert!(!relaxed.triggered);
        assert!(relaxed.foreign_key.is_none());
        assert!(relaxed.check.is_none());
        assert_eq!(relaxed.comment.as_deref(), Some("Order id"));
        assert_eq!(relaxed.options_string(), "");
    }
}
