//! Error types for schema generation
//!
//! Only ingestion shape errors and I/O failures abort a run. Structural
//! inconsistencies (package mismatch, missing primary key on a loader table,
//! broken parent chains) are constructed here so they carry a readable
//! message, but the generator logs them and skips the affected artifact.

use thiserror::Error;

/// Schema generation errors
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A schema or grant row has fewer fields than the fixed layout expects
    #[error(
        "row {line} has {found} fields, expected {expected}\n\
         Suggestion: the outline columns must match the fixed file order exactly"
    )]
    RowShape {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem error while reading outlines or writing artifacts
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Package header and body lists have drifted apart
    #[error(
        "Unable to generate package {schema}.{package}: {headers} header(s) but {bodies} body(ies)"
    )]
    PackageMismatch {
        schema: String,
        package: String,
        headers: usize,
        bodies: usize,
    },

    /// A loader table has no primary key to branch insert/update on
    #[error("Loader table {table} has no primary key; loader procedures skipped")]
    MissingPrimaryKey { table: String },

    /// A loader parent does not exist in the registry
    #[error("Loader parent {parent} of {table} was not found in the schema outline")]
    UnknownParent { table: String, parent: String },

    /// Following parent links from a table leads back to itself
    #[error("Loader parent chain of {table} is circular")]
    ParentCycle { table: String },

    /// A render worker panicked or hung up early
    #[error("Render worker failure: {0}")]
    Worker(String),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_shape_message_names_line() {
        let err = SchemaError::RowShape {
            line: 7,
            expected: 28,
            found: 24,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("row 7 has 24 fields, expected 28"));
    }

    #[test]
    fn test_package_mismatch_message() {
        let err = SchemaError::PackageMismatch {
            schema: "APP_OWNER".to_string(),
            package: "APP_HISTORY".to_string(),
            headers: 2,
            bodies: 1,
        };
        assert_eq!(
            err.to_string(),
            "Unable to generate package APP_OWNER.APP_HISTORY: 2 header(s) but 1 body(ies)"
        );
    }
}
