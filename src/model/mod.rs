//! In-memory schema model: columns, tables, and the run-wide registry.

pub mod column;
pub mod registry;
pub mod table;

pub use column::{
    ClusterTag, Column, ColumnOrigin, ColumnSize, ColumnType, ForeignKey, IndexKind,
    LobCompression, LobOptions, SequencePolicy, SizeUnits,
};
pub use registry::TableRegistry;
pub use table::{account_name, CompoundIndex, Table, TableKey};
