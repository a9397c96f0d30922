//! # schemagen
//!
//! Compiles a tabular schema outline into ordered Oracle DDL scripts: tables,
//! indexes, constraints, sequences, triggers, history and loader packages,
//! plus the master build script and a clean script recovered from the
//! generated files themselves.

pub mod artifact;
pub mod build_script;
pub mod clean;
pub mod config;
pub mod error;
pub mod generator;
pub mod ingest;
pub mod model;
pub mod pool;
pub mod run;
pub mod sink;

pub use artifact::{Artifact, Category};
pub use config::GeneratorConfig;
pub use error::{Result, SchemaError};
pub use generator::{render_table, RenderSession, TableOutput};
pub use model::{Column, Table, TableKey, TableRegistry};
pub use run::{Generator, RunSummary};
pub use sink::{ArtifactSink, DirectorySink, MemorySink};
