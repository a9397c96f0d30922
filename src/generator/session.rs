//! Run-wide accumulators filled from per-table render results.
//!
//! Workers never touch a [`RenderSession`]; each produces a [`TableOutput`]
//! and the session absorbs them in registry order, which keeps package and
//! comment ordering identical across runs.

use super::package::{PackageAccumulator, PackageBuild, PackageKind, Procedure};
use crate::artifact::{Artifact, Category};
use crate::ingest::GrantRow;
use crate::model::account_name;

/// Everything rendered for one table
#[derive(Debug)]
pub struct TableOutput {
    /// Registry position; results are merged in this order
    pub position: usize,
    pub table: String,
    pub schema: String,
    pub artifacts: Vec<Artifact>,
    pub comments: Vec<String>,
    pub history_procedures: Vec<Procedure>,
    pub loader_procedures: Vec<Procedure>,
}

impl TableOutput {
    pub fn new(position: usize, schema: &str, table: &str) -> Self {
        Self {
            position,
            table: table.to_string(),
            schema: schema.to_string(),
            artifacts: Vec::new(),
            comments: Vec::new(),
            history_procedures: Vec::new(),
            loader_procedures: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct RenderSession {
    artifacts: Vec<Artifact>,
    comments: Vec<String>,
    grants: Vec<String>,
    history: PackageAccumulator,
    loader: PackageAccumulator,
}

impl Default for RenderSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSession {
    pub fn new() -> Self {
        Self {
            artifacts: Vec::new(),
            comments: Vec::new(),
            grants: Vec::new(),
            history: PackageAccumulator::new(PackageKind::History),
            loader: PackageAccumulator::new(PackageKind::Loader),
        }
    }

    /// Merge one table's results.
    pub fn absorb(&mut self, output: TableOutput) {
        log::debug!(
            "Merging {} artifact(s) for {}.{}",
            output.artifacts.len(),
            output.schema,
            output.table
        );
        self.artifacts.extend(output.artifacts);
        self.comments.extend(output.comments);
        for procedure in &output.history_procedures {
            self.history.add(&output.schema, procedure);
        }
        for procedure in &output.loader_procedures {
            self.loader.add(&output.schema, procedure);
        }
    }

    pub fn add_grant(&mut self, grant: &GrantRow) {
        self.grants.push(format!(
            "GRANT {} ON {}.{} TO {};\n",
            grant.level.privileges(),
            grant.schema,
            grant.table,
            grant.user
        ));
    }

    /// `GRANT EXECUTE` on each compiled package to the schema's account.
    pub fn add_package_grants(&mut self, kind: PackageKind, schemas: &[String]) {
        for schema in schemas {
            self.grants.push(format!(
                "GRANT EXECUTE ON {}.{} TO {};\n",
                schema,
                kind.package_name(schema),
                account_name(schema)
            ));
        }
    }

    pub fn compile_history_package(&self) -> PackageBuild {
        self.history.compile()
    }

    pub fn compile_loader_package(&self) -> PackageBuild {
        self.loader.compile()
    }

    /// Rendered table-level artifacts, drained.
    pub fn take_artifacts(&mut self) -> Vec<Artifact> {
        std::mem::take(&mut self.artifacts)
    }

    /// COMMENTS/COMMENTS.sql, or `None` when nothing was collected.
    pub fn flush_comments(&mut self) -> Option<Artifact> {
        let comments = std::mem::take(&mut self.comments);
        if comments.is_empty() {
            log::warn!("No COMMENTS found to write");
            return None;
        }
        log::info!("Writing COMMENTS to file");
        Some(Artifact::new(Category::Comments, "COMMENTS.sql", comments.concat()))
    }

    /// GRANTS/GRANTS.sql, or `None` when nothing was collected.
    pub fn flush_grants(&mut self) -> Option<Artifact> {
        let grants = std::mem::take(&mut self.grants);
        if grants.is_empty() {
            log::warn!("No GRANTS found to write");
            return None;
        }
        log::info!("Writing GRANTS to file");
        Some(Artifact::new(Category::Grants, "GRANTS.sql", grants.concat()))
    }
}
