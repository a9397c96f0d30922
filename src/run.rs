//! Run orchestration: outline in, scripts out.
//!
//! Phase one materializes the registry (history tables, audit columns,
//! loader parents). Phase two renders tables on the worker pool; results
//! are merged into a [`RenderSession`] in registry order before packages are
//! compiled and the run-wide files are flushed.

use crate::build_script::write_build_script;
use crate::clean::write_clean_script;
use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::generator::{PackageKind, RenderSession};
use crate::ingest::{load_grants_file, load_schema_file, GrantRow, SchemaRow};
use crate::model::TableRegistry;
use crate::pool::render_tables;
use crate::sink::{ArtifactSink, DirectorySink};
use std::path::Path;

/// What a run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tables rendered, history tables included
    pub tables: usize,
    pub artifacts: usize,
    pub history_schemas: Vec<String>,
    pub loader_schemas: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    wipe_output: bool,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            wipe_output: true,
        }
    }

    /// Keep files already in the output directory instead of clearing it first.
    pub fn keep_output(mut self) -> Self {
        self.wipe_output = false;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Read the configured outlines and write every script below the output directory.
    pub fn run(&self) -> Result<RunSummary> {
        let files = &self.config.files;
        let rows = load_schema_file(Path::new(&files.schema_file))?;
        let grants = load_grants_file(Path::new(&files.grants_file))?;

        let mut sink = DirectorySink::open(&files.output_directory, self.wipe_output)?;
        let summary = self.generate(&rows, &grants, &mut sink)?;

        write_build_script(sink.root(), &files.build_file)?;
        if self.config.clean_script {
            write_clean_script(sink.root(), &files.clean_file)?;
        }
        log::info!(
            "Wrote {} script(s) for {} table(s) to {}",
            summary.artifacts,
            summary.tables,
            sink.root().display()
        );
        Ok(summary)
    }

    /// Both phases over already-loaded rows, handing every artifact to `sink`.
    pub fn generate<S: ArtifactSink>(
        &self,
        rows: &[SchemaRow],
        grants: &[GrantRow],
        sink: &mut S,
    ) -> Result<RunSummary> {
        let mut registry = TableRegistry::from_rows(rows, &self.config.lob_defaults);
        registry.materialize();

        let outputs = render_tables(&registry, &self.config, self.config.effective_workers())?;
        let mut session = RenderSession::new();
        for output in outputs {
            session.absorb(output);
        }
        for grant in grants {
            session.add_grant(grant);
        }

        let history = session.compile_history_package();
        let loader = session.compile_loader_package();
        session.add_package_grants(PackageKind::History, &history.schemas);
        session.add_package_grants(PackageKind::Loader, &loader.schemas);

        let mut artifacts = session.take_artifacts();
        artifacts.extend(history.artifacts);
        artifacts.extend(loader.artifacts);
        artifacts.extend(session.flush_comments());
        artifacts.extend(session.flush_grants());

        for artifact in &artifacts {
            sink.write(artifact)?;
        }

        Ok(RunSummary {
            tables: registry.len(),
            artifacts: artifacts.len(),
            history_schemas: history.schemas,
            loader_schemas: loader.schemas,
        })
    }
}
