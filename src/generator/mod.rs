//! Script generation for one materialized table.
//!
//! [`render_table`] is pure with respect to the registry: it reads the table
//! and, for loader chains, its ancestors, and returns everything it rendered
//! in a [`TableOutput`]. Per-table counters live on the stack of one call.

pub mod ddl;
pub mod format;
pub mod history;
pub mod loader;
pub mod package;
pub mod session;

pub use ddl::KeyKind;
pub use package::{PackageAccumulator, PackageBuild, PackageKind, Procedure};
pub use session::{RenderSession, TableOutput};

use crate::config::GeneratorConfig;
use crate::model::{IndexKind, Table, TableRegistry};
use format::Counter;

/// Render every artifact of `table`, in the fixed per-table order.
pub fn render_table(
    position: usize,
    table: &Table,
    registry: &TableRegistry,
    config: &GeneratorConfig,
) -> TableOutput {
    log::info!("Processing table {}...", table.qualified_name());
    let mut out = TableOutput::new(position, &table.schema, &table.name);
    let mut index_count = Counter::default();
    let mut fk_count = Counter::default();
    let mut check_count = Counter::default();

    if table.needs_history && !table.is_history {
        log::info!("History triggers requested for {}", table.name);
        let columns: Vec<_> = table.declared_columns().collect();
        if config.history.use_procedures {
            let (call, procedure) = history::history_procedure(table, &columns, config);
            out.artifacts
                .extend(history::history_triggers(table, &columns, Some(call.as_str()), config));
            out.history_procedures.push(procedure);
        } else {
            out.artifacts
                .extend(history::history_triggers(table, &columns, None, config));
        }
    }

    if table.needs_audit && !table.is_history {
        out.artifacts.push(ddl::audit_trigger(table));
    }

    if let Some(comment) = &table.comment {
        out.comments.push(ddl::table_comment(table, comment));
    }

    if table.has_compound_primary_key() {
        log::debug!("Table {} has a compound primary key", table.name);
        out.artifacts.extend(ddl::index_artifacts(
            table,
            table.primary_key_fields(),
            KeyKind::Primary,
            1,
            true,
        ));
    }

    if table.has_compound_index() {
        log::debug!("Table {} has one or more compound indexes", table.name);
        for cluster in table.compound_indexes() {
            let kind = if cluster.is_unique() {
                KeyKind::Unique
            } else {
                KeyKind::Plain
            };
            out.artifacts.extend(ddl::index_artifacts(
                table,
                &cluster.members,
                kind,
                index_count.next_value(),
                true,
            ));
        }
    }

    let columns = table.ordered_columns(config.sorting.columns_nullable);
    out.artifacts.push(ddl::table_script(
        table,
        &columns,
        config.formatting.table_min_spacing,
    ));

    for col in table.columns() {
        log::debug!("Writing scripts for {}.{}", table.name, col.name);
        let clustered = table.is_field_in_compound_index(&col.name);
        if col.primary_key && !table.has_compound_primary_key() && !clustered {
            if col.index == IndexKind::Plain {
                log::debug!(
                    "{}.{} is a primary key; non-unique index request raised to unique",
                    table.name,
                    col.name
                );
            }
            out.artifacts.extend(ddl::index_artifacts(
                table,
                std::slice::from_ref(&col.name),
                KeyKind::Primary,
                1,
                false,
            ));
        } else if col.is_indexed() && !clustered {
            if col.primary_key {
                log::debug!(
                    "{}.{} is part of the compound primary key and also gets its own index",
                    table.name,
                    col.name
                );
            }
            let kind = match col.index {
                IndexKind::Unique => KeyKind::Unique,
                _ => KeyKind::Plain,
            };
            log::debug!("{}.{} is indexed ({})", table.name, col.name, kind.code());
            out.artifacts.extend(ddl::index_artifacts(
                table,
                std::slice::from_ref(&col.name),
                kind,
                index_count.next_value(),
                false,
            ));
        }

        if col.sequence.is_sequenced() {
            log::debug!(
                "{}.{} has an assigned sequence; trigger-fired = {}",
                table.name,
                col.name,
                col.triggered
            );
            out.artifacts.extend(ddl::sequence_artifacts(table, col));
        }

        if col.foreign_key.is_some() {
            if let Some(fk) = ddl::fk_constraint(table, col, fk_count.next_value()) {
                out.artifacts.push(fk);
            }
        }

        if col.check.is_some() {
            if let Some(check) = ddl::check_constraint(table, col, check_count.next_value()) {
                out.artifacts.push(check);
            }
        }

        if let Some(comment) = &col.comment {
            out.comments
                .push(ddl::column_comment(table, &col.name, comment));
        }
    }

    if config.loader.enable && table.needs_loader && !table.is_history {
        out.loader_procedures = loader::loader_procedures(table, registry, config);
    }

    out
}
