//! Loader procedures: insert-or-update and delete, cascading through parent tables.
//!
//! A child's load procedure first calls its parent's load procedure, so one
//! call creates or updates the whole chain and hands generated keys back down.
//! Procedures land in the schema's `<ACCOUNT>_LOADER` package.

use super::format::{spacing, TAB};
use super::package::{PackageKind, Procedure};
use crate::config::GeneratorConfig;
use crate::error::SchemaError;
use crate::model::{Column, Table, TableKey, TableRegistry};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamMode {
    In,
    InOut,
}

/// One input of a load procedure and the column it feeds
#[derive(Debug, Clone)]
struct LoaderParam {
    source: TableKey,
    column: String,
    mode: ParamMode,
    type_ref: String,
}

impl LoaderParam {
    fn name(&self) -> String {
        let tail = match self.mode {
            ParamMode::In => "in",
            ParamMode::InOut => "io",
        };
        format!("p_{}_{}", self.column.to_lowercase(), tail)
    }

    fn mode_keyword(&self) -> &'static str {
        match self.mode {
            ParamMode::In => "IN",
            ParamMode::InOut => "IN OUT",
        }
    }
}

struct SignatureLine {
    name: String,
    mode: &'static str,
    type_ref: String,
}

pub fn load_procedure_name(table: &str) -> String {
    format!("P_{}_LOAD", table)
}

pub fn delete_procedure_name(table: &str) -> String {
    format!("P_{}_DELETE", table)
}

/// Load (and optionally delete) procedures for a loader table.
///
/// A table without a primary key cannot branch between insert and update;
/// the error is logged and nothing is produced.
pub fn loader_procedures(
    table: &Table,
    registry: &TableRegistry,
    config: &GeneratorConfig,
) -> Vec<Procedure> {
    if table.primary_key_fields().is_empty() {
        log::error!(
            "{}",
            SchemaError::MissingPrimaryKey {
                table: table.qualified_name()
            }
        );
        return Vec::new();
    }
    let chain = loader_chain(table, registry);
    log::debug!(
        "Loader chain for {}: {}",
        table.qualified_name(),
        chain
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    let mut procedures = vec![load_procedure(&chain, config)];
    if config.loader.include_delete {
        procedures.push(delete_procedure(&chain, config));
    }
    procedures
}

/// The table followed by its ancestors, cut short before any ancestor
/// that has no primary key to link through.
pub fn loader_chain<'a>(table: &'a Table, registry: &'a TableRegistry) -> Vec<&'a Table> {
    let own = table.key();
    let mut chain = vec![table];
    if let Some(parent) = &table.parent {
        chain.extend(
            registry
                .parent_chain(parent)
                .into_iter()
                .take_while(|t| t.key() != own),
        );
    }
    if let Some(cut) = chain
        .iter()
        .skip(1)
        .position(|t| t.primary_key_fields().is_empty())
    {
        log::error!(
            "{}",
            SchemaError::MissingPrimaryKey {
                table: chain[cut + 1].qualified_name()
            }
        );
        chain.truncate(cut + 1);
    }
    chain
}

fn fk_target(table: &Table, column: &Column) -> Option<TableKey> {
    column
        .foreign_key
        .as_ref()
        .and_then(|fk| TableKey::parse_relative(&fk.table, &table.schema))
}

/// Parameters contributed by every table of the chain, child first.
///
/// Skips synthesized and virtual columns, foreign keys into another chain
/// table (those values come from the parent call) and names already taken.
fn loader_params(chain: &[&Table]) -> Vec<LoaderParam> {
    let keys: Vec<TableKey> = chain.iter().map(|t| t.key()).collect();
    let mut taken: HashSet<String> = HashSet::new();
    let mut params = Vec::new();
    for table in chain {
        let own = table.key();
        for col in table.declared_columns() {
            if col.is_virtual() {
                continue;
            }
            if let Some(target) = fk_target(table, col) {
                if target != own && keys.contains(&target) {
                    continue;
                }
            }
            if !taken.insert(col.name.to_uppercase()) {
                continue;
            }
            params.push(LoaderParam {
                source: own.clone(),
                column: col.name.clone(),
                mode: if col.primary_key {
                    ParamMode::InOut
                } else {
                    ParamMode::In
                },
                type_ref: format!("{}.{}.{}%TYPE", table.schema, table.name, col.name),
            });
        }
    }
    params
}

fn find_param<'p>(params: &'p [LoaderParam], source: &TableKey, column: &str) -> Option<&'p LoaderParam> {
    params
        .iter()
        .find(|p| &p.source == source && p.column.eq_ignore_ascii_case(column))
}

fn parent_local(field: &str) -> String {
    format!("v_parent_{}", field.to_lowercase())
}

fn is_primary_field(table: &Table, field: &str) -> bool {
    table
        .primary_key_fields()
        .iter()
        .any(|f| f.eq_ignore_ascii_case(field))
}

/// Expression supplying `col` in the child's INSERT/UPDATE, if any.
fn value_expr(chain: &[&Table], params: &[LoaderParam], col: &Column) -> Option<String> {
    let table = chain[0];
    let ancestor = fk_target(table, col).filter(|target| chain.iter().skip(1).any(|t| &t.key() == target));
    match (ancestor, &col.foreign_key) {
        (Some(target), Some(fk)) => {
            let parent = chain[1];
            if parent.key() == target && is_primary_field(parent, &fk.field) {
                Some(parent_local(&fk.field))
            } else {
                find_param(params, &target, &fk.field).map(|p| p.name())
            }
        }
        _ => find_param(params, &table.key(), &col.name).map(|p| p.name()),
    }
}

fn char_limited(expr: String, col: &Column, config: &GeneratorConfig) -> String {
    match col.size {
        Some(size) if config.loader.enforce_char_lengths && col.data_type.is_character() => {
            format!("SUBSTR({}, 1, {})", expr, size.precision)
        }
        _ => expr,
    }
}

fn push(out: &mut String, depth: usize, text: impl AsRef<str>) {
    for _ in 0..depth {
        out.push_str(TAB);
    }
    out.push_str(text.as_ref());
    out.push('\n');
}

fn signature(lines: &[SignatureLine], min: usize) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let lead = if i == 0 { "" } else { ", " };
        out.push_str(&format!(
            "{t}{t}{lead}{name}{sp}{mode:<8}{ty}\n",
            t = TAB,
            lead = lead,
            name = line.name,
            sp = spacing(&line.name, min),
            mode = line.mode,
            ty = line.type_ref
        ));
    }
    out
}

fn status_lines() -> [SignatureLine; 3] {
    [
        SignatureLine {
            name: "p_commit_in".to_string(),
            mode: "IN",
            type_ref: "BOOLEAN DEFAULT FALSE".to_string(),
        },
        SignatureLine {
            name: "p_success_out".to_string(),
            mode: "OUT",
            type_ref: "BOOLEAN".to_string(),
        },
        SignatureLine {
            name: "p_message_out".to_string(),
            mode: "OUT",
            type_ref: "VARCHAR2".to_string(),
        },
    ]
}

/// Named-argument call to a packaged procedure at the given depth.
fn call_block(out: &mut String, depth: usize, target: &str, args: &[(String, String)]) {
    push(out, depth, target);
    push(out, depth, "(");
    for (i, (name, value)) in args.iter().enumerate() {
        let lead = if i == 0 { "" } else { ", " };
        push(out, depth + 1, format!("{}{} => {}", lead, name, value));
    }
    push(out, depth, ");");
}

fn status_args(args: &mut Vec<(String, String)>) {
    args.push(("p_commit_in".to_string(), "FALSE".to_string()));
    args.push(("p_success_out".to_string(), "v_parent_success".to_string()));
    args.push(("p_message_out".to_string(), "v_parent_message".to_string()));
}

fn parent_failure_check(out: &mut String) {
    push(out, 2, "IF NOT v_parent_success THEN");
    push(out, 3, "v_parent_failed := TRUE;");
    push(out, 3, "RAISE e_parent_failed;");
    push(out, 2, "END IF;");
}

fn parent_state_locals(out: &mut String) {
    push(out, 2, "e_parent_failed EXCEPTION;");
    push(out, 2, "v_parent_failed BOOLEAN := FALSE;");
    push(out, 2, "v_parent_success BOOLEAN;");
    push(out, 2, "v_parent_message VARCHAR2(4000);");
}

fn finish_success(out: &mut String) {
    out.push('\n');
    push(out, 2, "IF p_commit_in THEN");
    push(out, 3, "COMMIT;");
    push(out, 2, "END IF;");
    push(out, 2, "p_success_out := TRUE;");
    push(out, 2, "p_message_out := NULL;");
}

/// Shared handler: record which layer failed, optionally log, roll back when committing.
fn exception_block(
    out: &mut String,
    table: &Table,
    procedure: &str,
    action: &str,
    has_parent: bool,
    config: &GeneratorConfig,
) {
    let local_error = format!(
        "p_message_out := 'Error {} {}: ' || SQLERRM || ' ' || DBMS_UTILITY.FORMAT_ERROR_BACKTRACE;",
        action,
        table.qualified_name()
    );
    push(out, 1, "EXCEPTION");
    push(out, 2, "WHEN OTHERS THEN");
    if has_parent {
        push(out, 3, "IF v_parent_failed THEN");
        push(
            out,
            4,
            format!(
                "p_message_out := 'Parent {} failed for {}: ' || v_parent_message;",
                if action == "deleting" { "delete" } else { "load" },
                table.qualified_name()
            ),
        );
        push(out, 3, "ELSE");
        push(out, 4, &local_error);
        push(out, 3, "END IF;");
    } else {
        push(out, 3, &local_error);
    }
    if config.loader.use_logging {
        push(
            out,
            3,
            format!(
                "{}(p_message_out, '{}.{}');",
                config.logging.plsql_logger,
                PackageKind::Loader.package_name(&table.schema),
                procedure
            ),
        );
    }
    push(out, 3, "IF p_commit_in THEN");
    push(out, 4, "ROLLBACK;");
    push(out, 3, "END IF;");
    push(out, 3, "p_success_out := FALSE;");
    push(out, 1, format!("END {};", procedure));
}

fn procedure_text(name: &str, sig: &str, locals: &str, body: &str) -> Procedure {
    let header = format!("{t}PROCEDURE {name}\n{t}(\n{sig}{t});", t = TAB, name = name, sig = sig);
    let body = format!(
        "{t}PROCEDURE {name}\n{t}(\n{sig}{t}) IS\n{locals}{t}BEGIN\n{body}",
        t = TAB,
        name = name,
        sig = sig,
        locals = locals,
        body = body
    );
    Procedure { header, body }
}

fn load_procedure(chain: &[&Table], config: &GeneratorConfig) -> Procedure {
    let table = chain[0];
    let key = table.key();
    let name = load_procedure_name(&table.name);
    let params = loader_params(chain);
    let parent = chain.get(1).copied();

    let mut lines: Vec<SignatureLine> = params
        .iter()
        .map(|p| SignatureLine {
            name: p.name(),
            mode: p.mode_keyword(),
            type_ref: p.type_ref.clone(),
        })
        .collect();
    lines.extend(status_lines());
    let sig = signature(&lines, config.formatting.table_min_spacing);

    // Primary key expressions select the insert or update branch
    let pk_columns = table.primary_key_columns();
    let pk_exprs: Vec<(String, String)> = pk_columns
        .iter()
        .map(|c| {
            let expr = value_expr(chain, &params, c).unwrap_or_else(|| "NULL".to_string());
            (c.name.clone(), expr)
        })
        .collect();
    let pk_not_null = pk_exprs
        .iter()
        .map(|(_, e)| format!("{} IS NOT NULL", e))
        .collect::<Vec<_>>()
        .join(" AND ");
    let pk_where = pk_exprs
        .iter()
        .map(|(c, e)| format!("{} = {}", c, e))
        .collect::<Vec<_>>()
        .join(" AND ");

    let mut locals = String::new();
    let mut body = String::new();
    push(&mut body, 2, "p_success_out := FALSE;");

    if let Some(parent) = parent {
        let parent_key = parent.key();
        parent_state_locals(&mut locals);
        for pk in parent.primary_key_columns() {
            let local = parent_local(&pk.name);
            let type_ref = format!("{}.{}.{}%TYPE", parent.schema, parent.name, pk.name);
            match find_param(&params, &parent_key, &pk.name) {
                Some(p) => push(&mut locals, 2, format!("{} {} := {};", local, type_ref, p.name())),
                None => push(&mut locals, 2, format!("{} {};", local, type_ref)),
            }
        }

        // Update path: recover the current parent key from the existing row
        let reads: Vec<(&Column, String)> = table
            .declared_columns()
            .filter(|c| !c.primary_key && fk_target(table, c).as_ref() == Some(&parent_key))
            .filter_map(|c| {
                let fk = c.foreign_key.as_ref()?;
                is_primary_field(parent, &fk.field).then(|| (c, parent_local(&fk.field)))
            })
            .collect();
        if !reads.is_empty() && pk_columns.iter().all(|c| find_param(&params, &key, &c.name).is_some()) {
            let unset = reads
                .iter()
                .map(|(_, l)| format!("{} IS NULL", l))
                .collect::<Vec<_>>()
                .join(" AND ");
            body.push('\n');
            push(&mut body, 2, format!("IF {} AND {} THEN", pk_not_null, unset));
            push(
                &mut body,
                3,
                format!(
                    "SELECT {}",
                    reads.iter().map(|(c, _)| c.name.as_str()).collect::<Vec<_>>().join(", ")
                ),
            );
            push(
                &mut body,
                3,
                format!(
                    "INTO {}",
                    reads.iter().map(|(_, l)| l.as_str()).collect::<Vec<_>>().join(", ")
                ),
            );
            push(&mut body, 3, format!("FROM {}", table.qualified_name()));
            push(&mut body, 3, format!("WHERE {};", pk_where));
            push(&mut body, 2, "END IF;");
        }

        let mut args: Vec<(String, String)> = Vec::new();
        for pp in loader_params(&chain[1..]) {
            let value = if pp.source == parent_key && is_primary_field(parent, &pp.column) {
                parent_local(&pp.column)
            } else if let Some(own) = find_param(&params, &pp.source, &pp.column) {
                own.name()
            } else if pp.mode == ParamMode::In {
                "NULL".to_string()
            } else {
                let local = format!("v_pass_{}", pp.column.to_lowercase());
                push(&mut locals, 2, format!("{} {};", local, pp.type_ref));
                local
            };
            args.push((pp.name(), value));
        }
        status_args(&mut args);

        body.push('\n');
        call_block(
            &mut body,
            2,
            &format!(
                "{}.{}.{}",
                parent.schema,
                PackageKind::Loader.package_name(&parent.schema),
                load_procedure_name(&parent.name)
            ),
            &args,
        );
        parent_failure_check(&mut body);
        for pk in parent.primary_key_columns() {
            if let Some(p) = find_param(&params, &parent_key, &pk.name) {
                push(&mut body, 2, format!("{} := {};", p.name(), parent_local(&pk.name)));
            }
        }
    }

    // A key inherited from the parent is only known after the parent call,
    // so the branch tests for an existing row instead of a caller-supplied key
    let inherited_key = parent.is_some()
        && pk_columns
            .iter()
            .any(|c| find_param(&params, &key, &c.name).is_none());
    if inherited_key {
        push(&mut locals, 2, "v_row_count PLS_INTEGER;");
    }

    let mut set_lines: Vec<String> = Vec::new();
    let mut insert_columns: Vec<String> = Vec::new();
    let mut insert_values: Vec<String> = Vec::new();
    for col in table.declared_columns().filter(|c| !c.is_virtual()) {
        let Some(expr) = value_expr(chain, &params, col) else {
            log::debug!("{}.{} has no loader input; left out of {}", table.name, col.name, name);
            continue;
        };
        let expr = char_limited(expr, col, config);
        if !col.primary_key {
            set_lines.push(format!("{} = {}", col.name, expr));
        }
        insert_columns.push(col.name.clone());
        insert_values.push(expr);
    }
    let returning: Vec<(String, String)> = pk_columns
        .iter()
        .filter_map(|c| find_param(&params, &key, &c.name).map(|p| (c.name.clone(), p.name())))
        .collect();

    body.push('\n');
    if inherited_key {
        push(&mut body, 2, "SELECT COUNT(*)");
        push(&mut body, 2, "INTO v_row_count");
        push(&mut body, 2, format!("FROM {}", table.qualified_name()));
        push(&mut body, 2, format!("WHERE {};", pk_where));
        body.push('\n');
        push(&mut body, 2, "IF v_row_count > 0 THEN");
    } else {
        push(&mut body, 2, format!("IF {} THEN", pk_not_null));
    }
    if set_lines.is_empty() {
        push(&mut body, 3, "NULL;");
    } else {
        push(&mut body, 3, format!("UPDATE {}", table.qualified_name()));
        for (i, line) in set_lines.iter().enumerate() {
            if i == 0 {
                push(&mut body, 3, format!("SET {}", line));
            } else {
                push(&mut body, 4, format!(", {}", line));
            }
        }
        push(&mut body, 3, format!("WHERE {};", pk_where));
    }
    push(&mut body, 2, "ELSE");
    push(&mut body, 3, format!("INSERT INTO {}", table.qualified_name()));
    push(&mut body, 3, "(");
    push(&mut body, 4, insert_columns.join(", "));
    push(&mut body, 3, ")");
    push(&mut body, 3, "VALUES");
    push(&mut body, 3, "(");
    push(&mut body, 4, insert_values.join(", "));
    if returning.is_empty() {
        push(&mut body, 3, ");");
    } else {
        push(&mut body, 3, ")");
        push(
            &mut body,
            3,
            format!(
                "RETURNING {} INTO {};",
                returning.iter().map(|(c, _)| c.as_str()).collect::<Vec<_>>().join(", "),
                returning.iter().map(|(_, p)| p.as_str()).collect::<Vec<_>>().join(", ")
            ),
        );
    }
    push(&mut body, 2, "END IF;");
    finish_success(&mut body);
    exception_block(&mut body, table, &name, "loading", parent.is_some(), config);

    procedure_text(&name, &sig, &locals, &body)
}

fn delete_procedure(chain: &[&Table], config: &GeneratorConfig) -> Procedure {
    let table = chain[0];
    let name = delete_procedure_name(&table.name);
    let pk_columns = table.primary_key_columns();

    let mut lines: Vec<SignatureLine> = pk_columns
        .iter()
        .map(|c| SignatureLine {
            name: format!("p_{}_in", c.name.to_lowercase()),
            mode: "IN",
            type_ref: format!("{}.{}.{}%TYPE", table.schema, table.name, c.name),
        })
        .collect();
    lines.extend(status_lines());
    let sig = signature(&lines, config.formatting.table_min_spacing);
    let pk_where = pk_columns
        .iter()
        .map(|c| format!("{} = p_{}_in", c.name, c.name.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" AND ");

    // The parent delete runs only when the child row names every parent key field
    let parent_link = chain.get(1).copied().and_then(|parent| {
        let parent_key = parent.key();
        let mapped: Option<Vec<(&Column, &Column)>> = parent
            .primary_key_columns()
            .into_iter()
            .map(|pk| {
                table.declared_columns().find(|c| {
                    fk_target(table, c).as_ref() == Some(&parent_key)
                        && c.foreign_key
                            .as_ref()
                            .map_or(false, |fk| fk.field.eq_ignore_ascii_case(&pk.name))
                })
                .map(|child| (pk, child))
            })
            .collect();
        if mapped.is_none() {
            log::debug!(
                "{} does not carry every key of {}; parent delete not chained",
                table.qualified_name(),
                parent.qualified_name()
            );
        }
        mapped.map(|m| (parent, m))
    });

    let mut locals = String::new();
    let mut body = String::new();
    push(&mut body, 2, "p_success_out := FALSE;");

    if let Some((parent, mapped)) = &parent_link {
        parent_state_locals(&mut locals);
        for (pk, _) in mapped {
            push(
                &mut locals,
                2,
                format!(
                    "{} {}.{}.{}%TYPE;",
                    parent_local(&pk.name),
                    parent.schema,
                    parent.name,
                    pk.name
                ),
            );
        }
        body.push('\n');
        push(
            &mut body,
            2,
            format!(
                "SELECT {}",
                mapped.iter().map(|(_, c)| c.name.as_str()).collect::<Vec<_>>().join(", ")
            ),
        );
        push(
            &mut body,
            2,
            format!(
                "INTO {}",
                mapped
                    .iter()
                    .map(|(pk, _)| parent_local(&pk.name))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        );
        push(&mut body, 2, format!("FROM {}", table.qualified_name()));
        push(&mut body, 2, format!("WHERE {};", pk_where));
    }

    body.push('\n');
    push(&mut body, 2, format!("DELETE FROM {}", table.qualified_name()));
    push(&mut body, 2, format!("WHERE {};", pk_where));

    if let Some((parent, mapped)) = &parent_link {
        let mut args: Vec<(String, String)> = mapped
            .iter()
            .map(|(pk, _)| (format!("p_{}_in", pk.name.to_lowercase()), parent_local(&pk.name)))
            .collect();
        status_args(&mut args);
        body.push('\n');
        call_block(
            &mut body,
            2,
            &format!(
                "{}.{}.{}",
                parent.schema,
                PackageKind::Loader.package_name(&parent.schema),
                delete_procedure_name(&parent.name)
            ),
            &args,
        );
        parent_failure_check(&mut body);
    }

    finish_success(&mut body);
    exception_block(&mut body, table, &name, "deleting", parent_link.is_some(), config);

    procedure_text(&name, &sig, &locals, &body)
}
