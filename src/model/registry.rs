//! Run-wide table registry.
//!
//! Holds every table of a run in first-seen order and owns the phase-one
//! derivations that must finish before any table is rendered.

use super::column::Column;
use super::table::{Table, TableKey};
use crate::config::LobDefaults;
use crate::error::SchemaError;
use crate::ingest::SchemaRow;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: Vec<Table>,
    positions: HashMap<TableKey, usize>,
    next_number: u32,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group rows into tables, numbering tables 1, 2, 3… as they first appear.
    pub fn from_rows(rows: &[SchemaRow], lob_defaults: &LobDefaults) -> Self {
        let mut registry = Self::new();
        for row in rows {
            registry.add_row(row, lob_defaults);
        }
        log::info!("Loaded {} table(s) from the outline", registry.len());
        registry
    }

    pub fn add_row(&mut self, row: &SchemaRow, lob_defaults: &LobDefaults) {
        let key = TableKey::new(row.schema.trim(), row.table.trim());
        let existing = self.positions.get(&key).copied();
        let pos = match existing {
            Some(pos) => pos,
            None => {
                self.next_number += 1;
                log::debug!("New table: {}", key);
                self.insert(Table::from_row(row, self.next_number))
            }
        };
        log::debug!("Loading {}.{}", key, row.field.trim());
        self.tables[pos].add_column(Column::from_row(row, lob_defaults));
    }

    /// Add a fully built table. A table with the same key is replaced in place.
    pub fn insert(&mut self, table: Table) -> usize {
        let key = table.key();
        if let Some(pos) = self.positions.get(&key) {
            self.tables[*pos] = table;
            return *pos;
        }
        self.next_number = self.next_number.max(table.table_number);
        self.tables.push(table);
        let pos = self.tables.len() - 1;
        self.positions.insert(key, pos);
        pos
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn get(&self, key: &TableKey) -> Option<&Table> {
        self.positions.get(key).map(|pos| &self.tables[*pos])
    }

    pub fn get_mut(&mut self, key: &TableKey) -> Option<&mut Table> {
        match self.positions.get(key) {
            Some(pos) => self.tables.get_mut(*pos),
            None => None,
        }
    }

    /// Phase one: compound cleanup, history tables, audit columns, loader parents.
    pub fn materialize(&mut self) {
        for table in &mut self.tables {
            table.clean_compound_index();
        }
        self.derive_history_tables();
        for table in &mut self.tables {
            if !table.is_history && table.gen_audit_columns() {
                log::debug!("Injected audit columns into {}", table.qualified_name());
            }
        }
        self.resolve_parents();
        self.break_parent_cycles();
        self.propagate_loader_flags();
    }

    fn derive_history_tables(&mut self) {
        let originals = std::mem::take(&mut self.tables);
        let derived: Vec<Option<Table>> = originals
            .iter()
            .map(|t| t.gen_history_table(None))
            .collect();
        let derived_keys: HashSet<TableKey> = derived.iter().flatten().map(|t| t.key()).collect();

        let mut ordered = Vec::with_capacity(originals.len() + derived_keys.len());
        for (table, history) in originals.into_iter().zip(derived) {
            if derived_keys.contains(&table.key()) {
                log::warn!(
                    "{} is declared in the outline and also derived as a history table; keeping the derived one",
                    table.qualified_name()
                );
                continue;
            }
            ordered.push(table);
            if let Some(hist) = history {
                log::info!("History table {} derived", hist.qualified_name());
                ordered.push(hist);
            }
        }
        self.tables = ordered;
        self.reindex();
    }

    fn reindex(&mut self) {
        self.positions = self
            .tables
            .iter()
            .enumerate()
            .map(|(pos, t)| (t.key(), pos))
            .collect();
    }

    fn resolve_parents(&mut self) {
        for pos in 0..self.tables.len() {
            let table = &self.tables[pos];
            let Some(raw) = table.loader_parent_ref.clone() else {
                continue;
            };
            let resolved = TableKey::parse_relative(&raw, &table.schema)
                .filter(|key| self.positions.contains_key(key) && *key != table.key());
            if resolved.is_none() {
                log::error!(
                    "{}",
                    SchemaError::UnknownParent {
                        table: table.qualified_name(),
                        parent: raw.clone(),
                    }
                );
            }
            self.tables[pos].parent = resolved;
        }
    }

    fn break_parent_cycles(&mut self) {
        for pos in 0..self.tables.len() {
            let start = self.tables[pos].key();
            let mut seen: HashSet<TableKey> = HashSet::new();
            seen.insert(start.clone());
            let mut cursor = self.tables[pos].parent.clone();
            while let Some(key) = cursor {
                if key == start {
                    log::error!(
                        "{}",
                        SchemaError::ParentCycle {
                            table: start.to_string()
                        }
                    );
                    self.tables[pos].parent = None;
                    break;
                }
                if !seen.insert(key.clone()) {
                    break;
                }
                cursor = self.get(&key).and_then(|t| t.parent.clone());
            }
        }
    }

    fn propagate_loader_flags(&mut self) {
        let mut ancestors: Vec<TableKey> = Vec::new();
        for table in self.tables.iter().filter(|t| t.needs_loader) {
            ancestors.extend(self.parent_chain(&table.key()).iter().skip(1).map(|t| t.key()));
        }
        for key in ancestors {
            if let Some(parent) = self.get_mut(&key) {
                if !parent.needs_loader {
                    log::debug!("{} marked for loader generation as an ancestor", key);
                    parent.needs_loader = true;
                }
            }
        }
    }

    /// The table followed by its parent, grandparent and so on.
    ///
    /// Stops at the first unresolved or repeated link.
    pub fn parent_chain(&self, key: &TableKey) -> Vec<&Table> {
        let mut chain: Vec<&Table> = Vec::new();
        let mut seen: HashSet<TableKey> = HashSet::new();
        let mut cursor = Some(key.clone());
        while let Some(k) = cursor {
            if !seen.insert(k.clone()) {
                break;
            }
            match self.get(&k) {
                Some(table) => {
                    chain.push(table);
                    cursor = table.parent.clone();
                }
                None => break,
            }
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(table: &str, field: &str, setup: impl FnOnce(&mut SchemaRow)) -> SchemaRow {
        let mut r = SchemaRow::new("APP_OWNER", table, field, "NUMBER");
        setup(&mut r);
        r
    }

    fn build(rows: Vec<SchemaRow>) -> TableRegistry {
        let mut reg = TableRegistry::from_rows(&rows, &LobDefaults::default());
        reg.materialize();
        reg
    }

    #[test]
    fn test_tables_numbered_in_first_seen_order() {
        let reg = TableRegistry::from_rows(
            &[
                row("A", "ID", |_| {}),
                row("B", "ID", |_| {}),
                row("A", "NAME", |_| {}),
            ],
            &LobDefaults::default(),
        );
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.tables()[0].name, "A");
        assert_eq!(reg.tables()[0].table_number, 1);
        assert_eq!(reg.tables()[0].columns().len(), 2);
        assert_eq!(reg.tables()[1].table_number, 2);
    }

    #[test]
    fn test_history_inserted_after_source_with_same_number() {
        let reg = build(vec![
            row("ORDERS", "ID", |r| {
                r.gen_history_tables = "Y".to_string();
                r.gen_audit_columns = "Y".to_string();
            }),
            row("ITEMS", "ID", |_| {}),
        ]);
        let names: Vec<&str> = reg.tables().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["ORDERS", "H_ORDERS", "ITEMS"]);
        assert_eq!(reg.tables()[1].table_number, 1);
        assert!(reg.tables()[0].column("U_NAME").is_some());
        assert!(reg.tables()[1].column("U_NAME").is_none());
        assert!(reg.get(&TableKey::new("APP_OWNER", "H_ORDERS")).is_some());
    }

    #[test]
    fn test_parent_chain_three_levels_marks_ancestors() {
        let reg = build(vec![
            row("REGIONS", "ID", |_| {}),
            row("CUSTOMERS", "ID", |r| r.loader_parent = "REGIONS".to_string()),
            row("ORDERS", "ID", |r| {
                r.gen_loader = "Y".to_string();
                r.loader_parent = "APP_OWNER.CUSTOMERS".to_string();
            }),
        ]);
        let chain: Vec<&str> = reg
            .parent_chain(&TableKey::new("APP_OWNER", "ORDERS"))
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(chain, vec!["ORDERS", "CUSTOMERS", "REGIONS"]);
        assert!(reg.tables().iter().all(|t| t.needs_loader));
    }

    #[test]
    fn test_unknown_parent_is_dropped() {
        let reg = build(vec![row("ORDERS", "ID", |r| {
            r.gen_loader = "Y".to_string();
            r.loader_parent = "MISSING".to_string();
        })]);
        assert!(reg.tables()[0].parent.is_none());
    }

    #[test]
    fn test_parent_cycle_is_broken() {
        let reg = build(vec![
            row("A", "ID", |r| r.loader_parent = "B".to_string()),
            row("B", "ID", |r| r.loader_parent = "A".to_string()),
        ]);
        assert!(reg.tables()[0].parent.is_none());
        assert_eq!(reg.tables()[1].parent, Some(TableKey::new("APP_OWNER", "A")));
        assert_eq!(reg.parent_chain(&TableKey::new("APP_OWNER", "B")).len(), 2);
    }
}
