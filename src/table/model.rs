//! Assembled tables: rows, columns and the walk-to-table assembler.

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;
use std::sync::OnceLock;

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;

use super::TableSpec;
use crate::error::Result;
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;

/// Row identifier: the OID arcs after the column ID.
///
/// Equality is arc by arc, so `1` and `1.0` are different rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(SmallVec<[u32; 4]>);

impl RowId {
    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    /// The row ID as a relative OID.
    pub fn to_oid(&self) -> Oid {
        Oid::from_slice(&self.0)
    }
}

impl From<&[u32]> for RowId {
    fn from(arcs: &[u32]) -> Self {
        RowId(SmallVec::from_slice(arcs))
    }
}

impl<const N: usize> From<[u32; N]> for RowId {
    fn from(arcs: [u32; N]) -> Self {
        RowId(SmallVec::from_slice(&arcs))
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

/// One table row: its ID and a cell per column it has a value for.
///
/// Cells iterate in the table's column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: RowId,
    cells: IndexMap<String, Value>,
}

impl Row {
    pub fn id(&self) -> &RowId {
        &self.id
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Index<&str> for Row {
    type Output = Value;

    /// # Panics
    ///
    /// If the row has no cell for `column`.
    fn index(&self, column: &str) -> &Value {
        &self.cells[column]
    }
}

/// One column's cells, aligned with the table's rows.
#[derive(Debug, Clone)]
pub struct Column {
    cells: Vec<Option<Value>>,
    present: usize,
    counts: OnceLock<HashMap<Value, usize>>,
}

impl Column {
    fn new(cells: Vec<Option<Value>>) -> Self {
        let present = cells.iter().filter(|c| c.is_some()).count();
        Self {
            cells,
            present,
            counts: OnceLock::new(),
        }
    }

    /// One entry per table row; `None` where the row has no value.
    pub fn cells(&self) -> &[Option<Value>] {
        &self.cells
    }

    /// Value in the row at `row_index`.
    pub fn get(&self, row_index: usize) -> Option<&Value> {
        self.cells.get(row_index).and_then(Option::as_ref)
    }

    /// Present values in row order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.cells.iter().flatten()
    }

    /// Number of present values.
    pub fn len(&self) -> usize {
        self.present
    }

    pub fn is_empty(&self) -> bool {
        self.present == 0
    }

    /// How often each value occurs, computed on first call.
    pub fn value_count(&self) -> &HashMap<Value, usize> {
        self.counts.get_or_init(|| {
            let mut counts = HashMap::new();
            for value in self.values() {
                *counts.entry(value.clone()).or_insert(0) += 1;
            }
            counts
        })
    }
}

/// An assembled conceptual table.
///
/// Rows keep the order in which their IDs were first seen; columns follow
/// declaration order, then undeclared columns in order of first
/// appearance.
#[derive(Debug, Clone)]
pub struct Table {
    rows: Vec<Row>,
    columns: IndexMap<String, Column>,
}

impl Table {
    /// Assemble a table from a walk of the spec's base OID.
    ///
    /// The first arc after the base is the column ID and the rest is the
    /// row ID. Bindings outside the base or without a row ID are skipped.
    pub fn from_walk(spec: &TableSpec, varbinds: impl IntoIterator<Item = VarBind>) -> Result<Table> {
        spec.validate()?;
        let mut assembler = Assembler::new(spec);
        for vb in varbinds {
            match vb.oid.suffix_after(spec.base()) {
                Some([column, row @ ..]) if !row.is_empty() => {
                    assembler.insert(*column, row, vb.value)
                }
                _ => tracing::debug!(target: "snmp_tables::table", { snmp.oid = %vb.oid }, "skipping binding without column and row"),
            }
        }
        Ok(assembler.finish())
    }

    /// Assemble a table from one walk per column, each of `base.columnId`.
    ///
    /// Everything after the column's OID is the row ID.
    pub fn from_column_walks(
        spec: &TableSpec,
        walks: impl IntoIterator<Item = (u32, Vec<VarBind>)>,
    ) -> Result<Table> {
        spec.validate()?;
        let mut assembler = Assembler::new(spec);
        for (column, varbinds) in walks {
            let column_base = spec.base().child(column);
            for vb in varbinds {
                match vb.oid.suffix_after(&column_base) {
                    Some(row) if !row.is_empty() => assembler.insert(column, row, vb.value),
                    _ => tracing::debug!(target: "snmp_tables::table", { snmp.oid = %vb.oid }, "skipping binding without row"),
                }
            }
        }
        Ok(assembler.finish())
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Row with the given ID.
    pub fn find_row(&self, id: &RowId) -> Option<&Row> {
        self.rows.iter().find(|row| row.id == *id)
    }

    /// `(name, column)` pairs in column order.
    pub fn columns(&self) -> impl ExactSizeIterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(name, column)| (name.as_str(), column))
    }

    pub fn column_names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl Index<usize> for Table {
    type Output = Row;

    fn index(&self, index: usize) -> &Row {
        &self.rows[index]
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Groups `(column, row, value)` triples into rows.
struct Assembler<'a> {
    spec: &'a TableSpec,
    rows: IndexMap<RowId, IndexMap<String, Value>>,
    /// Column names seen, in order of first appearance.
    seen: IndexSet<String>,
}

impl<'a> Assembler<'a> {
    fn new(spec: &'a TableSpec) -> Self {
        Self {
            spec,
            rows: IndexMap::new(),
            seen: IndexSet::new(),
        }
    }

    fn insert(&mut self, column: u32, row: &[u32], raw: Value) {
        let name = match self.spec.column_name(column) {
            Some(name) => name.to_owned(),
            None if self.spec.only_named_columns() => return,
            None => column.to_string(),
        };

        let value = self.spec.present(&name, raw);
        tracing::trace!(target: "snmp_tables::table", { snmp.column = %name, snmp.row = ?row }, "{}", value);

        self.seen.insert(name.clone());
        self.rows
            .entry(RowId::from(row))
            .or_default()
            .insert(name, value);
    }

    /// Declared columns first (all of them when fetching sparsely, only
    /// the observed ones otherwise), then undeclared ones as first seen.
    fn column_order(&self) -> Vec<String> {
        let declared = self.spec.declared_columns();
        let mut order: Vec<String> = declared
            .iter()
            .filter(|(_, name)| !self.spec.fetches_all_columns() || self.seen.contains(name))
            .map(|(_, name)| name.clone())
            .collect();
        order.extend(
            self.seen
                .iter()
                .filter(|name| !declared.iter().any(|(_, d)| d == *name))
                .cloned(),
        );
        order
    }

    fn finish(self) -> Table {
        let order = self.column_order();

        let rows: Vec<Row> = self
            .rows
            .into_iter()
            .map(|(id, mut cells)| {
                let ordered = order
                    .iter()
                    .filter_map(|name| cells.swap_remove_entry(name.as_str()))
                    .collect();
                Row { id, cells: ordered }
            })
            .collect();

        let columns = order
            .into_iter()
            .map(|name| {
                let cells = rows.iter().map(|row| row.cells.get(&name).cloned()).collect();
                (name, Column::new(cells))
            })
            .collect();

        Table { rows, columns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use proptest::prelude::*;

    fn spec() -> TableSpec {
        TableSpec::new("1.3.6.1.9").unwrap()
    }

    fn vb(arcs: &[u32], value: impl Into<Value>) -> VarBind {
        let mut oid = vec![1, 3, 6, 1, 9];
        oid.extend_from_slice(arcs);
        VarBind::new(Oid::new(oid), value.into())
    }

    #[test]
    fn test_row_id_display_and_equality() {
        assert_eq!(RowId::from([4, 10, 0, 0, 1]).to_string(), "4.10.0.0.1");
        assert_eq!(RowId::from([1]).to_string(), "1");
        assert_ne!(RowId::from([1]), RowId::from([1, 0]));
    }

    #[test]
    fn test_empty_walk() {
        let table = Table::from_walk(&spec().column(3, "username"), Vec::new()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 0);
    }

    #[test]
    fn test_undeclared_columns_follow_declared() {
        let table = Table::from_walk(
            &spec().column(25, "protocol"),
            vec![
                vb(&[3, 1], "jdoe"),
                vb(&[7, 1], 1),
                vb(&[25, 1], 3),
                vb(&[3, 2], "rms"),
            ],
        )
        .unwrap();
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["protocol", "3", "7"]);
        assert_eq!(table.len(), 2);
        // row cells follow column order too
        let names: Vec<_> = table[0].iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["protocol", "3", "7"]);
        assert!(!table[1].contains("protocol"));
    }

    #[test]
    fn test_named_columns_only() {
        let table = Table::from_walk(
            &spec().column(3, "username").named_columns_only(true),
            vec![vb(&[3, 1], "jdoe"), vb(&[7, 1], 1)],
        )
        .unwrap();
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["username"]);
        assert_eq!(table[0].len(), 1);
    }

    #[test]
    fn test_short_and_foreign_oids_are_skipped() {
        let table = Table::from_walk(
            &spec(),
            vec![
                vb(&[3], "no row"),
                VarBind::new(oid!(1, 3, 6, 1, 8, 3, 1), Value::from("elsewhere")),
                vb(&[3, 1], "jdoe"),
            ],
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0]["3"], Value::from("jdoe"));
    }

    #[test]
    fn test_later_duplicates_overwrite() {
        let table =
            Table::from_walk(&spec(), vec![vb(&[3, 1], "old"), vb(&[3, 1], "new")]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0]["3"], Value::from("new"));
    }

    #[test]
    fn test_multi_arc_row_ids() {
        let table = Table::from_walk(
            &spec().column(2, "mask"),
            vec![vb(&[2, 10, 0, 0, 1], "a"), vb(&[2, 10, 0, 0, 2], "b")],
        )
        .unwrap();
        assert_eq!(table[0].id().to_string(), "10.0.0.1");
        assert!(table.find_row(&RowId::from([10, 0, 0, 2])).is_some());
    }

    #[test]
    fn test_column_walks_keep_declared_empty_columns() {
        let spec = spec()
            .column(3, "username")
            .column(25, "protocol")
            .fetch_all_columns(false);
        let table = Table::from_column_walks(
            &spec,
            vec![(3, vec![vb(&[3, 1], "jdoe"), vb(&[3], "column itself")]), (25, Vec::new())],
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["username", "protocol"]);
        let protocol = table.column("protocol").unwrap();
        assert!(protocol.is_empty());
        assert_eq!(protocol.cells(), &[None]);
    }

    #[test]
    fn test_column_alignment_with_gaps() {
        let table = Table::from_walk(
            &spec(),
            vec![vb(&[3, 1], "jdoe"), vb(&[3, 2], "rms"), vb(&[4, 2], 9)],
        )
        .unwrap();
        let column = table.column("4").unwrap();
        assert_eq!(column.cells(), &[None, Some(Value::Integer(9))]);
        assert_eq!(column.get(1), Some(&Value::Integer(9)));
        assert_eq!(column.len(), 1);
    }

    #[test]
    fn test_value_count_is_memoized() {
        let table = Table::from_walk(
            &spec(),
            vec![vb(&[3, 1], "a"), vb(&[3, 2], "b"), vb(&[3, 3], "a")],
        )
        .unwrap();
        let column = table.column("3").unwrap();
        let first = column.value_count() as *const _;
        assert_eq!(column.value_count()[&Value::from("a")], 2);
        assert_eq!(first, column.value_count() as *const _);
    }

    fn triples() -> impl Strategy<Value = Vec<(u32, Vec<u32>, i32)>> {
        prop::collection::vec(
            (1u32..6, prop::collection::vec(0u32..4, 1..3), 0i32..5),
            0..40,
        )
    }

    proptest! {
        #[test]
        fn prop_row_count_is_distinct_suffixes(input in triples()) {
            let varbinds: Vec<_> = input
                .iter()
                .map(|(column, row, value)| {
                    let mut arcs = vec![*column];
                    arcs.extend(row);
                    vb(&arcs, *value)
                })
                .collect();
            let table = Table::from_walk(&spec(), varbinds).unwrap();

            let suffixes: std::collections::HashSet<_> = input.iter().map(|(_, row, _)| row.clone()).collect();
            prop_assert_eq!(table.len(), suffixes.len());

            let columns: std::collections::HashSet<_> = input.iter().map(|(column, _, _)| *column).collect();
            prop_assert_eq!(table.columns().len(), columns.len());

            for (_, column) in table.columns() {
                prop_assert_eq!(column.value_count().values().sum::<usize>(), column.len());
                for key in column.value_count().keys() {
                    prop_assert!(column.values().any(|v| v == key));
                }
            }
        }

        #[test]
        fn prop_mapping_law(input in triples()) {
            let spec = spec().column(1, "one").map_value("one", 0, "zero");
            let varbinds: Vec<_> = input
                .iter()
                .map(|(column, row, value)| {
                    let mut arcs = vec![*column];
                    arcs.extend(row);
                    vb(&arcs, *value)
                })
                .collect();
            let table = Table::from_walk(&spec, varbinds).unwrap();
            if let Some(column) = table.column("one") {
                prop_assert!(column.values().all(|v| *v != Value::Integer(0)));
            }
        }
    }
}
