use crate::types::{CatalogRows, ColumnDescriptor, ForeignKeyEdge, PrimaryKeyColumn, TableDescriptor, TableId};
use std::collections::HashMap;
use tracing::debug;

/// Every base table of the catalog, grouped and ready for rendering.
///
/// Tables keep the order in which the column query first reported them, so
/// iterating a `RelationSet` is deterministic across runs.
#[derive(Debug, Clone, Default)]
pub struct RelationSet {
    tables: Vec<TableDescriptor>,
    index: HashMap<TableId, usize>,
    dropped_primary_key_columns: usize,
    dropped_foreign_key_edges: usize,
}

impl RelationSet {
    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    pub fn table(&self, id: &TableId) -> Option<&TableDescriptor> {
        self.index.get(id).map(|&i| &self.tables[i])
    }

    /// Primary key columns of a table in key order, empty when it has no key
    pub fn primary_key(&self, id: &TableId) -> &[PrimaryKeyColumn] {
        self.table(id).map(|t| t.primary_key.as_slice()).unwrap_or(&[])
    }

    /// Foreign key edges whose source is the given table, in catalog order
    pub fn foreign_keys(&self, id: &TableId) -> &[ForeignKeyEdge] {
        self.table(id).map(|t| t.foreign_keys.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Primary key rows skipped because their table had no columns in the catalog
    pub fn dropped_primary_key_columns(&self) -> usize {
        self.dropped_primary_key_columns
    }

    /// Foreign key rows skipped because their source table had no columns in the catalog
    pub fn dropped_foreign_key_edges(&self) -> usize {
        self.dropped_foreign_key_edges
    }
}

/// Group the flat catalog rows into per-table descriptors.
///
/// Constraint rows pointing at a table the column query never reported are
/// dropped rather than failing the run.
pub fn build_relations(rows: CatalogRows) -> RelationSet {
    let CatalogRows {
        columns,
        primary_keys,
        foreign_keys,
    } = rows;

    let (order, mut columns_by_table) = group_columns(columns);

    let mut dropped_primary_key_columns = 0;
    let mut keys_by_table: HashMap<TableId, Vec<PrimaryKeyColumn>> = HashMap::new();
    for key_column in primary_keys {
        let id = key_column.table_id();
        if !columns_by_table.contains_key(&id) {
            debug!(table = %id, column = %key_column.column, "Dropping primary key column of unknown table");
            dropped_primary_key_columns += 1;
            continue;
        }
        keys_by_table.entry(id).or_default().push(key_column);
    }
    for key in keys_by_table.values_mut() {
        key.sort_by_key(|c| c.ordinal_position);
    }

    let mut dropped_foreign_key_edges = 0;
    let mut edges_by_table: HashMap<TableId, Vec<ForeignKeyEdge>> = HashMap::new();
    for edge in foreign_keys {
        let id = edge.source_table_id();
        if !columns_by_table.contains_key(&id) {
            debug!(
                table = %id,
                constraint = %edge.constraint_name,
                "Dropping foreign key of unknown table"
            );
            dropped_foreign_key_edges += 1;
            continue;
        }
        edges_by_table.entry(id).or_default().push(edge);
    }

    let tables: Vec<TableDescriptor> = order
        .into_iter()
        .map(|id| TableDescriptor {
            columns: columns_by_table.remove(&id).unwrap_or_default(),
            primary_key: keys_by_table.remove(&id).unwrap_or_default(),
            foreign_keys: edges_by_table.remove(&id).unwrap_or_default(),
            id,
        })
        .collect();

    let index = tables
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.clone(), i))
        .collect();

    RelationSet {
        tables,
        index,
        dropped_primary_key_columns,
        dropped_foreign_key_edges,
    }
}

fn group_columns(columns: Vec<ColumnDescriptor>) -> (Vec<TableId>, HashMap<TableId, Vec<ColumnDescriptor>>) {
    let mut order = Vec::new();
    let mut columns_by_table: HashMap<TableId, Vec<ColumnDescriptor>> = HashMap::new();

    for column in columns {
        let id = column.table_id();
        columns_by_table
            .entry(id.clone())
            .or_insert_with(|| {
                order.push(id);
                Vec::new()
            })
            .push(column);
    }

    (order, columns_by_table)
}
