use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Character length the catalog reports for `varchar(max)` style columns
pub const UNBOUNDED_LENGTH: i32 = -1;

/// Identity of a table inside the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId {
    pub schema: String,
    pub table: String,
}

impl TableId {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// One column of a base table, as reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Schema owning the table
    pub schema: String,
    /// Table name
    pub table: String,
    /// Column name
    pub column: String,
    /// Raw data type name (e.g. `nvarchar`, `numeric`)
    pub data_type: String,
    /// Character maximum length, `-1` when unbounded
    pub character_maximum_length: Option<i32>,
    /// Numeric precision
    pub numeric_precision: Option<i32>,
    /// Numeric scale
    pub numeric_scale: Option<i32>,
    /// Whether the column accepts NULL
    pub is_nullable: bool,
    /// Raw default expression, dialect specific
    pub column_default: Option<String>,
}

impl ColumnDescriptor {
    pub fn table_id(&self) -> TableId {
        TableId::new(&self.schema, &self.table)
    }
}

/// Membership of a column in a table's primary key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyColumn {
    pub schema: String,
    pub table: String,
    pub column: String,
    /// 1-based position inside the key
    pub ordinal_position: i32,
}

impl PrimaryKeyColumn {
    pub fn table_id(&self) -> TableId {
        TableId::new(&self.schema, &self.table)
    }
}

/// A single column pair of a foreign key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyEdge {
    pub constraint_name: String,
    pub source_schema: String,
    pub source_table: String,
    pub source_column: String,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

impl ForeignKeyEdge {
    pub fn source_table_id(&self) -> TableId {
        TableId::new(&self.source_schema, &self.source_table)
    }

    pub fn referenced_table_id(&self) -> TableId {
        TableId::new(&self.referenced_schema, &self.referenced_table)
    }
}

/// A base table with everything needed to rebuild its CREATE TABLE statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub id: TableId,
    /// Columns in catalog order
    pub columns: Vec<ColumnDescriptor>,
    /// Primary key columns sorted by ordinal position, empty when the table has none
    pub primary_key: Vec<PrimaryKeyColumn>,
    /// Foreign key edges in catalog order
    pub foreign_keys: Vec<ForeignKeyEdge>,
}

impl TableDescriptor {
    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }
}

/// The three flat row sets returned by the catalog queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRows {
    pub columns: Vec<ColumnDescriptor>,
    pub primary_keys: Vec<PrimaryKeyColumn>,
    pub foreign_keys: Vec<ForeignKeyEdge>,
}

impl CatalogRows {
    pub fn row_count(&self) -> usize {
        self.columns.len() + self.primary_keys.len() + self.foreign_keys.len()
    }
}

/// Catalog rows captured from a live database, persisted as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// When the rows were read
    pub captured_at: DateTime<Utc>,
    /// Where the rows were read from (host/database, never credentials)
    pub source: String,
    pub catalog: CatalogRows,
}
