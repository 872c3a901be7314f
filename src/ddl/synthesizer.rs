use crate::ddl::type_renderer::render_type;
use crate::types::{ColumnDescriptor, ForeignKeyEdge, PrimaryKeyColumn, TableDescriptor, TableId};

/// Accumulates the body lines of one CREATE TABLE statement
pub struct CreateTableBuilder<'t> {
    table: &'t TableId,
    lines: Vec<String>,
}

impl<'t> CreateTableBuilder<'t> {
    pub fn new(table: &'t TableId) -> Self {
        Self {
            table,
            lines: Vec::new(),
        }
    }

    pub fn column(&mut self, column: &ColumnDescriptor) -> &mut Self {
        self.lines.push(render_column_line(column));
        self
    }

    /// Adds nothing when `key` is empty
    pub fn primary_key(&mut self, key: &[PrimaryKeyColumn]) -> &mut Self {
        if key.is_empty() {
            return self;
        }

        let columns = key
            .iter()
            .map(|c| c.column.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        self.lines.push(format!(
            "    CONSTRAINT PK_{} PRIMARY KEY ({})",
            self.table.table, columns
        ));
        self
    }

    pub fn foreign_key(&mut self, edge: &ForeignKeyEdge) -> &mut Self {
        self.lines.push(format!(
            "    CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}.{}({})",
            edge.constraint_name,
            edge.source_column,
            edge.referenced_schema,
            edge.referenced_table,
            edge.referenced_column
        ));
        self
    }

    pub fn build(&self) -> String {
        format!(
            "-- {table}\nCREATE TABLE {table} (\n{body}\n);\n",
            table = self.table,
            body = self.lines.join(",\n")
        )
    }
}

/// One column definition line, indented, without a trailing comma
pub fn render_column_line(column: &ColumnDescriptor) -> String {
    let nullability = if column.is_nullable { "NULL" } else { "NOT NULL" };
    let default = column
        .column_default
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| format!(" DEFAULT {}", d))
        .unwrap_or_default();

    format!(
        "    {} {} {}{}",
        column.column,
        render_type(column),
        nullability,
        default
    )
    .trim_end()
    .to_string()
}

/// Build the full statement block for a table: columns, then the primary
/// key, then one clause per foreign key edge.
pub fn render_create_table(table: &TableDescriptor) -> String {
    let mut builder = CreateTableBuilder::new(&table.id);

    for column in &table.columns {
        builder.column(column);
    }
    builder.primary_key(&table.primary_key);
    for edge in &table.foreign_keys {
        builder.foreign_key(edge);
    }

    builder.build()
}
