// Catalog reader: the three metadata queries behind a common seam
pub mod postgres;
pub mod snapshot;


pub use postgres::{fetch_catalog, fetch_server_version, PostgresCatalog};
pub use snapshot::{read_snapshot, write_snapshot, SnapshotCatalog};

use crate::error::ExportResult;
use crate::monitoring::OperationTracker;
use crate::types::{CatalogRows, ColumnDescriptor, ForeignKeyEdge, PrimaryKeyColumn};

/// Anything that can answer the three catalog queries.
///
/// Each method returns rows in the order the export depends on:
/// columns by (schema, table, ordinal position), primary key members by
/// (schema, table, key ordinal) and foreign key edges by
/// (source schema, source table, constraint name).
pub trait CatalogSource {
    async fn read_columns(&self) -> ExportResult<Vec<ColumnDescriptor>>;
    async fn read_primary_keys(&self) -> ExportResult<Vec<PrimaryKeyColumn>>;
    async fn read_foreign_keys(&self) -> ExportResult<Vec<ForeignKeyEdge>>;
}

/// Run the three catalog queries one after another.
///
/// The first failure aborts the read; nothing partial is returned.
pub async fn read_catalog<S: CatalogSource>(source: &S) -> ExportResult<CatalogRows> {
    let tracker = OperationTracker::start("read_catalog");

    let result = async {
        let columns = source.read_columns().await?;
        tracker.add_metadata("columns", columns.len());

        let primary_keys = source.read_primary_keys().await?;
        tracker.add_metadata("primary_key_columns", primary_keys.len());

        let foreign_keys = source.read_foreign_keys().await?;
        tracker.add_metadata("foreign_key_edges", foreign_keys.len());

        Ok(CatalogRows {
            columns,
            primary_keys,
            foreign_keys,
        })
    }
    .await;

    match &result {
        Ok(rows) => tracker.complete_success(rows.row_count()),
        Err(e) => tracker.complete_failure(e),
    };

    result
}
