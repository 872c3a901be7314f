use crate::catalog::CatalogSource;
use crate::error::ExportResult;
use crate::exporter::write_atomically;
use crate::types::{CatalogRows, CatalogSnapshot, ColumnDescriptor, ForeignKeyEdge, PrimaryKeyColumn};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Catalog source replaying rows captured earlier with [`write_snapshot`]
pub struct SnapshotCatalog {
    snapshot: CatalogSnapshot,
}

impl SnapshotCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn load(path: &Path) -> ExportResult<Self> {
        Ok(Self::new(read_snapshot(path)?))
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }
}

impl CatalogSource for SnapshotCatalog {
    async fn read_columns(&self) -> ExportResult<Vec<ColumnDescriptor>> {
        Ok(self.snapshot.catalog.columns.clone())
    }

    async fn read_primary_keys(&self) -> ExportResult<Vec<PrimaryKeyColumn>> {
        Ok(self.snapshot.catalog.primary_keys.clone())
    }

    async fn read_foreign_keys(&self) -> ExportResult<Vec<ForeignKeyEdge>> {
        Ok(self.snapshot.catalog.foreign_keys.clone())
    }
}

pub fn read_snapshot(path: &Path) -> ExportResult<CatalogSnapshot> {
    let text = fs::read_to_string(path)?;
    let snapshot: CatalogSnapshot = serde_json::from_str(&text)?;

    info!(
        path = %path.display(),
        source = %snapshot.source,
        captured_at = %snapshot.captured_at,
        "Loaded catalog snapshot"
    );

    Ok(snapshot)
}

/// Write catalog rows as pretty JSON, stamped with the current time
pub fn write_snapshot(path: &Path, source: &str, catalog: CatalogRows) -> ExportResult<PathBuf> {
    let snapshot = CatalogSnapshot {
        captured_at: Utc::now(),
        source: source.to_string(),
        catalog,
    };
    let json = serde_json::to_string_pretty(&snapshot)?;

    write_atomically(path, &json)
}
