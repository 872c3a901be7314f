use crate::catalog::{read_catalog, CatalogSource, PostgresCatalog};
use crate::ddl::{build_relations, render_create_table, RelationSet};
use crate::error::ExportResult;
use crate::monitoring::OperationTracker;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Default location of the exported script, relative to the working directory
pub const DEFAULT_OUTPUT_PATH: &str = "database/schema.export.sql";

/// What a finished export produced
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Absolute path of the written script
    pub output_path: PathBuf,
    pub table_count: usize,
    pub bytes_written: usize,
    pub dropped_primary_key_columns: usize,
    pub dropped_foreign_key_edges: usize,
}

/// Concatenate the statement block of every table, in relation order
pub fn render_schema(relations: &RelationSet) -> String {
    relations
        .tables()
        .iter()
        .map(render_create_table)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace `path` with `contents` in one step.
///
/// The text is written to a temporary file next to the target and renamed
/// over it, so readers see either the old file or the complete new one.
/// Returns the absolute path of the written file.
pub fn write_atomically(path: &Path, contents: &str) -> ExportResult<PathBuf> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut file = NamedTempFile::new_in(&parent)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path)?;

    Ok(fs::canonicalize(path)?)
}

/// Read the catalog from `source`, rebuild every CREATE TABLE statement and
/// write the script to `output`.
pub async fn run_export<S: CatalogSource>(source: &S, output: &Path) -> ExportResult<ExportSummary> {
    let rows = read_catalog(source).await?;

    let tracker = OperationTracker::start("render_schema");
    let relations = build_relations(rows);
    tracker.add_metadata("tables", relations.len());
    tracker.add_metadata("dropped_primary_key_columns", relations.dropped_primary_key_columns());
    tracker.add_metadata("dropped_foreign_key_edges", relations.dropped_foreign_key_edges());
    let script = render_schema(&relations);
    tracker.complete_success(relations.len());

    let tracker = OperationTracker::start("write_script");
    let output_path = match write_atomically(output, &script) {
        Ok(path) => {
            tracker.complete_success(script.len());
            path
        }
        Err(e) => {
            tracker.complete_failure(&e);
            return Err(e);
        }
    };

    info!(
        path = %output_path.display(),
        tables = relations.len(),
        bytes = script.len(),
        "Schema script written"
    );

    Ok(ExportSummary {
        output_path,
        table_count: relations.len(),
        bytes_written: script.len(),
        dropped_primary_key_columns: relations.dropped_primary_key_columns(),
        dropped_foreign_key_edges: relations.dropped_foreign_key_edges(),
    })
}

/// Export straight from a live database, closing the connection on every path
pub async fn export_database(connection_string: &str, output: &Path) -> ExportResult<ExportSummary> {
    let catalog = PostgresCatalog::connect(connection_string).await?;
    let result = run_export(&catalog, output).await;
    catalog.finish(result).await
}
