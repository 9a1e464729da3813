//! Table output.
//!
//! The table is written as one pretty-printed JSON object mapping each
//! catalog name to its sorted raw-material list.

use crate::loader::{DataLoadError, deserialize_file};
use rawcraft_core::table::RawMaterialsTable;
use std::path::{Path, PathBuf};
use tracing::info;

/// Destination for a finished table.
pub trait TableSink {
    fn write_table(&mut self, table: &RawMaterialsTable) -> Result<(), DataLoadError>;
}

/// Writes the table as indented JSON to a file, creating parent directories.
#[derive(Debug, Clone)]
pub struct JsonTableWriter {
    path: PathBuf,
}

impl JsonTableWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSink for JsonTableWriter {
    fn write_table(&mut self, table: &RawMaterialsTable) -> Result<(), DataLoadError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(table).map_err(|e| DataLoadError::Parse {
            file: self.path.clone(),
            detail: e.to_string(),
        })?;
        std::fs::write(&self.path, text)?;
        info!(path = %self.path.display(), entries = table.len(), "table written");
        Ok(())
    }
}

/// In-memory sink, mostly for tests and piping.
impl TableSink for Vec<RawMaterialsTable> {
    fn write_table(&mut self, table: &RawMaterialsTable) -> Result<(), DataLoadError> {
        self.push(table.clone());
        Ok(())
    }
}

/// Read a previously written table. Format follows the file extension.
pub fn read_table(path: &Path) -> Result<RawMaterialsTable, DataLoadError> {
    deserialize_file(path)
}
