//! File-based record storage for Campus.
//!
//! Each table is one JSON document, `<data_dir>/<table>.json`, holding a
//! flat array of objects indented with four spaces. Writes go through a
//! temp file + rename so a reader never sees a half-written table.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::config::Config;
use crate::error::{CampusError, Result};
use crate::storage::{RecordStore, Table};
use crate::util::read_to_string_limited;

/// JSON file record store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// Directory holding the table documents.
    data_dir: PathBuf,
    /// Directory receiving backups.
    backup_dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store from the resolved configuration paths.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_dirs(config.data_dir(), config.backup_dir())
    }

    /// Create a store with a custom data directory; backups go to
    /// `<data_dir>/backups`.
    pub fn with_dir(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        let backup_dir = data_dir.join("backups");
        Self::with_dirs(data_dir, backup_dir)
    }

    /// Create a store with custom data and backup directories.
    pub fn with_dirs(data_dir: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).map_err(|e| CampusError::storage(&data_dir, e))?;
        }

        Ok(Self {
            data_dir,
            backup_dir: backup_dir.into(),
        })
    }

    /// Path of a table document.
    pub fn table_path(&self, table: Table) -> PathBuf {
        self.data_dir.join(table.file_name())
    }

    fn temp_path(&self, table: Table) -> PathBuf {
        self.data_dir.join(format!(".{}.tmp", table.file_name()))
    }

    /// Pick a backup path that does not exist yet.
    fn next_backup_path(&self, table: Table) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let base = format!("backup_{}_{}", table.name(), stamp);

        let mut candidate = self.backup_dir.join(format!("{}.json", base));
        let mut n = 1;
        while candidate.exists() {
            candidate = self.backup_dir.join(format!("{}_{}.json", base, n));
            n += 1;
        }
        candidate
    }

    fn atomic_write(&self, table: Table, bytes: &[u8]) -> Result<()> {
        let final_path = self.table_path(table);
        let temp_path = self.temp_path(table);

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| CampusError::storage(&temp_path, e))?;
            file.write_all(bytes)
                .map_err(|e| CampusError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| CampusError::storage(&temp_path, e))?;
        }

        fs::rename(&temp_path, &final_path).map_err(|e| CampusError::storage(&final_path, e))?;

        Ok(())
    }
}

/// Serialize with four-space indentation.
fn to_pretty_json(document: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut ser)?;
    Ok(buf)
}

fn read_document(path: &Path) -> Result<Value> {
    let content = read_to_string_limited(path)?;
    Ok(serde_json::from_str(&content)?)
}

impl RecordStore for JsonFileStore {
    fn read_table(&self, table: Table) -> Result<Option<Value>> {
        let path = self.table_path(table);

        if !path.exists() {
            return Ok(None);
        }

        read_document(&path).map(Some)
    }

    fn write_table(&self, table: Table, document: Value) -> Result<()> {
        let bytes = to_pretty_json(&document)?;
        self.atomic_write(table, &bytes)
    }

    fn backup(&self, table: Table) -> Result<String> {
        let source = self.table_path(table);
        if !source.exists() {
            return Err(CampusError::storage(
                &source,
                io::Error::new(io::ErrorKind::NotFound, "nothing to back up"),
            ));
        }

        fs::create_dir_all(&self.backup_dir)
            .map_err(|e| CampusError::storage(&self.backup_dir, e))?;

        let target = self.next_backup_path(table);
        fs::copy(&source, &target).map_err(|e| CampusError::storage(&target, e))?;

        tracing::debug!(table = %table, backup = %target.display(), "table backed up");
        Ok(target.display().to_string())
    }
}
