//! In-memory record storage for testing.

use std::collections::HashMap;
use std::io;
use std::sync::RwLock;

use serde_json::Value;

use crate::error::{CampusError, Result};
use crate::storage::{RecordStore, Table};

/// In-memory record store.
///
/// Documents are kept as JSON values, so typed loads go through the same
/// (de)serialization path as the file store. Writes can be switched off
/// to exercise error propagation.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: RwLock<HashMap<Table, Value>>,
    backups: RwLock<Vec<(String, Value)>>,
    read_only: RwLock<bool>,
}

impl MemoryRecordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a storage error.
    pub fn set_read_only(&self, read_only: bool) {
        *self.read_only.write().unwrap() = read_only;
    }

    /// Number of backups taken so far.
    pub fn backup_count(&self) -> usize {
        self.backups.read().unwrap().len()
    }

    /// Document captured by a backup, by location.
    pub fn backup_document(&self, location: &str) -> Option<Value> {
        self.backups
            .read()
            .unwrap()
            .iter()
            .find(|(name, _)| name == location)
            .map(|(_, doc)| doc.clone())
    }
}

impl RecordStore for MemoryRecordStore {
    fn read_table(&self, table: Table) -> Result<Option<Value>> {
        Ok(self.tables.read().unwrap().get(&table).cloned())
    }

    fn write_table(&self, table: Table, document: Value) -> Result<()> {
        if *self.read_only.read().unwrap() {
            return Err(CampusError::storage(
                format!("memory://{}", table),
                io::Error::new(io::ErrorKind::PermissionDenied, "store is read-only"),
            ));
        }
        self.tables.write().unwrap().insert(table, document);
        Ok(())
    }

    fn backup(&self, table: Table) -> Result<String> {
        let document = self.read_table(table)?.ok_or_else(|| {
            CampusError::storage(
                format!("memory://{}", table),
                io::Error::new(io::ErrorKind::NotFound, "nothing to back up"),
            )
        })?;

        let mut backups = self.backups.write().unwrap();
        let location = format!("memory://backup_{}_{}", table.name(), backups.len() + 1);
        backups.push((location.clone(), document));
        Ok(location)
    }
}
