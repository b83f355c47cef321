//! Record store trait for Campus.
//!
//! A store keeps named tables, each a flat JSON array of records. Reads
//! are fail-soft: a missing, unreadable or malformed table loads as an
//! empty collection. Writes replace the whole table and propagate errors.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FailOpen, Result};

/// The named tables Campus persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Users,
    Courses,
    Accesses,
    Ratings,
}

impl Table {
    /// Stable table name, also the file stem on disk.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Users => "usuario",
            Self::Courses => "cursos",
            Self::Accesses => "acessos",
            Self::Ratings => "avaliacoes",
        }
    }

    /// File name of the table document.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.name())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait for table storage backends.
///
/// Implementations only move whole JSON documents; typed loading and
/// saving are provided on top.
pub trait RecordStore {
    /// Read the raw document of a table.
    ///
    /// Returns `Ok(None)` if the table has never been written.
    fn read_table(&self, table: Table) -> Result<Option<Value>>;

    /// Replace the document of a table.
    fn write_table(&self, table: Table, document: Value) -> Result<()>;

    /// Copy the current document of a table aside and return where it went.
    fn backup(&self, table: Table) -> Result<String>;

    /// Load all records of a table.
    ///
    /// Never fails: a table that cannot be read or is not a JSON array
    /// yields an empty collection. Rows that do not match `T` are skipped
    /// with a warning and left in place for [`save`](Self::save).
    fn load<T: DeserializeOwned>(&self, table: Table) -> Vec<T> {
        let (records, skipped) = self.load_rows::<T>(table);
        for (row, error) in &skipped {
            tracing::warn!(table = %table, error = %error, row = %row, "skipping unreadable row");
        }
        records
    }

    /// Replace all records of a table.
    ///
    /// Rows of the current document that do not match `T` are written back
    /// after `records`, unchanged.
    fn save<T: Serialize + DeserializeOwned>(&self, table: Table, records: &[T]) -> Result<()> {
        let mut rows = records
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<Value>, _>>()?;

        let (_, skipped) = self.load_rows::<T>(table);
        if !skipped.is_empty() {
            tracing::debug!(table = %table, kept = skipped.len(), "keeping unreadable rows");
        }
        rows.extend(skipped.into_iter().map(|(row, _)| row));

        tracing::debug!(table = %table, records = records.len(), "saving table");
        self.write_table(table, Value::Array(rows))
    }

    /// Split a table into the rows that decode as `T` and the ones that
    /// don't, with their decode errors.
    fn load_rows<T: DeserializeOwned>(&self, table: Table) -> (Vec<T>, Vec<(Value, String)>) {
        let context = format!("reading table '{}'", table);
        let Some(document) = self.read_table(table).fail_open_default(&context) else {
            return (Vec::new(), Vec::new());
        };

        let Value::Array(rows) = document else {
            tracing::warn!(table = %table, "table is not a JSON array, treating as empty");
            return (Vec::new(), Vec::new());
        };

        let mut records = Vec::with_capacity(rows.len());
        let mut skipped = Vec::new();
        for row in rows {
            match T::deserialize(&row) {
                Ok(record) => records.push(record),
                Err(e) => skipped.push((row, e.to_string())),
            }
        }
        (records, skipped)
    }
}

/// Shared contract tests run against every store implementation.
#[cfg(test)]
pub mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Row {
        pub nome: String,
        pub valor: u32,
    }

    pub fn rows() -> Vec<Row> {
        vec![
            Row {
                nome: "a".to_string(),
                valor: 1,
            },
            Row {
                nome: "b".to_string(),
                valor: 2,
            },
        ]
    }

    /// Verify load/save/backup semantics of a store.
    pub fn test_record_store_contract<S: RecordStore>(store: &S) {
        // Missing table loads empty
        assert!(store.read_table(Table::Courses).unwrap().is_none());
        assert!(store.load::<Row>(Table::Courses).is_empty());

        // Backup of a missing table is an error
        assert!(store.backup(Table::Courses).is_err());

        // Save then load keeps order
        store.save(Table::Courses, &rows()).unwrap();
        assert_eq!(store.load::<Row>(Table::Courses), rows());

        // Tables are independent
        assert!(store.load::<Row>(Table::Ratings).is_empty());

        // Save overwrites the whole table
        store.save(Table::Courses, &rows()[1..]).unwrap();
        assert_eq!(store.load::<Row>(Table::Courses), rows()[1..].to_vec());

        // Backup succeeds once the table exists
        let location = store.backup(Table::Courses).unwrap();
        assert!(location.contains("cursos"));

        // A document of the wrong shape loads empty
        store
            .write_table(Table::Users, serde_json::json!({"not": "an array"}))
            .unwrap();
        assert!(store.load::<Row>(Table::Users).is_empty());

        // One odd row neither hides nor loses its neighbours
        let odd = serde_json::json!({"nome": "c", "valor": -5});
        store
            .write_table(
                Table::Accesses,
                serde_json::json!([{"nome": "a", "valor": 1}, odd.clone(), {"nome": "b", "valor": 2}]),
            )
            .unwrap();
        assert_eq!(store.load::<Row>(Table::Accesses), rows());

        let mut grown = rows();
        grown.push(Row {
            nome: "d".to_string(),
            valor: 4,
        });
        store.save(Table::Accesses, &grown).unwrap();

        let document = store.read_table(Table::Accesses).unwrap().unwrap();
        let stored = document.as_array().unwrap();
        assert_eq!(stored.len(), 4);
        assert_eq!(stored[3], odd);
        assert_eq!(store.load::<Row>(Table::Accesses), grown);
    }

    #[test]
    fn test_table_names() {
        assert_eq!(Table::Users.name(), "usuario");
        assert_eq!(Table::Courses.name(), "cursos");
        assert_eq!(Table::Accesses.name(), "acessos");
        assert_eq!(Table::Ratings.name(), "avaliacoes");
        assert_eq!(Table::Ratings.file_name(), "avaliacoes.json");
        assert_eq!(Table::Accesses.to_string(), "acessos");
    }
}
