//! Table storage for Campus.
//!
//! This module provides the record store abstraction over named JSON
//! tables, with file-based and in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::JsonFileStore;
pub use memory::MemoryRecordStore;
pub use traits::{RecordStore, Table};
