//! Keyed record storage.

use std::collections::HashMap;

use crate::error::TableError;
use crate::record::Record;

/// One loaded table: records in source order plus a key index. Keys are
/// unique; insertion order is the order records enumerate and export in.
#[derive(Debug, Default)]
pub struct Table {
    name: String,
    rows: Vec<Record>,
    index: HashMap<String, usize>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a record at the end. The first record with a given key wins;
    /// a second insert with the same key is rejected.
    pub fn insert(&mut self, record: Record) -> Result<(), TableError> {
        if self.index.contains_key(record.key()) {
            return Err(TableError::DuplicateKey {
                key: record.key().to_string(),
            });
        }
        self.index.insert(record.key().to_string(), self.rows.len());
        self.rows.push(record);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.index.get(key).map(|&i| &self.rows[i])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Record> {
        self.index.get(key).map(|&i| &mut self.rows[i])
    }

    /// The record at an ordinal position, as addressed by resolved handles.
    pub fn at(&self, index: usize) -> Option<&Record> {
        self.rows.get(index)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.rows.iter()
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Record] {
        &mut self.rows
    }

    pub(crate) fn key_index(&self) -> &HashMap<String, usize> {
        &self.index
    }
}
