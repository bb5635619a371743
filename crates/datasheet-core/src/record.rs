//! Records, elements, and the handles that address them.

use serde::{Deserialize, Serialize};

use crate::descriptor::{RecordDef, StructDef};
use crate::value::StructValue;

/// Identifies a table slot inside a container. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId(pub u32);

/// A non-owning handle to one record: the table slot plus the record's
/// ordinal position. Valid only for the container that produced it; reloading
/// the container invalidates all previously resolved handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordHandle {
    pub table: TableId,
    pub index: u32,
}

/// One keyed logical row of a table: a body struct plus zero or more
/// elements. The key is immutable once the record is inserted into a table;
/// an element is identified only by its position in the array.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    key: String,
    body: StructValue,
    elements: Vec<StructValue>,
}

impl Record {
    pub fn new(def: &RecordDef, key: impl Into<String>) -> Self {
        Record {
            key: key.into(),
            body: StructValue::new(&def.body),
            elements: Vec::new(),
        }
    }

    /// A record with no key yet; the importer fills the key from the key
    /// column before the record is committed to a table.
    pub(crate) fn unkeyed(def: &RecordDef) -> Self {
        Record::new(def, "")
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn set_key(&mut self, key: String) {
        self.key = key;
    }

    pub fn body(&self) -> &StructValue {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut StructValue {
        &mut self.body
    }

    pub fn elements(&self) -> &[StructValue] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut Vec<StructValue> {
        &mut self.elements
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn push_element(&mut self, element: StructValue) {
        self.elements.push(element);
    }

    /// Grow the element array so `index` exists, then return it.
    pub(crate) fn ensure_element(&mut self, index: usize, shape: &StructDef) -> &mut StructValue {
        while self.elements.len() <= index {
            self.elements.push(StructValue::new(shape));
        }
        &mut self.elements[index]
    }
}
