//! Instance values for record fields.
//!
//! Records are value trees shaped by their [`crate::descriptor::RecordDef`].
//! [`Value::Null`] means "leaf not present": it enumerates no column path and
//! exports as a blank cell.

use chrono::{DateTime, Utc};

use crate::descriptor::StructDef;
use crate::record::RecordHandle;

/// One value slot inside a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Stored as a UTC instant; the converter's configured offset only
    /// applies at the text boundary.
    DateTime(DateTime<Utc>),
    /// A validated variant name of the field's enum definition.
    Enum(String),
    Ref(RefValue),
    List(Vec<Value>),
    /// Entries in first-seen key order.
    Dict(Vec<(String, Value)>),
    Struct(StructValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_ref_value(&self) -> Option<&RefValue> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }
}

/// A weak cross-table reference: a foreign key plus a lazily resolved,
/// non-owning handle. The handle starts absent and is written only by the
/// container's resolution pass; it is invalidated by reloading the container.
#[derive(Debug, Clone, PartialEq)]
pub struct RefValue {
    pub key: String,
    pub target: Option<RecordHandle>,
}

impl RefValue {
    pub fn new(key: impl Into<String>) -> Self {
        RefValue {
            key: key.into(),
            target: None,
        }
    }

    /// A null/empty key resolves to an absent handle without error.
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

/// A struct instance: one slot per declared field, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    slots: Vec<Value>,
}

impl StructValue {
    /// A fresh instance with every slot not present.
    pub fn new(def: &StructDef) -> Self {
        StructValue {
            slots: vec![Value::Null; def.fields.len()],
        }
    }

    pub fn slot(&self, index: usize) -> &Value {
        &self.slots[index]
    }

    pub fn slot_mut(&mut self, index: usize) -> &mut Value {
        &mut self.slots[index]
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Convenience lookup by field name.
    pub fn get<'a>(&'a self, def: &StructDef, name: &str) -> Option<&'a Value> {
        def.position(name).map(|i| self.slot(i))
    }

    /// Convenience write by field name. Returns false if the field does not
    /// exist on the definition.
    pub fn set(&mut self, def: &StructDef, name: &str, value: Value) -> bool {
        match def.position(name) {
            Some(i) => {
                self.slots[i] = value;
                true
            }
            None => false,
        }
    }
}
