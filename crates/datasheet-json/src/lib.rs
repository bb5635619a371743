//! JSON documents for datasheet tables.
//!
//! One JSON text is one sheet: an array of record objects. Unlike the grid
//! formats there is no column flattening; structs and dictionaries are
//! objects, lists and element arrays are arrays, and the element array
//! appears under the record type's element field name.

use std::collections::HashMap;

use serde_json::{Map, Value as Json};

use datasheet_core::config;
use datasheet_core::convert::{DefaultConverter, ValueConverter};
use datasheet_core::descriptor::{NodeDef, ScalarKind, StructDef};
use datasheet_core::diag::{Diagnostics, Scope};
use datasheet_core::error::{PageError, TableError};
use datasheet_core::export::SheetExporter;
use datasheet_core::import::SheetImporter;
use datasheet_core::record::Record;
use datasheet_core::schema::Schema;
use datasheet_core::table::Table;
use datasheet_core::value::{RefValue, StructValue, Value};

/// Named JSON texts acting as both importer and exporter.
pub struct JsonSheets {
    texts: HashMap<String, String>,
    converter: Box<dyn ValueConverter>,
}

impl Default for JsonSheets {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSheets {
    pub fn new() -> Self {
        JsonSheets {
            texts: HashMap::new(),
            converter: Box::new(DefaultConverter::utc()),
        }
    }

    pub fn with_converter(converter: Box<dyn ValueConverter>) -> Self {
        JsonSheets {
            texts: HashMap::new(),
            converter,
        }
    }

    pub fn insert(&mut self, sheet: impl Into<String>, text: impl Into<String>) {
        self.texts.insert(sheet.into(), text.into());
    }

    /// The stored JSON for a sheet.
    pub fn json(&self, sheet: &str) -> Option<&str> {
        self.texts.get(sheet).map(String::as_str)
    }
}

// ============================================================================
// Import
// ============================================================================

impl SheetImporter for JsonSheets {
    fn import(
        &self,
        sheet: &str,
        schema: &Schema,
        diag: &mut Diagnostics,
    ) -> Result<Option<Table>, PageError> {
        let Some(text) = self.texts.get(sheet) else {
            return Ok(None);
        };

        let malformed = |diag: &mut Diagnostics| {
            diag.warning(
                Scope::table(sheet),
                &TableError::MalformedSource {
                    sheet: sheet.to_string(),
                },
            );
        };
        let rows = match serde_json::from_str::<Json>(text) {
            Ok(Json::Array(rows)) => rows,
            Ok(_) | Err(_) => {
                malformed(diag);
                return Ok(None);
            }
        };

        let mut table = Table::new(sheet);
        for row in &rows {
            let Some(object) = row.as_object() else {
                malformed(diag);
                continue;
            };
            if let Some(record) = self.read_record(sheet, schema, object, diag) {
                let key = record.key().to_string();
                if let Err(err) = table.insert(record) {
                    diag.error(Scope::table(sheet).with_record(key), &err);
                }
            }
        }
        Ok(Some(table))
    }
}

impl JsonSheets {
    fn read_record(
        &self,
        sheet: &str,
        schema: &Schema,
        object: &Map<String, Json>,
        diag: &mut Diagnostics,
    ) -> Option<Record> {
        let id_text = object
            .get(config::KEY_COLUMN)
            .map(json_text)
            .unwrap_or_default();
        let key = match self.converter.parse(schema.key_kind(), &id_text) {
            Ok(parsed) => self.converter.format(&parsed),
            Err(err) => {
                diag.error(Scope::table(sheet).with_column(config::KEY_COLUMN), &err);
                return None;
            }
        };
        // A record without a key cannot be addressed; drop it.
        if key.is_empty() {
            diag.error(
                Scope::table(sheet).with_column(config::KEY_COLUMN),
                &TableError::Conversion {
                    text: id_text,
                    kind: "record key".to_string(),
                },
            );
            return None;
        }

        let def = schema.def();
        let scope = Scope::table(sheet).with_record(key.as_str());
        let mut record = Record::new(def, key);
        self.read_struct(&def.body, object, record.body_mut(), scope.clone(), diag);

        if let Some(elements) = &def.elements {
            if let Some(Json::Array(entries)) = object.get(&elements.field) {
                for (at, entry) in entries.iter().enumerate() {
                    let scope = scope.clone().with_element(at);
                    let mut element = StructValue::new(&elements.shape);
                    match entry.as_object() {
                        Some(entry) => {
                            self.read_struct(&elements.shape, entry, &mut element, scope, diag);
                        }
                        None => diag.error(
                            scope,
                            &TableError::Conversion {
                                text: json_text(entry),
                                kind: "object".to_string(),
                            },
                        ),
                    }
                    record.push_element(element);
                }
            }
        }
        Some(record)
    }

    fn read_struct(
        &self,
        def: &StructDef,
        object: &Map<String, Json>,
        value: &mut StructValue,
        scope: Scope,
        diag: &mut Diagnostics,
    ) {
        for (at, field) in def.fields.iter().enumerate() {
            let Some(json) = object.get(&field.name) else {
                continue;
            };
            match self.read_node(&field.node, json) {
                Ok(decoded) => *value.slot_mut(at) = decoded,
                Err(err) => {
                    diag.error(scope.clone().with_column(field.name.as_str()), &err);
                }
            }
        }
    }

    fn read_node(&self, node: &NodeDef, json: &Json) -> Result<Value, TableError> {
        if json.is_null() {
            return Ok(Value::Null);
        }
        let mismatch = |kind: &str| TableError::Conversion {
            text: json_text(json),
            kind: kind.to_string(),
        };
        match node {
            NodeDef::Scalar(kind) => self.read_scalar(kind, json),
            NodeDef::Ref { .. } => match json {
                Json::String(key) => Ok(Value::Ref(RefValue::new(key.clone()))),
                _ => Err(mismatch("reference key")),
            },
            NodeDef::Struct(def) => {
                let object = json.as_object().ok_or_else(|| mismatch("object"))?;
                let mut value = StructValue::new(def);
                for (at, field) in def.fields.iter().enumerate() {
                    if let Some(json) = object.get(&field.name) {
                        *value.slot_mut(at) = self.read_node(&field.node, json)?;
                    }
                }
                Ok(Value::Struct(value))
            }
            NodeDef::List(elem) => {
                let items = json.as_array().ok_or_else(|| mismatch("array"))?;
                items
                    .iter()
                    .map(|item| self.read_node(elem, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }
            NodeDef::Dict(elem) => {
                let object = json.as_object().ok_or_else(|| mismatch("object"))?;
                let mut entries = Vec::with_capacity(object.len());
                for (key, item) in object {
                    entries.push((key.clone(), self.read_node(elem, item)?));
                }
                Ok(Value::Dict(entries))
            }
        }
    }

    fn read_scalar(&self, kind: &ScalarKind, json: &Json) -> Result<Value, TableError> {
        let mismatch = || TableError::Conversion {
            text: json_text(json),
            kind: kind.describe(),
        };
        match kind {
            ScalarKind::Int => json.as_i64().map(Value::Int).ok_or_else(mismatch),
            ScalarKind::Float => json.as_f64().map(Value::Float).ok_or_else(mismatch),
            ScalarKind::Bool => json.as_bool().map(Value::Bool).ok_or_else(mismatch),
            // Strings, enums, and date-times share the text conversion rules.
            ScalarKind::Str | ScalarKind::Enum(_) | ScalarKind::DateTime => match json {
                Json::String(text) => self.converter.parse(kind, text),
                _ => Err(mismatch()),
            },
        }
    }
}

/// The cell-like text of a JSON leaf, for key parsing and error messages.
fn json_text(json: &Json) -> String {
    match json {
        Json::Null => String::new(),
        Json::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Export
// ============================================================================

impl SheetExporter for JsonSheets {
    fn export(
        &mut self,
        sheet: &str,
        schema: &Schema,
        table: &Table,
        _diag: &mut Diagnostics,
    ) -> Result<(), PageError> {
        let def = schema.def();
        let mut rows = Vec::with_capacity(table.len());
        for record in table.iter() {
            let mut object = Map::new();
            object.insert(
                config::KEY_COLUMN.to_string(),
                Json::String(record.key().to_string()),
            );
            self.write_struct(&def.body, record.body(), &mut object);

            if let Some(elements) = &def.elements {
                let entries: Vec<Json> = record
                    .elements()
                    .iter()
                    .map(|element| {
                        let mut entry = Map::new();
                        self.write_struct(&elements.shape, element, &mut entry);
                        Json::Object(entry)
                    })
                    .collect();
                object.insert(elements.field.clone(), Json::Array(entries));
            }
            rows.push(Json::Object(object));
        }

        let text = serde_json::to_string(&Json::Array(rows))
            .map_err(|err| PageError::Parse {
                detail: err.to_string(),
            })?;
        self.texts.insert(sheet.to_string(), text);
        Ok(())
    }
}

impl JsonSheets {
    fn write_struct(&self, def: &StructDef, value: &StructValue, object: &mut Map<String, Json>) {
        for (at, field) in def.fields.iter().enumerate() {
            let slot = value.slot(at);
            if slot.is_null() {
                continue;
            }
            object.insert(field.name.clone(), self.write_node(&field.node, slot));
        }
    }

    fn write_node(&self, node: &NodeDef, value: &Value) -> Json {
        match (node, value) {
            (NodeDef::Scalar(_), value) => self.write_scalar(value),
            (NodeDef::Ref { .. }, Value::Ref(reference)) => {
                if reference.is_empty() {
                    Json::Null
                } else {
                    Json::String(reference.key.clone())
                }
            }
            (NodeDef::Struct(def), Value::Struct(inner)) => {
                let mut object = Map::new();
                self.write_struct(def, inner, &mut object);
                Json::Object(object)
            }
            (NodeDef::List(elem), Value::List(items)) => Json::Array(
                items
                    .iter()
                    .map(|item| {
                        if item.is_null() {
                            Json::Null
                        } else {
                            self.write_node(elem, item)
                        }
                    })
                    .collect(),
            ),
            (NodeDef::Dict(elem), Value::Dict(entries)) => {
                let mut object = Map::new();
                for (key, item) in entries {
                    object.insert(key.clone(), self.write_node(elem, item));
                }
                Json::Object(object)
            }
            _ => Json::Null,
        }
    }

    fn write_scalar(&self, value: &Value) -> Json {
        match value {
            Value::Int(v) => Json::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Bool(v) => Json::Bool(*v),
            Value::Str(_) | Value::Enum(_) | Value::DateTime(_) => {
                Json::String(self.converter.format(value))
            }
            _ => Json::Null,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
