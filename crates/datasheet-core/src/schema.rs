//! Compiled record schemas.
//!
//! A [`Schema`] is a [`RecordDef`] compiled once per table: every struct level
//! gets a field-name index so that binding a column path to a record slot is
//! hash lookups and integer indexing, not repeated linear scans. The schema
//! owns the two path-shaped operations the codecs share: `bind` (column path +
//! cell text into a record) and `enumerate` (record back out to column paths).

use std::collections::HashMap;
use std::sync::Arc;

use crate::config;
use crate::convert::ValueConverter;
use crate::descriptor::{NodeDef, RecordDef, ScalarKind, StructDef};
use crate::error::TableError;
use crate::record::Record;
use crate::value::{RefValue, StructValue, Value};

// ============================================================================
// Compiled shapes
// ============================================================================

/// Compiled form of one [`NodeDef`].
#[derive(Debug)]
enum CompiledNode {
    Scalar(ScalarKind),
    Ref { target: String },
    Struct(Box<CompiledStruct>),
    List(Box<CompiledNode>),
    Dict(Box<CompiledNode>),
}

/// Compiled form of one [`StructDef`]: the definition, a name index, and the
/// compiled node per field in declaration order.
#[derive(Debug)]
struct CompiledStruct {
    def: Arc<StructDef>,
    index: HashMap<String, usize>,
    nodes: Vec<CompiledNode>,
}

fn compile_node(node: &NodeDef) -> CompiledNode {
    match node {
        NodeDef::Scalar(kind) => CompiledNode::Scalar(kind.clone()),
        NodeDef::Ref { target } => CompiledNode::Ref {
            target: target.clone(),
        },
        NodeDef::Struct(def) => CompiledNode::Struct(Box::new(compile_struct(def))),
        NodeDef::List(elem) => CompiledNode::List(Box::new(compile_node(elem))),
        NodeDef::Dict(elem) => CompiledNode::Dict(Box::new(compile_node(elem))),
    }
}

fn compile_struct(def: &Arc<StructDef>) -> CompiledStruct {
    CompiledStruct {
        def: def.clone(),
        index: def
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect(),
        nodes: def.fields.iter().map(|f| compile_node(&f.node)).collect(),
    }
}

// ============================================================================
// Schema
// ============================================================================

/// A record type compiled for one table.
#[derive(Debug)]
pub struct Schema {
    def: Arc<RecordDef>,
    body: CompiledStruct,
    elements: Option<CompiledStruct>,
}

impl Schema {
    pub fn compile(def: Arc<RecordDef>) -> Self {
        let body = compile_struct(&def.body);
        let elements = def.elements.as_ref().map(|e| compile_struct(&e.shape));
        Schema {
            def,
            body,
            elements,
        }
    }

    pub fn def(&self) -> &RecordDef {
        &self.def
    }

    pub fn key_kind(&self) -> &ScalarKind {
        &self.def.key
    }

    pub fn has_elements(&self) -> bool {
        self.elements.is_some()
    }

    /// The document field name of the element array, if the type has one.
    pub fn element_field(&self) -> Option<&str> {
        self.def.elements.as_ref().map(|e| e.field.as_str())
    }

    // ------------------------------------------------------------------
    // Binding (grid -> record)
    // ------------------------------------------------------------------

    /// Bind one cell into a record. `path` is the full column path; the key
    /// column sets the record key, body columns write into the body struct,
    /// element columns write into the element at `elem_row`.
    pub fn bind(
        &self,
        record: &mut Record,
        elem_row: usize,
        path: &str,
        text: &str,
        converter: &dyn ValueConverter,
    ) -> Result<(), TableError> {
        if path == config::KEY_COLUMN {
            let parsed = converter.parse(&self.def.key, text)?;
            record.set_key(converter.format(&parsed));
            return Ok(());
        }

        let segments: Vec<&str> = path.split(config::PATH_DELIMITER).collect();
        let head = segments[0];

        if let Some(&slot) = self.body.index.get(head) {
            return bind_node(
                &self.body.nodes[slot],
                record.body_mut().slot_mut(slot),
                &segments[1..],
                path,
                text,
                converter,
            );
        }

        if let Some(elements) = &self.elements {
            if let Some(&slot) = elements.index.get(head) {
                let element = record.ensure_element(elem_row, &elements.def);
                return bind_node(
                    &elements.nodes[slot],
                    element.slot_mut(slot),
                    &segments[1..],
                    path,
                    text,
                    converter,
                );
            }
        }

        Err(TableError::UnknownColumn {
            path: path.to_string(),
        })
    }

    // ------------------------------------------------------------------
    // Enumeration (record -> grid)
    // ------------------------------------------------------------------

    /// Column paths and values present on the record body, in declaration
    /// order. Not-present leaves are skipped entirely.
    pub fn enumerate_body<'a>(&'a self, record: &'a Record) -> Vec<(String, &'a Value)> {
        let mut out = Vec::new();
        enumerate_struct(&self.body, record.body(), "", &mut out);
        out
    }

    /// Column paths and values present on one element.
    pub fn enumerate_element<'a>(&'a self, element: &'a StructValue) -> Vec<(String, &'a Value)> {
        let mut out = Vec::new();
        if let Some(elements) = &self.elements {
            enumerate_struct(elements, element, "", &mut out);
        }
        out
    }

    // ------------------------------------------------------------------
    // Leaf traversal
    // ------------------------------------------------------------------

    /// Visit every present leaf of a record, body first, then each element in
    /// order. The leaf carries the nearest field annotation, propagated
    /// through lists and dictionaries but not across struct boundaries.
    pub fn visit_leaves<'a>(&'a self, record: &'a Record, visit: &mut dyn FnMut(Leaf<'a>)) {
        visit_struct(&self.body, record.body(), None, "", visit);
        if let Some(elements) = &self.elements {
            for (i, element) in record.elements().iter().enumerate() {
                visit_struct(elements, element, Some(i), "", visit);
            }
        }
    }

    /// Visit every reference slot of a record mutably, with its target table
    /// name. Used by the container's resolution pass.
    pub(crate) fn visit_refs_mut(
        &self,
        record: &mut Record,
        visit: &mut dyn FnMut(&str, &mut RefValue),
    ) {
        visit_refs_struct(&self.body, record.body_mut(), visit);
        if let Some(elements) = &self.elements {
            for element in record.elements_mut() {
                visit_refs_struct(elements, element, visit);
            }
        }
    }
}

/// One present leaf of a record, as seen by [`Schema::visit_leaves`].
pub struct Leaf<'a> {
    /// Element index, or `None` for body leaves.
    pub element: Option<usize>,
    pub path: String,
    pub annotation: Option<&'a str>,
    pub kind: LeafKind<'a>,
    pub value: &'a Value,
}

/// What kind of leaf slot a [`Leaf`] is.
pub enum LeafKind<'a> {
    Scalar(&'a ScalarKind),
    Ref { target: &'a str },
}

// ============================================================================
// Walkers
// ============================================================================

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}{}{segment}", config::PATH_DELIMITER)
    }
}

fn bind_node(
    node: &CompiledNode,
    slot: &mut Value,
    rest: &[&str],
    path: &str,
    text: &str,
    converter: &dyn ValueConverter,
) -> Result<(), TableError> {
    let unknown = || TableError::UnknownColumn {
        path: path.to_string(),
    };
    match node {
        CompiledNode::Scalar(kind) => {
            if !rest.is_empty() {
                return Err(unknown());
            }
            *slot = converter.parse(kind, text)?;
            Ok(())
        }
        CompiledNode::Ref { .. } => {
            if !rest.is_empty() {
                return Err(unknown());
            }
            *slot = Value::Ref(RefValue::new(text));
            Ok(())
        }
        CompiledNode::Struct(inner) => {
            let (name, tail) = rest.split_first().ok_or_else(&unknown)?;
            let field = *inner.index.get(*name).ok_or_else(&unknown)?;
            if slot.is_null() {
                *slot = Value::Struct(StructValue::new(&inner.def));
            }
            match slot {
                Value::Struct(value) => bind_node(
                    &inner.nodes[field],
                    value.slot_mut(field),
                    tail,
                    path,
                    text,
                    converter,
                ),
                _ => Err(unknown()),
            }
        }
        CompiledNode::List(elem) => {
            let (segment, tail) = rest.split_first().ok_or_else(&unknown)?;
            // List positions are 1-based in column paths.
            let position = segment
                .parse::<usize>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(&unknown)?;
            if slot.is_null() {
                *slot = Value::List(Vec::new());
            }
            match slot {
                Value::List(items) => {
                    while items.len() < position {
                        items.push(Value::Null);
                    }
                    bind_node(elem, &mut items[position - 1], tail, path, text, converter)
                }
                _ => Err(unknown()),
            }
        }
        CompiledNode::Dict(elem) => {
            let (key, tail) = rest.split_first().ok_or_else(&unknown)?;
            if slot.is_null() {
                *slot = Value::Dict(Vec::new());
            }
            match slot {
                Value::Dict(entries) => {
                    let at = match entries.iter().position(|(k, _)| k == key) {
                        Some(at) => at,
                        None => {
                            entries.push((key.to_string(), Value::Null));
                            entries.len() - 1
                        }
                    };
                    bind_node(elem, &mut entries[at].1, tail, path, text, converter)
                }
                _ => Err(unknown()),
            }
        }
    }
}

fn enumerate_struct<'a>(
    compiled: &CompiledStruct,
    value: &'a StructValue,
    prefix: &str,
    out: &mut Vec<(String, &'a Value)>,
) {
    for (i, field) in compiled.def.fields.iter().enumerate() {
        enumerate_node(
            &compiled.nodes[i],
            value.slot(i),
            &join(prefix, &field.name),
            out,
        );
    }
}

fn enumerate_node<'a>(
    node: &CompiledNode,
    value: &'a Value,
    path: &str,
    out: &mut Vec<(String, &'a Value)>,
) {
    if value.is_null() {
        return;
    }
    match node {
        CompiledNode::Scalar(_) | CompiledNode::Ref { .. } => {
            out.push((path.to_string(), value));
        }
        CompiledNode::Struct(inner) => {
            if let Value::Struct(value) = value {
                enumerate_struct(inner, value, path, out);
            }
        }
        CompiledNode::List(elem) => {
            if let Value::List(items) = value {
                for (i, item) in items.iter().enumerate() {
                    enumerate_node(elem, item, &join(path, &(i + 1).to_string()), out);
                }
            }
        }
        CompiledNode::Dict(elem) => {
            if let Value::Dict(entries) = value {
                for (key, item) in entries {
                    enumerate_node(elem, item, &join(path, key), out);
                }
            }
        }
    }
}

fn visit_struct<'a>(
    compiled: &'a CompiledStruct,
    value: &'a StructValue,
    element: Option<usize>,
    prefix: &str,
    visit: &mut dyn FnMut(Leaf<'a>),
) {
    for (i, field) in compiled.def.fields.iter().enumerate() {
        visit_node(
            &compiled.nodes[i],
            value.slot(i),
            element,
            &join(prefix, &field.name),
            field.annotation.as_deref(),
            visit,
        );
    }
}

fn visit_node<'a>(
    node: &'a CompiledNode,
    value: &'a Value,
    element: Option<usize>,
    path: &str,
    annotation: Option<&'a str>,
    visit: &mut dyn FnMut(Leaf<'a>),
) {
    if value.is_null() {
        return;
    }
    match node {
        CompiledNode::Scalar(kind) => visit(Leaf {
            element,
            path: path.to_string(),
            annotation,
            kind: LeafKind::Scalar(kind),
            value,
        }),
        CompiledNode::Ref { target } => visit(Leaf {
            element,
            path: path.to_string(),
            annotation,
            kind: LeafKind::Ref { target },
            value,
        }),
        CompiledNode::Struct(inner) => {
            // Struct interiors carry their own field annotations.
            if let Value::Struct(value) = value {
                visit_struct(inner, value, element, path, visit);
            }
        }
        CompiledNode::List(elem) => {
            if let Value::List(items) = value {
                for (i, item) in items.iter().enumerate() {
                    visit_node(
                        elem,
                        item,
                        element,
                        &join(path, &(i + 1).to_string()),
                        annotation,
                        visit,
                    );
                }
            }
        }
        CompiledNode::Dict(elem) => {
            if let Value::Dict(entries) = value {
                for (key, item) in entries {
                    visit_node(elem, item, element, &join(path, key), annotation, visit);
                }
            }
        }
    }
}

fn visit_refs_struct(
    compiled: &CompiledStruct,
    value: &mut StructValue,
    visit: &mut dyn FnMut(&str, &mut RefValue),
) {
    for (i, node) in compiled.nodes.iter().enumerate() {
        visit_refs_node(node, value.slot_mut(i), visit);
    }
}

fn visit_refs_node(
    node: &CompiledNode,
    value: &mut Value,
    visit: &mut dyn FnMut(&str, &mut RefValue),
) {
    match (node, value) {
        (CompiledNode::Ref { target }, Value::Ref(r)) => visit(target, r),
        (CompiledNode::Struct(inner), Value::Struct(value)) => {
            visit_refs_struct(inner, value, visit);
        }
        (CompiledNode::List(elem), Value::List(items)) => {
            for item in items {
                visit_refs_node(elem, item, visit);
            }
        }
        (CompiledNode::Dict(elem), Value::Dict(entries)) => {
            for (_, item) in entries {
                visit_refs_node(elem, item, visit);
            }
        }
        _ => {}
    }
}

// ============================================================================
// Tests
// ============================================================================
