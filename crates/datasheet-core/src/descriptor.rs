//! Explicit record-type descriptors.
//!
//! A record type is declared once as a tree of [`NodeDef`]s instead of being
//! re-derived from instances: the schema compiler turns a [`RecordDef`] into
//! a reusable path map, so every structural decision (is this a list, a
//! dictionary, a reference?) is a `match` on a closed variant rather than a
//! runtime type test.

use std::sync::Arc;

/// Primitive kind of a scalar leaf.
#[derive(Debug, Clone)]
pub enum ScalarKind {
    Str,
    Int,
    Float,
    Bool,
    DateTime,
    Enum(Arc<EnumDef>),
}

impl ScalarKind {
    /// Human-readable kind name used in conversion errors.
    pub fn describe(&self) -> String {
        match self {
            ScalarKind::Str => "string".to_string(),
            ScalarKind::Int => "integer".to_string(),
            ScalarKind::Float => "float".to_string(),
            ScalarKind::Bool => "boolean".to_string(),
            ScalarKind::DateTime => "date-time".to_string(),
            ScalarKind::Enum(def) => format!("enum {}", def.name),
        }
    }
}

/// A named, closed set of variant names. Matching is case-sensitive.
#[derive(Debug)]
pub struct EnumDef {
    pub name: String,
    pub variants: Vec<String>,
}

impl EnumDef {
    pub fn new(name: &str, variants: &[&str]) -> Arc<Self> {
        Arc::new(EnumDef {
            name: name.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        })
    }

    pub fn contains(&self, variant: &str) -> bool {
        self.variants.iter().any(|v| v == variant)
    }
}

/// Shape of one value slot: a scalar leaf, a weak reference leaf, or a
/// container of further nodes.
#[derive(Debug, Clone)]
pub enum NodeDef {
    Scalar(ScalarKind),
    /// A weak cross-table reference. `target` names a table in the container.
    Ref { target: String },
    Struct(Arc<StructDef>),
    /// Ordered collection, addressed by 1-based index in column paths.
    List(Box<NodeDef>),
    /// String-keyed collection, kept in first-seen key order.
    Dict(Box<NodeDef>),
}

impl NodeDef {
    pub fn reference(target: &str) -> Self {
        NodeDef::Ref {
            target: target.to_string(),
        }
    }

    pub fn list(elem: NodeDef) -> Self {
        NodeDef::List(Box::new(elem))
    }

    pub fn dict(elem: NodeDef) -> Self {
        NodeDef::Dict(Box::new(elem))
    }
}

/// One named field of a struct. The optional annotation keys verification
/// hooks (e.g. "asset" for strings naming external assets).
#[derive(Debug)]
pub struct FieldDef {
    pub name: String,
    pub node: NodeDef,
    pub annotation: Option<String>,
}

/// An ordered field list. Field order is the declared column order.
#[derive(Debug, Default)]
pub struct StructDef {
    pub fields: Vec<FieldDef>,
}

impl StructDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, node: NodeDef) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            node,
            annotation: None,
        });
        self
    }

    pub fn annotated(mut self, name: &str, node: NodeDef, annotation: &str) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            node,
            annotation: Some(annotation.to_string()),
        });
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// The element-array part of a record type: an ordered sequence of keyless
/// child entities. Element fields share the record's top-level column
/// namespace; `field` is only visible in document (JSON) form.
#[derive(Debug)]
pub struct ElementDef {
    pub field: String,
    pub shape: Arc<StructDef>,
}

/// Full description of one record type: the key's scalar kind, the body
/// fields, and zero or one element array.
#[derive(Debug)]
pub struct RecordDef {
    pub key: ScalarKind,
    pub body: Arc<StructDef>,
    pub elements: Option<ElementDef>,
}

impl RecordDef {
    pub fn new(key: ScalarKind, body: Arc<StructDef>) -> Self {
        RecordDef {
            key,
            body,
            elements: None,
        }
    }

    pub fn with_elements(mut self, field: &str, shape: Arc<StructDef>) -> Self {
        self.elements = Some(ElementDef {
            field: field.to_string(),
            shape,
        });
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Every reference leaf reachable from this type, as (path, target table)
    /// pairs. Used to validate a container's table set at build time.
    pub fn ref_targets(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        collect_refs(&self.body, "", &mut out);
        if let Some(elem) = &self.elements {
            collect_refs(&elem.shape, "", &mut out);
        }
        out
    }
}

fn collect_refs(def: &StructDef, prefix: &str, out: &mut Vec<(String, String)>) {
    for field in &def.fields {
        let path = if prefix.is_empty() {
            field.name.clone()
        } else {
            format!("{prefix}{}{}", crate::config::PATH_DELIMITER, field.name)
        };
        collect_node_refs(&field.node, &path, out);
    }
}

fn collect_node_refs(node: &NodeDef, path: &str, out: &mut Vec<(String, String)>) {
    match node {
        NodeDef::Scalar(_) => {}
        NodeDef::Ref { target } => out.push((path.to_string(), target.clone())),
        NodeDef::Struct(def) => collect_refs(def, path, out),
        NodeDef::List(elem) | NodeDef::Dict(elem) => collect_node_refs(elem, path, out),
    }
}
