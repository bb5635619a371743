//! Post-load verification.
//!
//! Two checks run over every loaded record: references with a non-empty key
//! must have resolved, and annotated leaves run the hook registered for their
//! annotation. Hooks are how hosts attach environment checks (does this asset
//! path exist?) without the core knowing about the environment.

use std::collections::HashMap;

use crate::container::Slot;
use crate::diag::{Diagnostics, Scope};
use crate::error::TableError;
use crate::schema::LeafKind;
use crate::value::Value;

/// A verification hook for annotated leaves.
pub trait Verifier: Send + Sync {
    /// `Err` carries the message reported against the leaf's scope.
    fn verify(&self, value: &Value) -> Result<(), String>;
}

impl<F> Verifier for F
where
    F: Fn(&Value) -> Result<(), String> + Send + Sync,
{
    fn verify(&self, value: &Value) -> Result<(), String> {
        self(value)
    }
}

/// Verification hooks keyed by field annotation.
#[derive(Default)]
pub struct VerifierRegistry {
    hooks: HashMap<String, Box<dyn Verifier>>,
}

impl VerifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, annotation: impl Into<String>, verifier: Box<dyn Verifier>) {
        self.hooks.insert(annotation.into(), verifier);
    }

    pub fn get(&self, annotation: &str) -> Option<&dyn Verifier> {
        self.hooks.get(annotation).map(Box::as_ref)
    }
}

pub(crate) fn run(slots: &[Slot], registry: &VerifierRegistry, diag: &mut Diagnostics) {
    for slot in slots {
        let Some(table) = &slot.table else {
            continue;
        };
        for record in table.iter() {
            slot.schema.visit_leaves(record, &mut |leaf| {
                let scope = || {
                    let mut scope = Scope::table(&slot.name)
                        .with_record(record.key())
                        .with_column(leaf.path.clone());
                    if let Some(element) = leaf.element {
                        scope = scope.with_element(element);
                    }
                    scope
                };

                if let LeafKind::Ref { target } = leaf.kind {
                    if let Value::Ref(reference) = leaf.value {
                        if !reference.is_empty() && reference.target.is_none() {
                            diag.error(
                                scope(),
                                &TableError::UnresolvedReference {
                                    key: reference.key.clone(),
                                    target: target.to_string(),
                                },
                            );
                        }
                    }
                }

                if let Some(annotation) = leaf.annotation {
                    if let Some(hook) = registry.get(annotation) {
                        if let Err(message) = hook.verify(leaf.value) {
                            diag.error(scope(), &TableError::Verification(message));
                        }
                    }
                }
            });
        }
    }
}
