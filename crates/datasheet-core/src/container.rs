//! The table container and its load lifecycle.
//!
//! A container is built once from record definitions, then moves through a
//! fixed lifecycle: `load` fills the tables from an importer, `post_load`
//! resolves references, `verify` runs the environment checks. Record handles
//! obtained from one load are invalid after the next one.

use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptor::RecordDef;
use crate::diag::{Diagnostics, Scope};
use crate::error::{ContainerError, TableError};
use crate::export::SheetExporter;
use crate::import::SheetImporter;
use crate::record::{Record, RecordHandle, TableId};
use crate::resolve;
use crate::schema::Schema;
use crate::table::Table;
use crate::verify::{self, VerifierRegistry};

/// Where a container is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Empty,
    Loaded,
    PostLoaded,
    Verified,
}

/// One table slot: the compiled schema plus the table, once loaded.
pub(crate) struct Slot {
    pub(crate) name: String,
    pub(crate) schema: Schema,
    pub(crate) table: Option<Table>,
}

/// Counts from one [`Container::load`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Sheets that produced a table.
    pub loaded: usize,
    /// Sheets the importer had no data for.
    pub missing: usize,
    /// Sheets that failed outright.
    pub errors: usize,
}

/// Declares the table set of a container.
#[derive(Default)]
pub struct ContainerBuilder {
    defs: Vec<(String, Arc<RecordDef>)>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table. The returned id stays valid for the container's whole
    /// lifetime.
    pub fn table(&mut self, name: impl Into<String>, def: Arc<RecordDef>) -> TableId {
        self.defs.push((name.into(), def));
        TableId(self.defs.len() as u32 - 1)
    }

    /// Compile the schemas and check the declarations against each other:
    /// table names must be unique and every reference target must name a
    /// declared table.
    pub fn build(self) -> Result<Container, ContainerError> {
        let mut names = HashMap::new();
        for (at, (name, _)) in self.defs.iter().enumerate() {
            if names.insert(name.clone(), at).is_some() {
                return Err(ContainerError::DuplicateTable(name.clone()));
            }
        }
        for (name, def) in &self.defs {
            for (path, target) in def.ref_targets() {
                if !names.contains_key(&target) {
                    return Err(ContainerError::UnknownRefTarget {
                        table: name.clone(),
                        path,
                        target,
                    });
                }
            }
        }

        let slots = self
            .defs
            .into_iter()
            .map(|(name, def)| Slot {
                name,
                schema: Schema::compile(def),
                table: None,
            })
            .collect();
        Ok(Container {
            slots,
            names,
            phase: Phase::Empty,
        })
    }
}

/// A fixed set of named tables loaded and verified together.
pub struct Container {
    slots: Vec<Slot>,
    names: HashMap<String, usize>,
    phase: Phase,
}

impl Container {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.names.get(name).map(|&at| TableId(at as u32))
    }

    pub fn schema(&self, id: TableId) -> Option<&Schema> {
        self.slots.get(id.0 as usize).map(|s| &s.schema)
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.slots.get(id.0 as usize).and_then(|s| s.table.as_ref())
    }

    pub fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.slots
            .get_mut(id.0 as usize)
            .and_then(|s| s.table.as_mut())
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.table_id(name).and_then(|id| self.table(id))
    }

    /// Install a table directly, bypassing the importer. Drops the container
    /// back to the loaded phase; references must be resolved again.
    pub fn set_table(&mut self, id: TableId, table: Table) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize) {
            slot.table = Some(table);
            self.phase = Phase::Loaded;
        }
    }

    /// Follow a resolved handle to its record.
    pub fn record(&self, handle: RecordHandle) -> Option<&Record> {
        self.table(handle.table)
            .and_then(|t| t.at(handle.index as usize))
    }

    /// Load every declared table from the importer. Previously loaded tables
    /// are dropped first, so a load always reflects exactly one source state.
    pub fn load(&mut self, importer: &dyn SheetImporter, diag: &mut Diagnostics) -> LoadSummary {
        let mut summary = LoadSummary::default();
        for slot in &mut self.slots {
            slot.table = None;
            match importer.import(&slot.name, &slot.schema, diag) {
                Ok(Some(table)) => {
                    slot.table = Some(table);
                    summary.loaded += 1;
                }
                Ok(None) => summary.missing += 1,
                Err(err) => {
                    diag.error(Scope::table(&slot.name), &TableError::Page(err));
                    summary.errors += 1;
                }
            }
        }
        self.phase = Phase::Loaded;
        summary
    }

    /// Like [`Container::load`], importing sheets in parallel. Events still
    /// come out in table declaration order.
    #[cfg(feature = "parallel")]
    pub fn load_parallel(
        &mut self,
        importer: &(dyn SheetImporter + Sync),
        diag: &mut Diagnostics,
    ) -> LoadSummary {
        use rayon::prelude::*;

        let results: Vec<_> = self
            .slots
            .par_iter()
            .map(|slot| {
                let mut local = Diagnostics::new();
                let outcome = importer.import(&slot.name, &slot.schema, &mut local);
                (outcome, local)
            })
            .collect();

        let mut summary = LoadSummary::default();
        for (slot, (outcome, local)) in self.slots.iter_mut().zip(results) {
            slot.table = None;
            diag.merge(local);
            match outcome {
                Ok(Some(table)) => {
                    slot.table = Some(table);
                    summary.loaded += 1;
                }
                Ok(None) => summary.missing += 1,
                Err(err) => {
                    diag.error(Scope::table(&slot.name), &TableError::Page(err));
                    summary.errors += 1;
                }
            }
        }
        self.phase = Phase::Loaded;
        summary
    }

    /// Resolve references across all loaded tables.
    pub fn post_load(&mut self) {
        resolve::resolve(&mut self.slots, &self.names);
        self.phase = Phase::PostLoaded;
    }

    /// Run reference and annotation checks. Resolves first if the caller
    /// skipped `post_load`.
    pub fn verify(&mut self, registry: &VerifierRegistry, diag: &mut Diagnostics) {
        if self.phase < Phase::PostLoaded {
            self.post_load();
        }
        verify::run(&self.slots, registry, diag);
        self.phase = Phase::Verified;
    }

    /// Export every loaded table. Returns false when any sheet failed;
    /// missing tables are skipped.
    pub fn store(&self, exporter: &mut dyn SheetExporter, diag: &mut Diagnostics) -> bool {
        let mut ok = true;
        for slot in &self.slots {
            let Some(table) = &slot.table else {
                continue;
            };
            if let Err(err) = exporter.export(&slot.name, &slot.schema, table, diag) {
                diag.error(Scope::table(&slot.name), &TableError::Page(err));
                ok = false;
            }
        }
        ok
    }
}

// ============================================================================
// Tests
// ============================================================================
