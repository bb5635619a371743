//! Reference resolution.
//!
//! Walks every reference slot in every loaded table and fills in the record
//! handle for its key, or leaves it absent when the key or the record is
//! missing. Resolution is silent: dangling keys are only reported by the
//! verification pass, so loads of partial data sets stay quiet.

use std::collections::HashMap;

use crate::container::Slot;
use crate::record::{RecordHandle, TableId};

pub(crate) fn resolve(slots: &mut [Slot], names: &HashMap<String, usize>) {
    // Key positions are snapshotted first so references into the table being
    // walked (self references included) resolve against the same state.
    let positions: Vec<Option<HashMap<String, u32>>> = slots
        .iter()
        .map(|slot| {
            slot.table.as_ref().map(|table| {
                table
                    .key_index()
                    .iter()
                    .map(|(key, &at)| (key.clone(), at as u32))
                    .collect()
            })
        })
        .collect();

    for slot in slots.iter_mut() {
        let Slot { schema, table, .. } = slot;
        let Some(table) = table.as_mut() else {
            continue;
        };
        for record in table.rows_mut() {
            schema.visit_refs_mut(record, &mut |target, reference| {
                reference.target = None;
                if reference.is_empty() {
                    return;
                }
                let Some(&slot_at) = names.get(target) else {
                    return;
                };
                let found = positions[slot_at]
                    .as_ref()
                    .and_then(|keys| keys.get(&reference.key));
                if let Some(&index) = found {
                    reference.target = Some(RecordHandle {
                        table: TableId(slot_at as u32),
                        index,
                    });
                }
            });
        }
    }
}
