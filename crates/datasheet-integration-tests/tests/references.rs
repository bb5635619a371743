//! Weak reference resolution and verification across tables.

use datasheet_core::container::Container;
use datasheet_core::diag::{Diagnostics, ProblemKind};
use datasheet_core::import::GridImporter;
use datasheet_core::record::Record;
use datasheet_core::test_utils::fixtures;
use datasheet_core::value::RefValue;
use datasheet_core::verify::VerifierRegistry;
use datasheet_csv::CsvSource;

fn load_refs(tests: &str, refers: &str) -> (Container, Diagnostics) {
    let mut source = CsvSource::new();
    source.insert("Tests", tests);
    source.insert("Refers", refers);
    let mut container = fixtures::container();
    let mut diag = Diagnostics::new();
    container.load(&GridImporter::new(source), &mut diag);
    container.post_load();
    (container, diag)
}

fn refer_of<'a>(container: &'a Container, key: &str, column: &str) -> &'a RefValue {
    let refers = container.table_by_name("Refers").unwrap();
    let schema = container
        .schema(container.table_id("Refers").unwrap())
        .unwrap();
    let record = refers.get(key).unwrap();
    schema
        .enumerate_body(record)
        .into_iter()
        .find(|(path, _)| path == column)
        .and_then(|(_, value)| value.as_ref_value())
        .unwrap()
}

#[test]
fn references_resolve_to_record_handles() {
    let (container, diag) = load_refs(
        "Id,Content\nAlpha,x\nBravo,y\n",
        "Id,ReferColumn,ReferList:1,ReferList:2\nR1,Alpha,Alpha,Bravo\n",
    );
    diag.assert_no_errors();

    let refer = refer_of(&container, "R1", "ReferColumn");
    let target: Record = container.record(refer.target.unwrap()).unwrap().clone();
    assert_eq!(target.key(), "Alpha");

    assert_eq!(
        container
            .record(refer_of(&container, "R1", "ReferList:2").target.unwrap())
            .unwrap()
            .key(),
        "Bravo"
    );
}

#[test]
fn self_references_resolve_within_the_table() {
    let (container, diag) = load_refs(
        "Id,Content\nAlpha,x\n",
        "Id,SelfReferColumn\nR1,R2\nR2,R1\n",
    );
    diag.assert_no_errors();

    let refer = refer_of(&container, "R1", "SelfReferColumn");
    assert_eq!(container.record(refer.target.unwrap()).unwrap().key(), "R2");
    let back = refer_of(&container, "R2", "SelfReferColumn");
    assert_eq!(container.record(back.target.unwrap()).unwrap().key(), "R1");
}

#[test]
fn a_record_can_reference_itself() {
    let (mut container, diag) = load_refs(
        "Id,Content\nAlpha,x\n",
        "Id,SelfReferColumn\nRefer,Refer\n",
    );
    diag.assert_no_errors();

    // The key equals the record's own key, so the handle points back at it.
    let handle = refer_of(&container, "Refer", "SelfReferColumn")
        .target
        .unwrap();
    assert_eq!(container.record(handle).unwrap().key(), "Refer");
    let refers = container.table_by_name("Refers").unwrap();
    assert_eq!(handle.index as usize, refers.position("Refer").unwrap());

    let mut diag = Diagnostics::new();
    container.verify(&VerifierRegistry::new(), &mut diag);
    diag.assert_no_errors();
}

#[test]
fn element_references_resolve_like_body_ones() {
    let (container, diag) = load_refs(
        "Id,Content\nAlpha,x\nBravo,y\n",
        "Id,NestedReferColumn\nR1,Alpha\n,Bravo\n",
    );
    diag.assert_no_errors();

    let refers = container.table_by_name("Refers").unwrap();
    let schema = container
        .schema(container.table_id("Refers").unwrap())
        .unwrap();
    let record = refers.get("R1").unwrap();
    assert_eq!(record.element_count(), 2);
    let second = schema.enumerate_element(&record.elements()[1]);
    let refer = second[0].1.as_ref_value().unwrap();
    assert_eq!(
        container.record(refer.target.unwrap()).unwrap().key(),
        "Bravo"
    );
}

#[test]
fn dangling_references_stay_silent_until_verify() {
    let (mut container, diag) = load_refs(
        "Id,Content\nAlpha,x\n",
        "Id,ReferColumn\nR1,Missing\n",
    );
    // Loading and resolving report nothing.
    diag.assert_no_errors();
    assert!(refer_of(&container, "R1", "ReferColumn").target.is_none());

    let mut diag = Diagnostics::new();
    container.verify(&VerifierRegistry::new(), &mut diag);
    assert_eq!(diag.error_count(), 1);
    let event = diag.errors().next().unwrap();
    assert_eq!(event.kind, ProblemKind::UnresolvedReference);
    assert_eq!(event.scope.table.as_deref(), Some("Refers"));
    assert_eq!(event.scope.record.as_deref(), Some("R1"));
    assert_eq!(event.scope.column.as_deref(), Some("ReferColumn"));
}

#[test]
fn empty_reference_cells_are_not_references() {
    let (mut container, diag) = load_refs(
        "Id,Content\nAlpha,x\n",
        "Id,ReferColumn,SelfReferColumn\nR1,Alpha,\n",
    );
    diag.assert_no_errors();

    let mut diag = Diagnostics::new();
    container.verify(&VerifierRegistry::new(), &mut diag);
    diag.assert_no_errors();
}

#[test]
fn reloading_invalidates_previous_handles() {
    let (mut container, diag) = load_refs(
        "Id,Content\nAlpha,x\nBravo,y\n",
        "Id,ReferColumn\nR1,Bravo\n",
    );
    diag.assert_no_errors();
    let old = refer_of(&container, "R1", "ReferColumn").target.unwrap();
    assert_eq!(container.record(old).unwrap().key(), "Bravo");

    // Bravo moves to position zero in the next source state.
    let mut source = CsvSource::new();
    source.insert("Tests", "Id,Content\nBravo,y\n");
    source.insert("Refers", "Id,ReferColumn\nR1,Bravo\n");
    let mut diag = Diagnostics::new();
    container.load(&GridImporter::new(source), &mut diag);
    container.post_load();
    diag.assert_no_errors();

    let fresh = refer_of(&container, "R1", "ReferColumn").target.unwrap();
    assert_ne!(old, fresh);
    assert_eq!(container.record(fresh).unwrap().key(), "Bravo");
}
