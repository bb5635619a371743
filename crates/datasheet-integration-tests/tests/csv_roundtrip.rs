//! Container-level round trips through the CSV backend.

use datasheet_core::container::{Container, LoadSummary};
use datasheet_core::diag::{Diagnostics, ProblemKind};
use datasheet_core::export::GridExporter;
use datasheet_core::import::GridImporter;
use datasheet_core::test_utils::fixtures;
use datasheet_csv::{CsvSink, CsvSource};

fn load(container: &mut Container, source: CsvSource, diag: &mut Diagnostics) -> LoadSummary {
    container.load(&GridImporter::new(source), diag)
}

#[test]
fn loaded_tables_survive_a_store_and_reload() {
    let mut source = CsvSource::new();
    source.insert("Tests", "Id,Content\nA,First\nB,Second\n");
    source.insert(
        "Arrays",
        "Id,Content,ElemContent\nT,Body,E1\n,,E2\n,,E3\n",
    );
    source.insert(
        "Nested",
        "Id,Struct:XInt,Struct:ZList:1,Struct:ZList:2,IntList:1\nRow,4,a,b,7\n,,,,8\n",
    );
    source.insert("Dicts", "Id,Dict:Key,NestedDict:Inner:1,Value\nD,0.5,x,3\n");

    let mut container = fixtures::container();
    let mut diag = Diagnostics::new();
    let summary = load(&mut container, source, &mut diag);
    diag.assert_no_errors();
    assert_eq!(summary.loaded, 4);
    assert_eq!(summary.errors, 0);

    let mut exporter = GridExporter::new(CsvSink::new());
    assert!(container.store(&mut exporter, &mut diag));
    diag.assert_no_errors();
    let sink = exporter.into_sink();

    let mut reload_source = CsvSource::new();
    for name in ["Tests", "Arrays", "Nested", "Dicts"] {
        reload_source.insert(name, sink.csv(name).unwrap());
    }
    let mut reloaded = fixtures::container();
    load(&mut reloaded, reload_source, &mut diag);
    diag.assert_no_errors();

    for name in ["Tests", "Arrays", "Nested", "Dicts"] {
        let before = container.table_by_name(name).unwrap();
        let after = reloaded.table_by_name(name).unwrap();
        assert_eq!(before.len(), after.len(), "{name} changed size");
        for record in before.iter() {
            assert_eq!(
                Some(record),
                after.get(record.key()),
                "{name}/{} changed",
                record.key()
            );
        }
    }
}

#[test]
fn duplicate_keys_load_first_wins_with_one_event_each() {
    let mut source = CsvSource::new();
    source.insert("Tests", "Id,Content\nA,1\nB,1\nA,2\nB,2\n");

    let mut container = fixtures::container();
    let mut diag = Diagnostics::new();
    load(&mut container, source, &mut diag);

    let tests = container.table_by_name("Tests").unwrap();
    assert_eq!(tests.len(), 2);
    let schema = container.schema(container.table_id("Tests").unwrap()).unwrap();
    assert_eq!(
        schema.enumerate_body(tests.get("A").unwrap())[0].1.as_str(),
        Some("1")
    );
    assert_eq!(diag.error_count(), 2);
    assert!(diag.errors().all(|e| e.kind == ProblemKind::DuplicateKey));
}

#[test]
fn missing_sheets_count_but_do_not_report() {
    let mut source = CsvSource::new();
    source.insert("Tests", "Id,Content\nA,x\n");

    let mut container = fixtures::container();
    let mut diag = Diagnostics::new();
    let summary = load(&mut container, source, &mut diag);

    assert_eq!(summary.loaded, 1);
    assert_eq!(summary.missing, 6);
    assert!(diag.events().is_empty());
    assert!(container.table_by_name("Arrays").is_none());
}
