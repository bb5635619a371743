//! The container lifecycle end to end: declare, load, resolve, verify, store.

use datasheet_core::container::{ContainerBuilder, Phase};
use datasheet_core::descriptor::{NodeDef, RecordDef, ScalarKind, StructDef};
use datasheet_core::diag::{Diagnostics, ProblemKind};
use datasheet_core::export::GridExporter;
use datasheet_core::import::GridImporter;
use datasheet_core::test_utils::fixtures;
use datasheet_core::value::Value;
use datasheet_core::verify::VerifierRegistry;
use datasheet_csv::{CsvSink, CsvSource};

#[test]
fn phases_advance_in_order() {
    let mut source = CsvSource::new();
    source.insert("Tests", "Id,Content\nA,x\n");

    let mut container = fixtures::container();
    assert_eq!(container.phase(), Phase::Empty);

    let mut diag = Diagnostics::new();
    container.load(&GridImporter::new(source), &mut diag);
    assert_eq!(container.phase(), Phase::Loaded);

    container.post_load();
    assert_eq!(container.phase(), Phase::PostLoaded);

    container.verify(&VerifierRegistry::new(), &mut diag);
    assert_eq!(container.phase(), Phase::Verified);
    diag.assert_no_errors();
}

#[test]
fn verify_resolves_first_when_post_load_was_skipped() {
    let mut source = CsvSource::new();
    source.insert("Tests", "Id,Content\nAlpha,x\n");
    source.insert("Refers", "Id,ReferColumn\nR1,Alpha\n");

    let mut container = fixtures::container();
    let mut diag = Diagnostics::new();
    container.load(&GridImporter::new(source), &mut diag);
    container.verify(&VerifierRegistry::new(), &mut diag);
    diag.assert_no_errors();
    assert_eq!(container.phase(), Phase::Verified);
}

#[test]
fn annotation_hooks_check_annotated_leaves() {
    let mut source = CsvSource::new();
    source.insert("Assets", "Id,AssetPath\nIcon,icon.png\nSound,fx.wav\n");

    let mut container = fixtures::container();
    let mut diag = Diagnostics::new();
    container.load(&GridImporter::new(source), &mut diag);
    diag.assert_no_errors();

    let mut registry = VerifierRegistry::new();
    registry.register(
        "asset",
        Box::new(|value: &Value| match value.as_str() {
            Some(path) if path.ends_with(".png") => Ok(()),
            Some(path) => Err(format!("unsupported asset \"{path}\"")),
            None => Err("asset path must be text".to_string()),
        }),
    );
    container.verify(&registry, &mut diag);

    assert_eq!(diag.error_count(), 1);
    let event = diag.errors().next().unwrap();
    assert_eq!(event.kind, ProblemKind::Verification);
    assert_eq!(event.scope.record.as_deref(), Some("Sound"));
    assert_eq!(event.scope.column.as_deref(), Some("AssetPath"));
    assert!(event.message.contains("fx.wav"));
}

// A small game-shaped setup: items, and recipes whose ingredient lists
// reference them.
fn game_container() -> datasheet_core::container::Container {
    let items = RecordDef::new(
        ScalarKind::Str,
        StructDef::new()
            .field("Name", NodeDef::Scalar(ScalarKind::Str))
            .field("Stack", NodeDef::Scalar(ScalarKind::Int))
            .shared(),
    )
    .shared();
    let recipes = RecordDef::new(
        ScalarKind::Str,
        StructDef::new()
            .field("Output", NodeDef::reference("Items"))
            .field("Seconds", NodeDef::Scalar(ScalarKind::Float))
            .shared(),
    )
    .with_elements(
        "Ingredients",
        StructDef::new()
            .field("Item", NodeDef::reference("Items"))
            .field("Count", NodeDef::Scalar(ScalarKind::Int))
            .shared(),
    )
    .shared();

    let mut builder = ContainerBuilder::new();
    builder.table("Items", items);
    builder.table("Recipes", recipes);
    match builder.build() {
        Ok(container) => container,
        Err(err) => panic!("container failed to build: {err}"),
    }
}

#[test]
fn recipe_ingredients_resolve_and_store() {
    let mut source = CsvSource::new();
    source.insert(
        "Items",
        "Id,Name,Stack\niron-plate,Iron Plate,100\ncopper-wire,Copper Wire,200\ncircuit,Circuit,50\n",
    );
    source.insert(
        "Recipes",
        "Id,Output,Seconds,Item,Count\ncircuit,circuit,0.5,iron-plate,1\n,,,copper-wire,3\n",
    );

    let mut container = game_container();
    let mut diag = Diagnostics::new();
    let summary = container.load(&GridImporter::new(source), &mut diag);
    assert_eq!(summary.loaded, 2);
    container.verify(&VerifierRegistry::new(), &mut diag);
    diag.assert_no_errors();

    let recipes_id = container.table_id("Recipes").unwrap();
    let schema = container.schema(recipes_id).unwrap();
    let recipe = container.table(recipes_id).unwrap().get("circuit").unwrap();
    assert_eq!(recipe.element_count(), 2);

    // Follow the second ingredient back to its item record.
    let ingredient = schema.enumerate_element(&recipe.elements()[1]);
    let item_ref = ingredient[0].1.as_ref_value().unwrap();
    let item = container.record(item_ref.target.unwrap()).unwrap();
    assert_eq!(item.key(), "copper-wire");
    assert_eq!(ingredient[1].1.as_int(), Some(3));

    // The loaded set stores back without problems.
    let mut exporter = GridExporter::new(CsvSink::new());
    assert!(container.store(&mut exporter, &mut diag));
    diag.assert_no_errors();
    let csv = exporter.sink().csv("Recipes").unwrap();
    assert!(csv.starts_with("Id,Output,Seconds,Item,Count\n"));
}
