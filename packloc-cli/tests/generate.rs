//! End-to-end tests for the packloc-index binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

fn write(dir: &Path, name: &str, value: &Value) {
    fs::write(dir.join(name), serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn cmd() -> Command {
    Command::cargo_bin("packloc-index").unwrap()
}

#[test]
fn missing_input_prints_usage_and_exits_one() {
    cmd()
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn nonexistent_input_directory_fails() {
    cmd()
        .args(["--input", "/no/such/translation/tree"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn writes_both_indexes_next_to_the_input() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "pf2e.spells-srd.json",
        &json!({
            "label": "Sorts",
            "entries": {"Fireball": "Boule de feu"},
            "folders": {"Evocation": "Évocation"}
        }),
    );

    cmd()
        .args(["--input", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 labels"))
        .stdout(predicate::str::contains("1 packs, 1 titles, 1 folders"));

    let labels: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("labels.json")).unwrap()).unwrap();
    assert_eq!(labels["pf2e.spells-srd"], "Sorts");

    let titles: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("titles.json")).unwrap()).unwrap();
    assert_eq!(titles["pf2e.spells-srd"]["titles"]["Fireball"], "Boule de feu");
    assert_eq!(titles["pf2e.spells-srd"]["folders"]["Evocation"], "Évocation");
}

#[test]
fn dry_run_prints_documents_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.b.json", &json!({"label": "Paquet"}));

    cmd()
        .args(["--input", dir.path().to_str().unwrap(), "--dry-run", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"a.b":"Paquet"}"#));

    assert!(!dir.path().join("labels.json").exists());
    assert!(!dir.path().join("titles.json").exists());
}

#[test]
fn custom_output_paths_are_respected() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(dir.path(), "a.b.json", &json!({"entries": {"x": "y"}}));

    let labels_out = out.path().join("baked/labels.json");
    let titles_out = out.path().join("baked/titles.json");
    cmd()
        .args([
            "--input",
            dir.path().to_str().unwrap(),
            "--labels-output",
            labels_out.to_str().unwrap(),
            "--titles-output",
            titles_out.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(labels_out.exists());
    assert!(titles_out.exists());
}

/// The generated light indexes must reproduce, through the applier, the same
/// label and title translation the engine derives from the full fragment.
#[tokio::test]
async fn generated_indexes_round_trip_through_the_applier() {
    use packloc_core::*;
    use std::sync::Arc;

    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "a.b.json",
        &json!({"label": "Paquet Traduit", "entries": {"Original": "Bonjour"}}),
    );

    cmd()
        .args(["--input", dir.path().to_str().unwrap()])
        .assert()
        .success();

    // Light path: applier over the baked indexes.
    let labels: LabelIndex =
        serde_json::from_str(&fs::read_to_string(dir.path().join("labels.json")).unwrap()).unwrap();
    let titles: TitleIndex =
        serde_json::from_str(&fs::read_to_string(dir.path().join("titles.json")).unwrap()).unwrap();
    let applier = LightIndexApplier::new(labels, titles);

    let mut packs = vec![PackMetadata::new("a", "b", "Item")];
    applier.apply_labels(&mut packs);
    assert_eq!(packs[0].label, "Paquet Traduit");

    let mut entries = vec![IndexEntry::new("doc1", "Original")];
    applier.translate_index("a.b", &mut entries);
    assert_eq!(entries[0].name, "Bonjour");

    // Full path: loading the fragment itself yields the same strings.
    let transport = Arc::new(
        MemoryTransport::new().with_file(
            "modules/fr-pack/translations/a.b.json",
            json!({"label": "Paquet Traduit", "entries": {"Original": "Bonjour"}}),
        ),
    );
    let loader = PackLoader::new(
        LoaderConfig::new("fr").with_module(TranslationModule::new("fr-pack", "fr", "translations")),
        transport,
        Arc::new(MemorySettings::new()),
        Arc::new(StaticCatalog::new(vec![PackMetadata::new("a", "b", "Item")])),
    );
    loader.ensure_loaded("a.b").await;

    let record = loader.record("a.b").unwrap();
    assert_eq!(record.label.as_deref(), Some(packs[0].label.as_str()));
    assert_eq!(
        record.entries.as_ref().unwrap().get("Original"),
        Some(&json!(entries[0].name))
    );
}
