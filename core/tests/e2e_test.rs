//! End-to-End Tests for the Translation Workflow
//!
//! These tests exercise the full lifecycle on a real directory tree:
//! 1. Creating languages from the base structure
//! 2. Syncing new keys out to every language
//! 3. Measuring completeness
//! 4. Validating structure and quality
//! 5. Exporting a hand-off package

use std::fs;

use loc_manager_core::store::TranslationStore;
use loc_manager_core::translate::{fill_language, EngineConfig, EngineSelector};
use loc_manager_core::tree::Tree;
use loc_manager_core::validator::{IssueLevel, LanguageValidator};
use loc_manager_core::{
    create_language, delete_language, export_languages, language_stats, list_languages, sync_all,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn seed_base(root: &std::path::Path) {
    let en = root.join("en");
    fs::create_dir_all(&en).expect("create base dir");
    fs::write(
        en.join("common.json"),
        r#"{
  "greeting": "Hello",
  "menu": {
    "open": "Open file",
    "save": "Save file"
  }
}"#,
    )
    .expect("write common.json");
    fs::write(en.join("errors.json"), r#"{"notFound": "Not found"}"#).expect("write errors.json");
}

/// Create a language, sync, inspect stats, validate, export.
#[test]
fn test_e2e_full_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    seed_base(temp_dir.path());
    let store = TranslationStore::new(temp_dir.path());

    // 1. Create a new language: every base file mirrored with empty values
    let files = create_language(&store, "fr").expect("create fr");
    assert_eq!(files, 2);

    let tree = store.read_tree("fr", "common.json").expect("read fr tree");
    assert_eq!(tree.get_path("greeting"), Some(&Tree::Leaf(String::new())));
    assert_eq!(tree.get_path("menu.open"), Some(&Tree::Leaf(String::new())));

    // 2. A new key appears in the base; sync pushes it everywhere
    let en_common = temp_dir.path().join("en").join("common.json");
    fs::write(
        &en_common,
        r#"{
  "greeting": "Hello",
  "farewell": "Goodbye",
  "menu": {
    "open": "Open file",
    "save": "Save file"
  }
}"#,
    )
    .expect("update base");

    let report = sync_all(&store).expect("sync");
    assert_eq!(report.languages_processed, 1);
    assert_eq!(report.fields_added, 1);
    assert!(report.errors.is_empty());

    let tree = store.read_tree("fr", "common.json").expect("re-read fr");
    assert_eq!(tree.get_path("farewell"), Some(&Tree::Leaf(String::new())));

    // 3. Translate one value by hand and check the completeness math
    let mut tree = store.read_tree("fr", "common.json").expect("read for edit");
    assert!(tree.set_leaf("greeting", "Bonjour".to_string()));
    store.write_tree("fr", "common.json", &tree).expect("write fr");

    let stats = language_stats(&store, "fr");
    // 5 leaves across both files, one translated
    assert_eq!(stats.total, 5);
    assert_eq!(stats.translated, 1);
    assert_eq!(stats.percentage, 20);

    let base_stats = language_stats(&store, "en");
    assert_eq!(base_stats.percentage, 100);

    // 4. Validation flags the untranslated values but no structural issues
    let mut validator = LanguageValidator::new(&store);
    validator.validate_language("fr").expect("validate fr");
    assert!(validator
        .issues()
        .iter()
        .all(|issue| issue.level != IssueLevel::Fatal));
    let summary = validator.summary();
    assert!(summary.warnings > 0);

    // 5. Export ships both languages under one timestamped directory
    let dest = TempDir::new().expect("dest dir");
    let export = export_languages(&store, &["en".to_string(), "fr".to_string()], dest.path())
        .expect("export");
    assert_eq!(export.languages.len(), 2);
    assert!(export.export_dir.join("fr").join("errors.json").is_file());
}

/// Machine translation fills only the empty values, via a mocked engine.
#[tokio::test]
async fn test_e2e_machine_fill() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responseStatus": 200,
            "responseData": {"translatedText": "Traduit"}
        })))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    seed_base(temp_dir.path());
    let store = TranslationStore::new(temp_dir.path());

    create_language(&store, "fr").expect("create fr");
    let mut tree = store.read_tree("fr", "common.json").expect("read fr");
    assert!(tree.set_leaf("greeting", "Bonjour".to_string()));
    store.write_tree("fr", "common.json", &tree).expect("write fr");

    let selector = EngineSelector::new(EngineConfig {
        mymemory_endpoint: server.uri(),
        libre_endpoint: server.uri(),
        ..EngineConfig::default()
    });

    let summary = fill_language(&store, &selector, "fr")
        .await
        .expect("fill fr");
    assert_eq!(summary.translated, 3);
    assert_eq!(summary.failed, 0);

    // the hand-translated value is left alone
    let tree = store.read_tree("fr", "common.json").expect("re-read fr");
    assert_eq!(tree.get_path("greeting"), Some(&Tree::Leaf("Bonjour".into())));
    assert_eq!(tree.get_path("menu.open"), Some(&Tree::Leaf("Traduit".into())));

    let stats = language_stats(&store, "fr");
    assert_eq!(stats.percentage, 100);
}

/// Deleting a language removes it from the listing and leaves a snapshot.
#[test]
fn test_e2e_delete_with_snapshot() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    seed_base(temp_dir.path());
    let store = TranslationStore::new(temp_dir.path());

    create_language(&store, "de").expect("create de");
    assert_eq!(list_languages(&store).expect("list").len(), 2);

    delete_language(&store, "de").expect("delete de");
    let remaining = list_languages(&store).expect("list again");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].code, "en");

    // the snapshot sits next to the deleted directory
    let snapshots: Vec<_> = fs::read_dir(temp_dir.path())
        .expect("read root")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("de.bak."))
        .collect();
    assert_eq!(snapshots.len(), 1);
}
