/// Structural synchronization of language trees against the baseline
///
/// Sync is additive-only: it inserts keys the baseline has and the
/// target lacks, and never deletes, prunes, or resets an existing
/// target value.
use std::path::Path;

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;

use crate::backup::backup_and_swap;
use crate::store::{StoreError, TranslationStore};
use crate::template::empty_mirror;
use crate::tree::Tree;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("baseline language not found: {0}")]
    MissingBaseline(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of merging one target tree against the baseline.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub tree: Tree,
    pub fields_added: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncErrorEntry {
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub languages_processed: usize,
    pub files_added: usize,
    pub fields_added: usize,
    pub errors: Vec<SyncErrorEntry>,
}

impl SyncReport {
    fn record_error(&mut self, language: &str, file: Option<&str>, message: impl ToString) {
        warn!(
            "sync error [{language}{}]: {}",
            file.map(|name| format!("/{name}")).unwrap_or_default(),
            message.to_string()
        );
        self.errors.push(SyncErrorEntry {
            language: language.to_string(),
            file: file.map(str::to_string),
            message: message.to_string(),
        });
    }

    /// Persist the report as JSON next to whatever the caller chooses.
    pub fn write_to(&self, path: &Path) -> Result<(), SyncError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Persisted<'a> {
            timestamp: String,
            #[serde(flatten)]
            report: &'a SyncReport,
        }

        let persisted = Persisted {
            timestamp: Utc::now().to_rfc3339(),
            report: self,
        };
        let rendered = serde_json::to_string_pretty(&persisted).map_err(|source| {
            StoreError::Parse {
                path: path.display().to_string(),
                source,
            }
        })?;
        backup_and_swap(path, rendered.as_bytes()).map_err(StoreError::Backup)?;
        Ok(())
    }
}

/// Merge `target` against `baseline`, inserting every key present in
/// the baseline and missing in the target. Pure; the caller persists
/// the result.
pub fn sync_trees(baseline: &Tree, target: &Tree) -> SyncOutcome {
    let mut fields_added = 0;
    let tree = merge(baseline, target, &mut fields_added);
    SyncOutcome { tree, fields_added }
}

fn merge(baseline: &Tree, target: &Tree, fields_added: &mut usize) -> Tree {
    match (baseline, target) {
        (Tree::Node(base_map), Tree::Node(target_map)) => {
            let mut merged = target_map.clone();
            for (key, base_value) in base_map {
                match merged.get(key) {
                    None => {
                        let fresh = empty_mirror(base_value);
                        *fields_added += fresh.leaf_count();
                        merged.insert(key.clone(), fresh);
                    }
                    Some(existing) => match (base_value, existing) {
                        (Tree::Node(_), Tree::Node(_)) => {
                            let sub = merge(base_value, existing, fields_added);
                            merged.insert(key.clone(), sub);
                        }
                        (Tree::Node(_), Tree::Leaf(_)) => {
                            // shape disagreement: the baseline's structure wins
                            let fresh = empty_mirror(base_value);
                            *fields_added += fresh.leaf_count();
                            merged.insert(key.clone(), fresh);
                        }
                        // existing leaf values are preserved, even empty ones
                        (Tree::Leaf(_), _) => {}
                    },
                }
            }
            Tree::Node(merged)
        }
        (Tree::Node(_), Tree::Leaf(_)) => {
            let fresh = empty_mirror(baseline);
            *fields_added += fresh.leaf_count();
            fresh
        }
        (Tree::Leaf(_), other) => other.clone(),
    }
}

/// Sync every non-base language under the store against the baseline.
/// Failures are itemized per language/file and do not abort the batch.
pub fn sync_all(store: &TranslationStore) -> Result<SyncReport, SyncError> {
    let base = store.base_language();
    let base_files = store
        .list_json_files(base)
        .map_err(|_| SyncError::MissingBaseline(base.to_string()))?;

    let mut report = SyncReport::default();
    for code in store.list_language_dirs()? {
        if code == base {
            continue;
        }
        report.languages_processed += 1;
        sync_language_into(store, &code, &base_files, &mut report);
    }

    info!(
        "sync finished: {} languages, {} files added, {} fields added, {} errors",
        report.languages_processed,
        report.files_added,
        report.fields_added,
        report.errors.len()
    );
    Ok(report)
}

/// Sync a single language against the baseline.
pub fn sync_language(store: &TranslationStore, code: &str) -> Result<SyncReport, SyncError> {
    let base = store.base_language();
    let base_files = store
        .list_json_files(base)
        .map_err(|_| SyncError::MissingBaseline(base.to_string()))?;

    let mut report = SyncReport::default();
    if !store.language_exists(code) {
        report.record_error(code, None, "language directory does not exist");
        return Ok(report);
    }

    report.languages_processed = 1;
    sync_language_into(store, code, &base_files, &mut report);
    Ok(report)
}

fn sync_language_into(
    store: &TranslationStore,
    code: &str,
    base_files: &[String],
    report: &mut SyncReport,
) {
    let base = store.base_language();
    for file_name in base_files {
        let baseline = match store.read_tree(base, file_name) {
            Ok(tree) => tree,
            Err(err) => {
                report.record_error(base, Some(file_name), err);
                continue;
            }
        };

        match store.read_tree(code, file_name) {
            Ok(target) => {
                let outcome = sync_trees(&baseline, &target);
                if outcome.fields_added > 0 {
                    if let Err(err) = store.write_tree(code, file_name, &outcome.tree) {
                        report.record_error(code, Some(file_name), err);
                        continue;
                    }
                    report.fields_added += outcome.fields_added;
                    info!(
                        "synced {code}/{file_name}: {} fields added",
                        outcome.fields_added
                    );
                }
            }
            Err(StoreError::NotFound(_)) => {
                let fresh = empty_mirror(&baseline);
                let leaves = fresh.leaf_count();
                if let Err(err) = store.write_tree(code, file_name, &fresh) {
                    report.record_error(code, Some(file_name), err);
                    continue;
                }
                report.files_added += 1;
                report.fields_added += leaves;
                info!("bootstrapped {code}/{file_name}: {leaves} fields");
            }
            Err(err) => {
                report.record_error(code, Some(file_name), err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn tree(json: &str) -> Tree {
        Tree::from_json(json).unwrap()
    }

    #[test]
    fn inserts_missing_leaf_and_subtree() {
        let baseline = tree(r#"{"a": "Hello", "b": {"c": "World"}}"#);
        let target = tree(r#"{"a": ""}"#);

        let outcome = sync_trees(&baseline, &target);
        assert_eq!(outcome.tree, tree(r#"{"a": "", "b": {"c": ""}}"#));
        // "a" already exists and is preserved; only "b.c" is new
        assert_eq!(outcome.fields_added, 1);
    }

    #[test]
    fn existing_empty_node_counts_only_new_fields() {
        // missing subtree with a single leaf: exactly one field added
        let baseline = tree(r#"{"a": "Hello", "b": {"c": "World"}}"#);
        let target = tree(r#"{"a": "", "b": {}}"#);
        let outcome = sync_trees(&baseline, &target);
        assert_eq!(outcome.tree, tree(r#"{"a": "", "b": {"c": ""}}"#));
        assert_eq!(outcome.fields_added, 1);
    }

    #[test]
    fn preserves_existing_values_even_empty() {
        let baseline = tree(r#"{"a": "Hello", "b": "World"}"#);
        let target = tree(r#"{"a": "Bonjour", "b": ""}"#);
        let outcome = sync_trees(&baseline, &target);
        assert_eq!(outcome.tree, target);
        assert_eq!(outcome.fields_added, 0);
    }

    #[test]
    fn keeps_orphaned_target_keys() {
        let baseline = tree(r#"{"a": "Hello"}"#);
        let target = tree(r#"{"a": "Bonjour", "legacy": "Garder"}"#);
        let outcome = sync_trees(&baseline, &target);
        assert_eq!(
            outcome.tree.get_path("legacy"),
            Some(&Tree::Leaf("Garder".into()))
        );
        assert_eq!(outcome.fields_added, 0);
    }

    #[test]
    fn rebuilds_mismatched_subtree() {
        let baseline = tree(r#"{"menu": {"open": "Open", "close": "Close"}}"#);
        let target = tree(r#"{"menu": "whoops"}"#);
        let outcome = sync_trees(&baseline, &target);
        assert_eq!(outcome.tree, tree(r#"{"menu": {"open": "", "close": ""}}"#));
        assert_eq!(outcome.fields_added, 2);
    }

    #[test]
    fn sync_is_idempotent() {
        let baseline = tree(r#"{"a": "Hello", "b": {"c": "World", "d": "More"}}"#);
        let target = tree(r#"{"a": "Salut"}"#);
        let first = sync_trees(&baseline, &target);
        assert!(first.fields_added > 0);
        let second = sync_trees(&baseline, &first.tree);
        assert_eq!(second.fields_added, 0);
        assert_eq!(second.tree, first.tree);
    }

    #[test]
    fn all_baseline_paths_present_after_sync() {
        let baseline = tree(r#"{"a": "1", "b": {"c": "2", "d": {"e": "3"}}}"#);
        let target = tree(r#"{"b": {"d": {}}}"#);
        let outcome = sync_trees(&baseline, &target);
        for path in ["a", "b.c", "b.d.e"] {
            assert!(outcome.tree.get_path(path).is_some(), "missing {path}");
        }
    }

    fn seed(root: &std::path::Path, code: &str, file: &str, json: &str) {
        let dir = root.join(code);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), json).unwrap();
    }

    #[test]
    fn sync_all_bootstraps_missing_files() {
        let dir = tempdir().unwrap();
        seed(dir.path(), "en", "common.json", r#"{"a": "Hello", "b": {"c": "World"}}"#);
        seed(dir.path(), "ja", "other.json", r#"{"x": "y"}"#);

        let store = TranslationStore::new(dir.path());
        let report = sync_all(&store).unwrap();

        assert_eq!(report.languages_processed, 1);
        assert_eq!(report.files_added, 1);
        assert_eq!(report.fields_added, 2);
        assert!(report.errors.is_empty());

        let created = store.read_tree("ja", "common.json").unwrap();
        assert_eq!(created, tree(r#"{"a": "", "b": {"c": ""}}"#));
    }

    #[test]
    fn sync_all_records_errors_and_continues() {
        let dir = tempdir().unwrap();
        seed(dir.path(), "en", "common.json", r#"{"a": "Hello"}"#);
        seed(dir.path(), "de", "common.json", "{broken");
        seed(dir.path(), "fr", "common.json", r#"{}"#);

        let store = TranslationStore::new(dir.path());
        let report = sync_all(&store).unwrap();

        assert_eq!(report.languages_processed, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].language, "de");
        // fr was still processed
        let fr = store.read_tree("fr", "common.json").unwrap();
        assert_eq!(fr, tree(r#"{"a": ""}"#));
    }

    #[test]
    fn second_sync_all_adds_nothing() {
        let dir = tempdir().unwrap();
        seed(dir.path(), "en", "common.json", r#"{"a": "Hello", "b": {"c": "W"}}"#);
        seed(dir.path(), "ja", "common.json", r#"{"a": "こんにちは"}"#);

        let store = TranslationStore::new(dir.path());
        let first = sync_all(&store).unwrap();
        assert!(first.fields_added > 0);

        let second = sync_all(&store).unwrap();
        assert_eq!(second.fields_added, 0);
        assert_eq!(second.files_added, 0);
    }

    #[test]
    fn missing_baseline_is_an_error() {
        let dir = tempdir().unwrap();
        let store = TranslationStore::new(dir.path());
        assert!(matches!(
            sync_all(&store),
            Err(SyncError::MissingBaseline(_))
        ));
    }

    #[test]
    fn report_round_trips_to_disk() {
        let dir = tempdir().unwrap();
        let report = SyncReport {
            languages_processed: 2,
            files_added: 1,
            fields_added: 7,
            errors: vec![],
        };
        let path = dir.path().join("sync-report.json");
        report.write_to(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"fieldsAdded\": 7"));
        assert!(content.contains("timestamp"));
    }
}
