/// Fill-in translation of empty leaves
///
/// Collects every leaf that is still empty (or missing) in the target
/// language, batches the corresponding baseline texts through the
/// engine selector, and writes the answers back by path. Existing
/// non-empty values are never touched.
use std::time::Duration;

use futures::future::join_all;
use log::{info, warn};
use serde::Serialize;
use tokio::time::sleep;

use crate::store::{StoreError, TranslationStore};
use crate::sync::sync_trees;
use crate::tree::Tree;

use super::{EngineSelector, BATCH_DELAY_MS, BATCH_SIZE, MAX_CONCURRENT};

#[derive(Debug, thiserror::Error)]
pub enum FillError {
    #[error("the base language is not a translation target")]
    BaseLanguage,

    #[error("language not found: {0} (create it first)")]
    UnknownLanguage(String),

    #[error("baseline language not found: {0}")]
    MissingBaseline(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillSummary {
    pub language: String,
    pub files_processed: usize,
    pub translated: usize,
    pub failed: usize,
}

#[derive(Debug)]
struct FillItem {
    path: String,
    source: String,
}

/// Translate every untranslated leaf of one language in place.
pub async fn fill_language(
    store: &TranslationStore,
    selector: &EngineSelector,
    code: &str,
) -> Result<FillSummary, FillError> {
    if code == store.base_language() {
        return Err(FillError::BaseLanguage);
    }
    if !store.language_exists(code) {
        return Err(FillError::UnknownLanguage(code.to_string()));
    }

    let base = store.base_language();
    let base_files = store
        .list_json_files(base)
        .map_err(|_| FillError::MissingBaseline(base.to_string()))?;

    let mut summary = FillSummary {
        language: code.to_string(),
        ..Default::default()
    };

    for file_name in &base_files {
        let baseline = match store.read_tree(base, file_name) {
            Ok(tree) => tree,
            Err(err) => {
                warn!("fill: skipping {base}/{file_name}: {err}");
                continue;
            }
        };

        // bring the target up to the baseline's shape before filling
        let target = match store.read_tree(code, file_name) {
            Ok(tree) => tree,
            Err(StoreError::NotFound(_)) => Tree::empty(),
            Err(err) => {
                warn!("fill: skipping {code}/{file_name}: {err}");
                continue;
            }
        };
        let mut target = sync_trees(&baseline, &target).tree;

        let items = collect_untranslated(&baseline, &target, "");
        if items.is_empty() {
            continue;
        }
        info!("fill: {code}/{file_name} has {} untranslated items", items.len());

        let (translated, failed) = fill_tree(selector, &mut target, &items, code).await;
        if translated > 0 {
            store.write_tree(code, file_name, &target)?;
        }

        summary.files_processed += 1;
        summary.translated += translated;
        summary.failed += failed;
    }

    info!(
        "fill finished for {code}: {} translated, {} failed across {} files",
        summary.translated, summary.failed, summary.files_processed
    );
    Ok(summary)
}

async fn fill_tree(
    selector: &EngineSelector,
    target: &mut Tree,
    items: &[FillItem],
    target_lang: &str,
) -> (usize, usize) {
    let mut translated = 0;
    let mut failed = 0;

    let batches: Vec<&[FillItem]> = items.chunks(BATCH_SIZE).collect();
    for (wave_index, wave) in batches.chunks(MAX_CONCURRENT).enumerate() {
        if wave_index > 0 {
            sleep(Duration::from_millis(BATCH_DELAY_MS)).await;
        }

        let requests = wave.iter().map(|batch| {
            let texts: Vec<String> = batch.iter().map(|item| item.source.clone()).collect();
            async move { selector.translate_batch(&texts, target_lang).await }
        });

        for (batch, results) in wave.iter().zip(join_all(requests).await) {
            for (item, result) in batch.iter().zip(results) {
                match result {
                    // an answer identical to the source is no translation
                    Some(text) if text != item.source => {
                        if target.set_leaf(&item.path, text) {
                            translated += 1;
                        } else {
                            failed += 1;
                        }
                    }
                    _ => failed += 1,
                }
            }
        }
    }

    (translated, failed)
}

/// Baseline leaves with non-empty source text whose counterpart in the
/// target is empty or absent.
fn collect_untranslated(baseline: &Tree, target: &Tree, path: &str) -> Vec<FillItem> {
    let mut items = Vec::new();
    collect_into(baseline, target, path, &mut items);
    items
}

fn collect_into(baseline: &Tree, target: &Tree, path: &str, items: &mut Vec<FillItem>) {
    let (Tree::Node(base_map), Tree::Node(target_map)) = (baseline, target) else {
        return;
    };

    for (key, base_value) in base_map {
        let current = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };

        match base_value {
            Tree::Node(_) => {
                if let Some(target_value) = target_map.get(key) {
                    collect_into(base_value, target_value, &current, items);
                }
            }
            Tree::Leaf(source) => {
                if source.is_empty() {
                    continue;
                }
                let needs_fill = match target_map.get(key) {
                    None => true,
                    Some(Tree::Leaf(text)) => text.is_empty(),
                    Some(Tree::Node(_)) => false,
                };
                if needs_fill {
                    items.push(FillItem {
                        path: current,
                        source: source.clone(),
                    });
                }
            }
        }
    }
}
