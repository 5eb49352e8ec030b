/// Completeness accounting for language trees
///
/// A leaf counts as translated only when it is non-empty and differs
/// from the baseline value at the same path; a verbatim copy of the
/// source text is still untranslated work.
use log::warn;
use serde::Serialize;

use crate::store::TranslationStore;
use crate::tree::Tree;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeyCounts {
    pub total: usize,
    pub translated: usize,
    pub empty: usize,
}

impl KeyCounts {
    /// Whole-percent completeness, rounded to nearest. Zero when the
    /// tree has no leaves.
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.translated as f64 / self.total as f64) * 100.0).round() as u32
    }

    fn add(&mut self, other: KeyCounts) {
        self.total += other.total;
        self.translated += other.translated;
        self.empty += other.empty;
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    pub name: String,
    pub total: usize,
    pub translated: usize,
    pub empty: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageStats {
    pub code: String,
    pub total: usize,
    pub translated: usize,
    pub empty: usize,
    pub percentage: u32,
    pub files: Vec<FileStats>,
}

/// Classify every leaf of `tree`. Pass `None` for the baseline when the
/// tree IS the baseline; then every non-empty leaf counts as
/// translated.
pub fn count_keys(tree: &Tree, baseline: Option<&Tree>) -> KeyCounts {
    let mut counts = KeyCounts::default();
    walk(tree, baseline, &mut counts);
    counts
}

fn walk(tree: &Tree, baseline: Option<&Tree>, counts: &mut KeyCounts) {
    match tree {
        Tree::Node(map) => {
            for (key, value) in map {
                let base_value = match baseline {
                    Some(Tree::Node(base_map)) => base_map.get(key),
                    _ => None,
                };
                walk(value, base_value, counts);
            }
        }
        Tree::Leaf(text) => {
            counts.total += 1;
            if text.is_empty() {
                counts.empty += 1;
            } else {
                match baseline {
                    Some(Tree::Leaf(base_text)) if base_text == text => counts.empty += 1,
                    _ => counts.translated += 1,
                }
            }
        }
    }
}

/// Aggregate stats over every JSON file of one language. Unreadable
/// files contribute nothing rather than failing the whole call; a
/// missing language directory yields all-zero stats.
pub fn language_stats(store: &TranslationStore, code: &str) -> LanguageStats {
    let is_base = code == store.base_language();
    let file_names = store.list_json_files(code).unwrap_or_default();

    let mut totals = KeyCounts::default();
    let mut files = Vec::with_capacity(file_names.len());
    for name in file_names {
        let counts = match store.read_tree(code, &name) {
            Ok(tree) => {
                let baseline = if is_base {
                    None
                } else {
                    store.read_tree(store.base_language(), &name).ok()
                };
                count_keys(&tree, baseline.as_ref())
            }
            Err(err) => {
                warn!("stats: skipping unreadable {code}/{name}: {err}");
                KeyCounts::default()
            }
        };

        totals.add(counts);
        files.push(FileStats {
            name,
            total: counts.total,
            translated: counts.translated,
            empty: counts.empty,
            percentage: counts.percentage(),
        });
    }

    LanguageStats {
        code: code.to_string(),
        total: totals.total,
        translated: totals.translated,
        empty: totals.empty,
        percentage: totals.percentage(),
        files,
    }
}
