/// Export of translation packages
///
/// Copies the selected languages' JSON files into a timestamped
/// directory the caller can hand off. Archive packaging is out of
/// scope; the directory layout mirrors the translations root.
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;
use serde::Serialize;

use crate::store::{StoreError, TranslationStore};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no languages selected for export")]
    NothingSelected,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub export_dir: PathBuf,
    pub languages: Vec<ExportedLanguage>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedLanguage {
    pub code: String,
    pub file_count: usize,
}

/// Copy each selected language into `dest_root/translations-<stamp>/`.
/// Unknown codes are skipped and reported, not fatal.
pub fn export_languages(
    store: &TranslationStore,
    codes: &[String],
    dest_root: &Path,
) -> Result<ExportSummary, ExportError> {
    if codes.is_empty() {
        return Err(ExportError::NothingSelected);
    }

    let stamp = Local::now().format("%Y-%m-%dT%H-%M-%S");
    let export_dir = dest_root.join(format!("translations-{stamp}"));
    fs::create_dir_all(&export_dir).map_err(StoreError::Io)?;

    let mut languages = Vec::new();
    let mut skipped = Vec::new();
    for code in codes {
        if !store.language_exists(code) {
            skipped.push(code.clone());
            continue;
        }

        let target_dir = export_dir.join(code);
        fs::create_dir_all(&target_dir).map_err(StoreError::Io)?;

        let file_names = store.list_json_files(code)?;
        for name in &file_names {
            fs::copy(store.file_path(code, name), target_dir.join(name))
                .map_err(StoreError::Io)?;
        }

        languages.push(ExportedLanguage {
            code: code.clone(),
            file_count: file_names.len(),
        });
    }

    info!(
        "exported {} languages to {}",
        languages.len(),
        export_dir.display()
    );
    Ok(ExportSummary {
        export_dir,
        languages,
        skipped,
    })
}
