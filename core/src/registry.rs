/// Language enumeration, creation, and deletion
use std::collections::HashMap;
use std::fs;

use log::info;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::backup::snapshot_dir;
use crate::store::{StoreError, TranslationStore};
use crate::template::empty_mirror;

static DISPLAY_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("en", "English"),
        ("zh-TW", "繁體中文"),
        ("zh-CN", "簡體中文"),
        ("ja", "日本語"),
        ("ko", "한국어"),
        ("es", "Español"),
        ("fr", "Français"),
        ("de", "Deutsch"),
        ("it", "Italiano"),
        ("pt", "Português"),
        ("ru", "Русский"),
    ])
});

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("language already exists: {0}")]
    AlreadyExists(String),

    #[error("language not found: {0}")]
    UnknownLanguage(String),

    #[error("the base language cannot be deleted")]
    BaseLanguageProtected,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Backup(#[from] crate::backup::BackupError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInfo {
    pub code: String,
    pub display_name: String,
    pub file_count: usize,
    pub is_base: bool,
}

/// Human-readable name for a language code; unknown codes fall back to
/// the raw code.
pub fn display_name(code: &str) -> String {
    DISPLAY_NAMES
        .get(code)
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Enumerate language directories one level under the root.
pub fn list_languages(store: &TranslationStore) -> Result<Vec<LanguageInfo>, RegistryError> {
    let codes = match store.list_language_dirs() {
        Ok(codes) => codes,
        Err(StoreError::NotFound(_)) => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut languages = Vec::with_capacity(codes.len());
    for code in codes {
        let file_count = store.list_json_files(&code).map(|v| v.len()).unwrap_or(0);
        languages.push(LanguageInfo {
            display_name: display_name(&code),
            is_base: code == store.base_language(),
            file_count,
            code,
        });
    }
    Ok(languages)
}

/// Create a new language directory and bootstrap an empty-mirror
/// template for every base-language file.
pub fn create_language(store: &TranslationStore, code: &str) -> Result<usize, RegistryError> {
    if store.language_exists(code) {
        return Err(RegistryError::AlreadyExists(code.to_string()));
    }

    let base = store.base_language();
    let base_files = store.list_json_files(base)?;

    fs::create_dir_all(store.language_dir(code)).map_err(StoreError::Io)?;
    let mut created = 0;
    for file_name in &base_files {
        let baseline = store.read_tree(base, file_name)?;
        let template = empty_mirror(&baseline);
        store.write_tree(code, file_name, &template)?;
        created += 1;
    }

    info!("created language {code} with {created} template files");
    Ok(created)
}

/// Remove a language directory after snapshotting it to a timestamped
/// backup. The base language is protected.
pub fn delete_language(store: &TranslationStore, code: &str) -> Result<(), RegistryError> {
    if code == store.base_language() {
        return Err(RegistryError::BaseLanguageProtected);
    }
    if !store.language_exists(code) {
        return Err(RegistryError::UnknownLanguage(code.to_string()));
    }

    let dir = store.language_dir(code);
    let snapshot = snapshot_dir(&dir)?;
    fs::remove_dir_all(&dir).map_err(StoreError::Io)?;
    info!(
        "deleted language {code} (snapshot at {})",
        snapshot.display()
    );
    Ok(())
}
