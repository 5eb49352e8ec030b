/// Filesystem access for the translations directory
///
/// Layout is one directory per language code under the root, each
/// holding flat JSON documents named identically across languages.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::backup::{backup_and_swap, BackupError};
use crate::tree::Tree;

pub const DEFAULT_BASE_LANGUAGE: &str = "en";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Backup(#[from] BackupError),
}

#[derive(Debug, Clone)]
pub struct TranslationStore {
    root: PathBuf,
    base_language: String,
}

impl TranslationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_language: DEFAULT_BASE_LANGUAGE.to_string(),
        }
    }

    pub fn with_base_language(mut self, code: impl Into<String>) -> Self {
        self.base_language = code.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_language(&self) -> &str {
        &self.base_language
    }

    pub fn language_dir(&self, code: &str) -> PathBuf {
        self.root.join(code)
    }

    pub fn file_path(&self, code: &str, file_name: &str) -> PathBuf {
        self.language_dir(code).join(file_name)
    }

    pub fn language_exists(&self, code: &str) -> bool {
        self.language_dir(code).is_dir()
    }

    /// JSON file names (not paths) directly under a language directory,
    /// sorted for deterministic processing order.
    pub fn list_json_files(&self, code: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.language_dir(code);
        if !dir.is_dir() {
            return Err(StoreError::NotFound(dir.display().to_string()));
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            {
                if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Language codes present under the root, one directory level deep.
    pub fn list_language_dirs(&self) -> Result<Vec<String>, StoreError> {
        if !self.root.is_dir() {
            return Err(StoreError::NotFound(self.root.display().to_string()));
        }

        let mut codes = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    // snapshots from deleted languages live next to the
                    // real directories, keep them out of the listing
                    if name.starts_with('.') || name.contains(".bak.") {
                        continue;
                    }
                    codes.push(name.to_string());
                }
            }
        }
        codes.sort();
        Ok(codes)
    }

    pub fn read_tree(&self, code: &str, file_name: &str) -> Result<Tree, StoreError> {
        let path = self.file_path(code, file_name);
        if !path.is_file() {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(&path)?;
        Tree::from_json(&content).map_err(|source| StoreError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Write a tree through the backup-and-swap path: existing content
    /// is copied to a timestamped .bak sibling before the rename.
    pub fn write_tree(&self, code: &str, file_name: &str, tree: &Tree) -> Result<(), StoreError> {
        let path = self.file_path(code, file_name);
        let mut rendered = tree.to_pretty_json().map_err(|source| StoreError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        rendered.push('\n');
        debug!("writing {}", path.display());
        backup_and_swap(&path, rendered.as_bytes())?;
        Ok(())
    }
}
