/// Translation validation: structural parity with the baseline plus
/// quality heuristics (empty values, verbatim copies, interpolation
/// variables, length ratio).
use std::path::Path;

use chrono::Utc;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::backup::backup_and_swap;
use crate::store::{StoreError, TranslationStore};
use crate::tree::Tree;

static INTERPOLATION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("valid interpolation regex"));

const MIN_LENGTH_RATIO: f64 = 0.3;
const MAX_LENGTH_RATIO: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueLevel {
    Fatal,
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub language: String,
    pub level: IssueLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub fatal: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub timestamp: String,
    pub summary: ValidationSummary,
    pub issues: Vec<ValidationIssue>,
}

#[derive(Debug)]
pub struct LanguageValidator<'a> {
    store: &'a TranslationStore,
    issues: Vec<ValidationIssue>,
}

impl<'a> LanguageValidator<'a> {
    pub fn new(store: &'a TranslationStore) -> Self {
        Self {
            store,
            issues: Vec::new(),
        }
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Validate every non-base language under the root.
    pub fn validate_all(&mut self) -> Result<(), StoreError> {
        let base = self.store.base_language().to_string();
        for code in self.store.list_language_dirs()? {
            if code != base {
                self.validate_language(&code)?;
            }
        }
        Ok(())
    }

    /// Validate one language against the baseline file set.
    pub fn validate_language(&mut self, code: &str) -> Result<(), StoreError> {
        if !self.store.language_exists(code) {
            self.add_issue(code, IssueLevel::Fatal, "language directory does not exist");
            return Ok(());
        }

        let base = self.store.base_language().to_string();
        for file_name in self.store.list_json_files(&base)? {
            self.validate_file(code, &file_name);
        }
        Ok(())
    }

    fn validate_file(&mut self, code: &str, file_name: &str) {
        let base = self.store.base_language().to_string();
        let baseline = match self.store.read_tree(&base, file_name) {
            Ok(tree) => tree,
            Err(err) => {
                self.add_issue(&base, IssueLevel::Error, format!("{file_name}: {err}"));
                return;
            }
        };

        let target = match self.store.read_tree(code, file_name) {
            Ok(tree) => tree,
            Err(StoreError::NotFound(_)) => {
                self.add_issue(code, IssueLevel::Error, format!("{file_name}: file missing"));
                return;
            }
            Err(err) => {
                self.add_issue(code, IssueLevel::Error, format!("{file_name}: {err}"));
                return;
            }
        };

        self.check_structure(code, file_name, &baseline, &target, "");
        self.check_quality(code, file_name, &baseline, &target, "");
    }

    fn check_structure(
        &mut self,
        code: &str,
        file_name: &str,
        baseline: &Tree,
        target: &Tree,
        path: &str,
    ) {
        let (Tree::Node(base_map), Tree::Node(target_map)) = (baseline, target) else {
            return;
        };

        for (key, base_value) in base_map {
            let current = join_path(path, key);
            match target_map.get(key) {
                None => {
                    self.add_issue(
                        code,
                        IssueLevel::Error,
                        format!("{file_name}: missing key \"{current}\""),
                    );
                }
                Some(target_value) => {
                    if let Tree::Node(_) = base_value {
                        if target_value.is_leaf() {
                            self.add_issue(
                                code,
                                IssueLevel::Error,
                                format!("{file_name}: type mismatch at \"{current}\""),
                            );
                        } else {
                            self.check_structure(
                                code,
                                file_name,
                                base_value,
                                target_value,
                                &current,
                            );
                        }
                    }
                }
            }
        }
    }

    fn check_quality(
        &mut self,
        code: &str,
        file_name: &str,
        baseline: &Tree,
        target: &Tree,
        path: &str,
    ) {
        let (Tree::Node(base_map), Tree::Node(target_map)) = (baseline, target) else {
            return;
        };

        for (key, base_value) in base_map {
            let current = join_path(path, key);
            let Some(target_value) = target_map.get(key) else {
                continue;
            };

            match (base_value, target_value) {
                (Tree::Node(_), Tree::Node(_)) => {
                    self.check_quality(code, file_name, base_value, target_value, &current);
                }
                (Tree::Leaf(base_text), Tree::Leaf(target_text)) => {
                    if target_text.trim().is_empty() {
                        self.add_issue(
                            code,
                            IssueLevel::Warning,
                            format!("{file_name}: \"{current}\" is empty"),
                        );
                        continue;
                    }

                    if target_text == base_text {
                        self.add_issue(
                            code,
                            IssueLevel::Warning,
                            format!("{file_name}: \"{current}\" possibly untranslated"),
                        );
                    }

                    self.check_interpolation(code, file_name, &current, base_text, target_text);
                    self.check_length(code, file_name, &current, base_text, target_text);
                }
                _ => {}
            }
        }
    }

    fn check_interpolation(
        &mut self,
        code: &str,
        file_name: &str,
        path: &str,
        base_text: &str,
        target_text: &str,
    ) {
        let base_vars = extract_variables(base_text);
        let target_vars = extract_variables(target_text);

        let missing: Vec<&str> = base_vars
            .iter()
            .filter(|var| !target_vars.contains(var))
            .map(|var| var.as_str())
            .collect();
        if !missing.is_empty() {
            self.add_issue(
                code,
                IssueLevel::Error,
                format!(
                    "{file_name}: \"{path}\" missing variables: {}",
                    missing.join(", ")
                ),
            );
        }

        let extra: Vec<&str> = target_vars
            .iter()
            .filter(|var| !base_vars.contains(var))
            .map(|var| var.as_str())
            .collect();
        if !extra.is_empty() {
            self.add_issue(
                code,
                IssueLevel::Warning,
                format!(
                    "{file_name}: \"{path}\" extra variables: {}",
                    extra.join(", ")
                ),
            );
        }
    }

    fn check_length(
        &mut self,
        code: &str,
        file_name: &str,
        path: &str,
        base_text: &str,
        target_text: &str,
    ) {
        if base_text.is_empty() {
            return;
        }
        let ratio = target_text.chars().count() as f64 / base_text.chars().count() as f64;
        if ratio < MIN_LENGTH_RATIO {
            self.add_issue(
                code,
                IssueLevel::Warning,
                format!("{file_name}: \"{path}\" suspiciously short ({ratio:.2})"),
            );
        } else if ratio > MAX_LENGTH_RATIO {
            self.add_issue(
                code,
                IssueLevel::Warning,
                format!("{file_name}: \"{path}\" suspiciously long ({ratio:.2})"),
            );
        }
    }

    fn add_issue(&mut self, language: &str, level: IssueLevel, message: impl ToString) {
        self.issues.push(ValidationIssue {
            language: language.to_string(),
            level,
            message: message.to_string(),
        });
    }

    pub fn summary(&self) -> ValidationSummary {
        let mut summary = ValidationSummary {
            total: self.issues.len(),
            ..Default::default()
        };
        for issue in &self.issues {
            match issue.level {
                IssueLevel::Fatal => summary.fatal += 1,
                IssueLevel::Error => summary.errors += 1,
                IssueLevel::Warning => summary.warnings += 1,
            }
        }
        summary
    }

    pub fn into_report(self) -> ValidationReport {
        let summary = self.summary();
        ValidationReport {
            timestamp: Utc::now().to_rfc3339(),
            summary,
            issues: self.issues,
        }
    }
}

impl ValidationReport {
    /// Write the report as JSON; the conventional location is
    /// `translation-report.json` under the translations root.
    pub fn write_to(&self, path: &Path) -> Result<(), StoreError> {
        let rendered = serde_json::to_string_pretty(self).map_err(|source| StoreError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        backup_and_swap(path, rendered.as_bytes())?;
        info!("validation report written to {}", path.display());
        Ok(())
    }
}

fn extract_variables(text: &str) -> Vec<String> {
    INTERPOLATION_REGEX
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
