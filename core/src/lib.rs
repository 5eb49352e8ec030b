pub mod backup;
pub mod export;
pub mod registry;
pub mod stats;
pub mod store;
pub mod sync;
pub mod template;
pub mod translate;
pub mod tree;
pub mod validator;

pub use backup::{backup_and_swap, snapshot_dir, BackupOutcome};
pub use export::{export_languages, ExportError, ExportSummary, ExportedLanguage};
pub use registry::{
    create_language, delete_language, display_name, list_languages, LanguageInfo, RegistryError,
};
pub use stats::{count_keys, language_stats, FileStats, KeyCounts, LanguageStats};
pub use store::{StoreError, TranslationStore, DEFAULT_BASE_LANGUAGE};
pub use sync::{sync_all, sync_language, sync_trees, SyncError, SyncOutcome, SyncReport};
pub use template::empty_mirror;
pub use translate::fill::{fill_language, FillError, FillSummary};
pub use translate::{describe_engines, Engine, EngineConfig, EngineSelector};
pub use tree::Tree;
pub use validator::{IssueLevel, LanguageValidator, ValidationIssue, ValidationReport};
