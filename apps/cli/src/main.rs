use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use loc_manager_core::store::{TranslationStore, DEFAULT_BASE_LANGUAGE};
use loc_manager_core::translate::{describe_engines, EngineConfig, EngineSelector};
use loc_manager_core::validator::LanguageValidator;
use loc_manager_core::{
    create_language, delete_language, export_languages, fill_language, language_stats,
    list_languages, sync_all, sync_language,
};

#[derive(Parser)]
#[command(name = "loc-manager", version, about = "Manage JSON translation trees")]
struct Cli {
    /// Root directory holding one subdirectory per language
    #[arg(long, default_value = "translations")]
    root: PathBuf,

    /// Language the other languages are measured against
    #[arg(long, default_value = DEFAULT_BASE_LANGUAGE)]
    base: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List languages with their file counts
    List,
    /// Create a new language mirroring the base structure
    Create { code: String },
    /// Delete a language (a snapshot is taken first)
    Delete { code: String },
    /// Add missing keys from the base language to the others
    Sync {
        /// Only sync this language instead of all of them
        #[arg(long)]
        language: Option<String>,
        /// Write a JSON report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Show completeness statistics
    Stats {
        /// Limit to one language
        code: Option<String>,
    },
    /// Check structure and translation quality
    Check {
        /// Limit to one language
        code: Option<String>,
        /// Write a JSON report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Machine-translate the empty values of a language
    Translate { code: String },
    /// Copy languages into a timestamped hand-off directory
    Export {
        codes: Vec<String>,
        /// Destination root for the export directory
        #[arg(long, default_value = ".")]
        dest: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let store = TranslationStore::new(&cli.root).with_base_language(&cli.base);

    match cli.command {
        Command::List => {
            let languages = list_languages(&store)?;
            if languages.is_empty() {
                println!("no languages under {}", cli.root.display());
            }
            for info in languages {
                let marker = if info.is_base { " (base)" } else { "" };
                println!(
                    "{:<8} {:<22} {} files{marker}",
                    info.code, info.display_name, info.file_count
                );
            }
        }
        Command::Create { code } => {
            let files = create_language(&store, &code)?;
            println!("created {code} with {files} files");
        }
        Command::Delete { code } => {
            delete_language(&store, &code)?;
            println!("deleted {code}");
        }
        Command::Sync { language, report } => {
            let result = match language {
                Some(code) => sync_language(&store, &code)?,
                None => sync_all(&store)?,
            };
            println!(
                "synced {} languages: {} files added, {} fields added",
                result.languages_processed, result.files_added, result.fields_added
            );
            for entry in &result.errors {
                eprintln!(
                    "  error in {}{}: {}",
                    entry.language,
                    entry
                        .file
                        .as_deref()
                        .map(|f| format!("/{f}"))
                        .unwrap_or_default(),
                    entry.message
                );
            }
            if let Some(path) = report {
                result.write_to(&path)?;
                info!("sync report written to {}", path.display());
            }
        }
        Command::Stats { code } => {
            let codes = match code {
                Some(code) => vec![code],
                None => list_languages(&store)?
                    .into_iter()
                    .map(|info| info.code)
                    .collect(),
            };
            for code in codes {
                let stats = language_stats(&store, &code);
                println!(
                    "{:<8} {:>3}%  {}/{} translated, {} empty",
                    stats.code, stats.percentage, stats.translated, stats.total, stats.empty
                );
                for file in &stats.files {
                    println!(
                        "    {:<24} {:>3}%  {}/{}",
                        file.name, file.percentage, file.translated, file.total
                    );
                }
            }
        }
        Command::Check { code, report } => {
            let mut validator = LanguageValidator::new(&store);
            match code {
                Some(code) => validator.validate_language(&code)?,
                None => validator.validate_all()?,
            }
            let summary = validator.summary();
            for issue in validator.issues() {
                println!("[{:?}] {}: {}", issue.level, issue.language, issue.message);
            }
            println!(
                "{} issues ({} fatal, {} errors, {} warnings)",
                summary.total, summary.fatal, summary.errors, summary.warnings
            );
            let failed = summary.fatal > 0 || summary.errors > 0;
            if let Some(path) = report {
                let rendered = validator.into_report();
                rendered.write_to(&path)?;
                info!("validation report written to {}", path.display());
            }
            if failed {
                std::process::exit(1);
            }
        }
        Command::Translate { code } => {
            let selector = EngineSelector::new(EngineConfig::from_env());
            describe_engines(&selector);
            let summary = fill_language(&store, &selector, &code)
                .await
                .with_context(|| format!("translating {code}"))?;
            println!(
                "{}: {} translated, {} failed across {} files",
                summary.language, summary.translated, summary.failed, summary.files_processed
            );
        }
        Command::Export { codes, dest } => {
            let summary = export_languages(&store, &codes, &dest)?;
            println!("exported to {}", summary.export_dir.display());
            for lang in &summary.languages {
                println!("  {:<8} {} files", lang.code, lang.file_count);
            }
            for code in &summary.skipped {
                eprintln!("  skipped unknown language {code}");
            }
        }
    }

    Ok(())
}
