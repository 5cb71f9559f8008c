//! Command dispatch and the thin orchestration each command performs over
//! the core engine.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use super::args::{
    Arguments, Command, CommonArgs, RestoreCommand, StatusCommand, TransformCommand,
    TranslateCommand,
};
use super::{ExitStatus, report};
use crate::adapter::{FrameworkAdapter, extract_from_files, restore_files};
use crate::assign::{IdentifierAssigner, seed_ids_from_source};
use crate::batch::{BatchOrchestrator, BatchOutcome, LlmClient, translate_entries};
use crate::config::{CONFIG_FILE_NAME, Config, default_config_json, load_config};
use crate::core::ExtractedString;
use crate::core::scan::scan_files;
use crate::locale::LocaleMap;
use crate::transform::Transform;
use crate::utils::is_valid_translation;
use crate::workfiles::WorkFiles;

pub fn run_cli(args: Arguments) -> Result<ExitStatus> {
    match args.command {
        Some(Command::Transform(cmd)) => transform(cmd),
        Some(Command::Restore(cmd)) => restore(cmd),
        Some(Command::Translate(cmd)) => translate(cmd),
        Some(Command::Status(cmd)) => status(cmd),
        Some(Command::Init) => init(),
        None => {
            anyhow::bail!("No command provided. Use --help to see available commands.")
        }
    }
}

fn init() -> Result<ExitStatus> {
    let config_path = Path::new(CONFIG_FILE_NAME);
    if config_path.exists() {
        anyhow::bail!("{} already exists", CONFIG_FILE_NAME);
    }
    fs::write(config_path, default_config_json()?)?;
    report::success(&format!("created {}", CONFIG_FILE_NAME));
    Ok(ExitStatus::Success)
}

/// Load config from the working directory and fold in CLI overrides.
fn load_merged_config(common: &CommonArgs) -> Result<(Config, PathBuf)> {
    let root = std::env::current_dir().context("Failed to resolve working directory")?;
    let mut config = load_config(&root)?.config;
    if let Some(source_root) = &common.source_root {
        config.source_root = source_root.to_string_lossy().to_string();
    }
    if let Some(locales_root) = &common.locales_root {
        config.locales_root = locales_root.to_string_lossy().to_string();
    }
    config.validate()?;
    Ok((config, root))
}

fn locale_path(config: &Config, root: &Path, locale: &str) -> PathBuf {
    root.join(&config.locales_root).join(format!("{}.json", locale))
}

fn override_locale_path(config: &Config, root: &Path, locale: &str) -> Option<PathBuf> {
    config
        .override_locales_root
        .as_ref()
        .map(|dir| root.join(dir).join(format!("{}.json", locale)))
}

/// Every locale an entry must cover before it counts as translated.
fn required_locales(config: &Config) -> Vec<String> {
    let mut locales = vec![config.source_locale.clone()];
    locales.extend(config.target_locales.iter().cloned());
    locales
}

fn current_thread_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")
}

// ============================================================
// transform
// ============================================================

fn transform(cmd: TransformCommand) -> Result<ExitStatus> {
    let (config, root) = load_merged_config(&cmd.common)?;
    let adapter = FrameworkAdapter::from_config(&config)?;
    let files = scan_files(&root, &config);
    if files.is_empty() {
        report::warning("no source files found under the configured includes");
        return Ok(ExitStatus::Success);
    }

    let extractor = adapter.text_extractor();
    let mut extracted = extract_from_files(&extractor, &root, &files);
    if extracted.is_empty() {
        report::success("nothing to internationalize");
        return Ok(ExitStatus::Success);
    }

    // The primary locale file is read once, mutated in memory, and written
    // once at the end; a malformed file aborts before anything is touched.
    let primary_path = locale_path(&config, &root, &config.source_locale);
    let mut locale_map = LocaleMap::load(&primary_path)?;

    // Pre-seed uniqueness from the locale file(s) and from call sites
    // already present in source.
    let mut existing: HashSet<String> = locale_map.ids().cloned().collect();
    if let Some(over_path) = override_locale_path(&config, &root, &config.source_locale) {
        existing.extend(LocaleMap::load(&over_path)?.ids().cloned());
    }
    for file in &files {
        if let Ok(source) = fs::read_to_string(root.join(file)) {
            seed_ids_from_source(&source, &mut existing);
        }
    }

    let assigner = IdentifierAssigner::from_config(&config);
    let proposals = if cmd.offline {
        None
    } else {
        let client = LlmClient::new(config.llm.clone());
        if client.has_api_key() {
            let grouped = IdentifierAssigner::group_by_file(&extracted);
            let orchestrator = BatchOrchestrator::new(config.llm.max_concurrency);
            let runtime = current_thread_runtime()?;
            Some(runtime.block_on(assigner.propose_ids(&grouped, &client, &orchestrator)))
        } else {
            report::warning(&format!(
                "no API key in ${}; falling back to local identifier generation",
                config.llm.api_key_env
            ));
            None
        }
    };
    assigner.assign_all(&mut extracted, &mut existing, proposals.as_ref());

    // New locale entries and untranslated bookkeeping.
    let mut untranslated_entries: Vec<(String, String)> = Vec::new();
    for record in &extracted {
        if !locale_map.contains(&record.semantic_id) {
            locale_map.insert(record.semantic_id.clone(), record.message());
            untranslated_entries.push((record.semantic_id.clone(), record.message().to_string()));
        }
    }

    let transformer = adapter.transformer();
    let mut by_file: BTreeMap<String, Vec<ExtractedString>> = BTreeMap::new();
    for record in &extracted {
        by_file
            .entry(record.file_path.clone())
            .or_default()
            .push(record.clone());
    }

    let mut changed = 0usize;
    let mut failed = 0usize;
    for (file, records) in &by_file {
        match transformer.transform_file(&root, file, records, cmd.include_default) {
            Ok(Some(new_text)) => {
                if !cmd.dry_run {
                    fs::write(root.join(file), new_text)
                        .with_context(|| format!("Failed to write {}", file))?;
                }
                report::file_changed(file);
                changed += 1;
            }
            Ok(None) => {}
            Err(error) => {
                warn!(file = %file, error = %error, "transform failed; skipping file");
                failed += 1;
            }
        }
    }

    if !cmd.dry_run {
        locale_map.save()?;
        let workfiles = WorkFiles::in_dir(&root.join(&config.locales_root));
        workfiles.record_untranslated(&untranslated_entries, &config.source_locale)?;
    }

    report::header("transform");
    report::rows(&[
        ("files scanned", files.len().to_string()),
        ("strings extracted", extracted.len().to_string()),
        ("new locale entries", untranslated_entries.len().to_string()),
        ("files rewritten", changed.to_string()),
        ("files failed", failed.to_string()),
    ]);
    if cmd.dry_run {
        report::warning("dry run: no files were written");
    }
    Ok(ExitStatus::Success)
}

// ============================================================
// restore
// ============================================================

fn restore(cmd: RestoreCommand) -> Result<ExitStatus> {
    let (config, root) = load_merged_config(&cmd.common)?;
    let adapter = FrameworkAdapter::from_config(&config)?;
    let locale = cmd.locale.as_deref().unwrap_or(&config.source_locale);

    let primary = locale_path(&config, &root, locale);
    let override_path = override_locale_path(&config, &root, locale);
    let locale_map = LocaleMap::load_merged(&primary, override_path.as_deref())?;
    if locale_map.is_empty() {
        report::warning(&format!("locale file {} is empty or missing", primary.display()));
    }

    let files = scan_files(&root, &config);
    let restorer = adapter.restore_transformer();
    let changed = restore_files(&restorer, &root, &files, &locale_map);

    for (file, new_text) in &changed {
        if !cmd.dry_run {
            fs::write(root.join(file), new_text)
                .with_context(|| format!("Failed to write {}", file))?;
        }
        report::file_changed(file);
    }

    report::header("restore");
    report::rows(&[
        ("locale", locale.to_string()),
        ("files scanned", files.len().to_string()),
        ("files restored", changed.len().to_string()),
    ]);
    if cmd.dry_run {
        report::warning("dry run: no files were written");
    }
    Ok(ExitStatus::Success)
}

// ============================================================
// translate
// ============================================================

fn translate(cmd: TranslateCommand) -> Result<ExitStatus> {
    let (config, root) = load_merged_config(&cmd.common)?;
    let targets: Vec<String> = match &cmd.target {
        Some(target) => vec![target.clone()],
        None => config.target_locales.clone(),
    };

    let client = LlmClient::new(config.llm.clone());
    if !client.has_api_key() {
        anyhow::bail!(
            "translate needs an API key in ${}; set it and re-run",
            config.llm.api_key_env
        );
    }

    let workfiles = WorkFiles::in_dir(&root.join(&config.locales_root));
    let orchestrator = BatchOrchestrator::new(config.llm.max_concurrency);
    let runtime = current_thread_runtime()?;
    let required = required_locales(&config);

    for target in &targets {
        // Reloaded per target: the previous pass may have graduated entries.
        let untranslated = workfiles.load_untranslated()?;
        let entries: Vec<(String, String)> = untranslated
            .iter()
            .filter_map(|(id, entry)| {
                let target_done = entry
                    .get(target)
                    .and_then(|v| v.as_str())
                    .is_some_and(is_valid_translation);
                if target_done {
                    return None;
                }
                let source = entry.get(&config.source_locale)?.as_str()?;
                Some((id.clone(), source.to_string()))
            })
            .collect();
        if entries.is_empty() {
            report::success(&format!("{}: nothing to translate", target));
            continue;
        }

        let outcome = runtime.block_on(translate_entries(
            &client,
            &orchestrator,
            &entries,
            &config.source_locale,
            target,
            config.llm.batch_size,
        ));

        let summary = workfiles.apply_batch_results(&outcome.results, target, &required)?;

        // Fold translated texts into the target locale file as well.
        let target_path = locale_path(&config, &root, target);
        let mut target_map = LocaleMap::load(&target_path)?;
        for result in &outcome.results {
            let BatchOutcome::Ok(batch) = result else {
                continue;
            };
            for (id, value) in batch {
                if let Some(text) = value.as_str()
                    && is_valid_translation(text)
                {
                    target_map.insert(id.clone(), text);
                }
            }
        }
        target_map.save()?;

        report::header(&format!("translate → {}", target));
        report::rows(&[
            ("entries submitted", entries.len().to_string()),
            ("entries translated", summary.translated.to_string()),
            ("batches failed", summary.failed_batches.to_string()),
            ("entries graduated", summary.graduated.to_string()),
            ("still untranslated", summary.still_untranslated.to_string()),
        ]);
        if summary.failed_batches > 0 {
            report::warning(&format!(
                "{} batch(es) kept their original content; re-run translate to retry",
                summary.failed_batches
            ));
        }
    }

    Ok(ExitStatus::Success)
}

// ============================================================
// status
// ============================================================

fn status(cmd: StatusCommand) -> Result<ExitStatus> {
    let (config, root) = load_merged_config(&cmd.common)?;
    let workfiles = WorkFiles::in_dir(&root.join(&config.locales_root));
    let untranslated = workfiles.load_untranslated()?;
    let translations = workfiles.load_translations()?;

    report::header("status");
    let mut entries = vec![
        ("untranslated", untranslated.len().to_string()),
        ("translated", translations.len().to_string()),
    ];
    let mut locale_counts = Vec::new();
    for locale in std::iter::once(&config.source_locale).chain(config.target_locales.iter()) {
        let path = locale_path(&config, &root, locale);
        let count = match LocaleMap::load(&path) {
            Ok(map) => map.len().to_string(),
            Err(_) => "unreadable".to_string(),
        };
        locale_counts.push((locale.clone(), count));
    }
    for (locale, count) in &locale_counts {
        entries.push((locale.as_str(), count.clone()));
    }
    report::rows(&entries);
    Ok(ExitStatus::Success)
}
