//! Untranslated/translations working files.
//!
//! Both files share one shape: `{identifier: {localeCode: text}}`. An
//! entry graduates from the untranslated file to the translations file
//! once every configured locale's text passes the validity check
//! (non-empty after stripping punctuation, at least one letter or digit in
//! any script).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use tracing::warn;

use crate::batch::BatchOutcome;
use crate::utils::is_valid_translation;

pub const UNTRANSLATED_FILE: &str = "untranslated.json";
pub const TRANSLATIONS_FILE: &str = "translations.json";

pub struct WorkFiles {
    pub untranslated_path: PathBuf,
    pub translations_path: PathBuf,
}

/// Summary of one apply pass over batch outcomes.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub translated: usize,
    pub graduated: usize,
    pub failed_batches: usize,
    pub still_untranslated: usize,
}

impl WorkFiles {
    pub fn in_dir(locales_root: &Path) -> Self {
        Self {
            untranslated_path: locales_root.join(UNTRANSLATED_FILE),
            translations_path: locales_root.join(TRANSLATIONS_FILE),
        }
    }

    pub fn load_untranslated(&self) -> Result<Map<String, Value>> {
        load_entries(&self.untranslated_path)
    }

    pub fn load_translations(&self) -> Result<Map<String, Value>> {
        load_entries(&self.translations_path)
    }

    /// Merge newly extracted entries into the untranslated file. Entries
    /// already tracked in either working file are left alone.
    pub fn record_untranslated(
        &self,
        entries: &[(String, String)],
        source_locale: &str,
    ) -> Result<usize> {
        let mut untranslated = self.load_untranslated()?;
        let translations = self.load_translations()?;

        let mut added = 0usize;
        for (id, text) in entries {
            if untranslated.contains_key(id) || translations.contains_key(id) {
                continue;
            }
            let mut entry = Map::new();
            entry.insert(source_locale.to_string(), Value::String(text.clone()));
            untranslated.insert(id.clone(), Value::Object(entry));
            added += 1;
        }

        if added > 0 {
            save_entries(&self.untranslated_path, &untranslated)?;
        }
        Ok(added)
    }

    /// Fold batch outcomes back into the working files.
    ///
    /// Successful batches fill in the target locale's text; entries whose
    /// locale set is now complete graduate to the translations file.
    /// Failed batches keep their original entries untranslated: counted,
    /// never dropped.
    pub fn apply_batch_results(
        &self,
        outcomes: &[BatchOutcome<Map<String, Value>>],
        target_locale: &str,
        required_locales: &[String],
    ) -> Result<ApplySummary> {
        let mut untranslated = self.load_untranslated()?;
        let mut translations = self.load_translations()?;
        let mut summary = ApplySummary::default();

        for (index, outcome) in outcomes.iter().enumerate() {
            let translated = match outcome {
                BatchOutcome::Ok(translated) => translated,
                BatchOutcome::Failed { original, error } => {
                    summary.failed_batches += 1;
                    warn!(
                        batch = index,
                        entries = original.len(),
                        error = %error,
                        "batch kept untranslated"
                    );
                    continue;
                }
            };

            for (id, value) in translated {
                let Some(text) = value.as_str() else {
                    warn!(batch = index, key = %id, "non-string translation value skipped");
                    continue;
                };
                if !is_valid_translation(text) {
                    warn!(batch = index, key = %id, "invalid translation value skipped");
                    continue;
                }
                let Some(Value::Object(entry)) = untranslated.get_mut(id) else {
                    warn!(batch = index, key = %id, "translated key not in untranslated set");
                    continue;
                };
                entry.insert(target_locale.to_string(), Value::String(text.to_string()));
                summary.translated += 1;
            }
        }

        // Graduate complete entries.
        let ids: Vec<String> = untranslated.keys().cloned().collect();
        for id in ids {
            let complete = untranslated
                .get(&id)
                .is_some_and(|entry| entry_is_complete(entry, required_locales));
            if complete
                && let Some(entry) = untranslated.shift_remove(&id)
            {
                translations.insert(id, entry);
                summary.graduated += 1;
            }
        }
        summary.still_untranslated = untranslated.len();

        save_entries(&self.untranslated_path, &untranslated)?;
        save_entries(&self.translations_path, &translations)?;
        Ok(summary)
    }
}

/// An entry is complete iff every required locale's text is valid.
pub fn entry_is_complete(entry: &Value, required_locales: &[String]) -> bool {
    let Value::Object(map) = entry else {
        return false;
    };
    required_locales.iter().all(|locale| {
        map.get(locale)
            .and_then(Value::as_str)
            .is_some_and(is_valid_translation)
    })
}

fn load_entries(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read working file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content).with_context(|| {
        format!(
            "Failed to parse working file {}; fix the JSON by hand and re-run",
            path.display()
        )
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!(
            "Working file {} must contain a JSON object at the top level",
            path.display()
        ),
    }
}

fn save_entries(path: &Path, entries: &Map<String, Value>) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let mut text = serde_json::to_string_pretty(&Value::Object(entries.clone()))
        .context("Failed to serialize working file")?;
    if !text.ends_with('\n') {
        text.push('\n');
    }
    fs::write(path, text).with_context(|| format!("Failed to write: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    fn locales() -> Vec<String> {
        vec!["zh".to_string(), "en".to_string()]
    }

    #[test]
    fn test_record_untranslated() {
        let dir = tempdir().unwrap();
        let files = WorkFiles::in_dir(dir.path());

        let added = files
            .record_untranslated(
                &[
                    ("a__b".to_string(), "确认".to_string()),
                    ("c__d".to_string(), "取消".to_string()),
                ],
                "zh",
            )
            .unwrap();
        assert_eq!(added, 2);

        // Re-recording is idempotent.
        let added = files
            .record_untranslated(&[("a__b".to_string(), "确认".to_string())], "zh")
            .unwrap();
        assert_eq!(added, 0);

        let untranslated = files.load_untranslated().unwrap();
        assert_eq!(untranslated["a__b"]["zh"], "确认");
    }

    #[test]
    fn test_entry_is_complete() {
        assert!(entry_is_complete(&json!({"zh": "确认", "en": "Confirm"}), &locales()));
        assert!(!entry_is_complete(&json!({"zh": "确认"}), &locales()));
        assert!(!entry_is_complete(&json!({"zh": "确认", "en": ""}), &locales()));
        assert!(!entry_is_complete(&json!({"zh": "确认", "en": "!!!"}), &locales()));
        assert!(!entry_is_complete(&json!("not an object"), &locales()));
    }

    #[test]
    fn test_apply_batch_results_graduates_complete_entries() {
        let dir = tempdir().unwrap();
        let files = WorkFiles::in_dir(dir.path());
        files
            .record_untranslated(
                &[
                    ("a__b".to_string(), "确认".to_string()),
                    ("c__d".to_string(), "取消".to_string()),
                ],
                "zh",
            )
            .unwrap();

        let mut batch = Map::new();
        batch.insert("a__b".to_string(), Value::String("Confirm".to_string()));
        let outcomes = vec![BatchOutcome::Ok(batch)];

        let summary = files.apply_batch_results(&outcomes, "en", &locales()).unwrap();
        assert_eq!(summary.translated, 1);
        assert_eq!(summary.graduated, 1);
        assert_eq!(summary.failed_batches, 0);
        assert_eq!(summary.still_untranslated, 1);

        let translations = files.load_translations().unwrap();
        assert_eq!(translations["a__b"]["en"], "Confirm");
        let untranslated = files.load_untranslated().unwrap();
        assert!(untranslated.contains_key("c__d"));
        assert!(!untranslated.contains_key("a__b"));
    }

    #[test]
    fn test_failed_batch_keeps_entries() {
        let dir = tempdir().unwrap();
        let files = WorkFiles::in_dir(dir.path());
        files
            .record_untranslated(&[("a__b".to_string(), "确认".to_string())], "zh")
            .unwrap();

        let mut original = Map::new();
        original.insert("a__b".to_string(), Value::String("确认".to_string()));
        let outcomes = vec![BatchOutcome::Failed {
            original,
            error: "timeout".to_string(),
        }];

        let summary = files.apply_batch_results(&outcomes, "en", &locales()).unwrap();
        assert_eq!(summary.failed_batches, 1);
        assert_eq!(summary.translated, 0);
        assert_eq!(summary.still_untranslated, 1);
        assert!(files.load_untranslated().unwrap().contains_key("a__b"));
    }

    #[test]
    fn test_invalid_translation_not_applied() {
        let dir = tempdir().unwrap();
        let files = WorkFiles::in_dir(dir.path());
        files
            .record_untranslated(&[("a__b".to_string(), "确认".to_string())], "zh")
            .unwrap();

        let mut batch = Map::new();
        batch.insert("a__b".to_string(), Value::String("...".to_string()));
        let outcomes = vec![BatchOutcome::Ok(batch)];

        let summary = files.apply_batch_results(&outcomes, "en", &locales()).unwrap();
        assert_eq!(summary.translated, 0);
        assert_eq!(summary.graduated, 0);
    }

    #[test]
    fn test_malformed_working_file_is_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(UNTRANSLATED_FILE), "{broken").unwrap();
        let files = WorkFiles::in_dir(dir.path());
        assert!(files.load_untranslated().is_err());
    }
}
