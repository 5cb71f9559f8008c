//! Identifier assignment over extracted strings.

use std::collections::{BTreeMap, HashMap, HashSet};

use futures::future::join_all;
use tracing::warn;

use crate::assign::prefix::directory_prefix;
use crate::assign::semantic::{sanitize_segment, semantic_part};
use crate::batch::{BatchOrchestrator, LlmClient};
use crate::config::Config;
use crate::core::ExtractedString;

pub struct IdentifierAssigner {
    anchor_dir: String,
    dictionary: HashMap<String, String>,
}

impl IdentifierAssigner {
    pub fn new(anchor_dir: impl Into<String>, dictionary: HashMap<String, String>) -> Self {
        Self {
            anchor_dir: anchor_dir.into(),
            dictionary,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.anchor_dir.clone(), config.phrase_dictionary.clone())
    }

    /// Group messages by file, in record order, for the LLM batch call.
    pub fn group_by_file(extracted: &[ExtractedString]) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for record in extracted {
            grouped
                .entry(record.file_path.clone())
                .or_default()
                .push(record.message().to_string());
        }
        grouped
    }

    /// Fill `semantic_id` on every record.
    ///
    /// Records with identical messages converge onto the same identifier;
    /// otherwise the id is `prefix__semantic`, made unique against
    /// `existing` with `_1`, `_2`, … suffixes. `proposals` maps file paths
    /// to LLM-proposed semantic parts aligned with that file's records in
    /// order; files absent from the map fall back to local generation.
    pub fn assign_all(
        &self,
        extracted: &mut [ExtractedString],
        existing: &mut HashSet<String>,
        proposals: Option<&HashMap<String, Vec<String>>>,
    ) {
        let mut by_message: HashMap<String, String> = HashMap::new();
        let mut file_positions: HashMap<String, usize> = HashMap::new();

        for record in extracted.iter_mut() {
            let position = file_positions.entry(record.file_path.clone()).or_insert(0);
            let proposal = proposals
                .and_then(|p| p.get(&record.file_path))
                .and_then(|parts| parts.get(*position))
                .map(|part| sanitize_segment(part, true))
                .filter(|part| !part.is_empty());
            *position += 1;

            let message = record.message().to_string();
            if let Some(id) = by_message.get(&message) {
                record.semantic_id = id.clone();
                continue;
            }

            let semantic =
                proposal.unwrap_or_else(|| semantic_part(&message, &self.dictionary));
            let prefix = directory_prefix(&record.file_path, &self.anchor_dir);
            let candidate = if prefix.is_empty() {
                semantic
            } else {
                format!("{}__{}", prefix, semantic)
            };
            let id = unique_id(candidate, existing);
            by_message.insert(message, id.clone());
            record.semantic_id = id;
        }
    }

    /// Local-only assignment for one file's texts, in order.
    pub fn assign_local(
        &self,
        file_path: &str,
        texts: &[String],
        existing: &mut HashSet<String>,
    ) -> Vec<String> {
        texts
            .iter()
            .map(|text| {
                let semantic = semantic_part(text, &self.dictionary);
                let prefix = directory_prefix(file_path, &self.anchor_dir);
                let candidate = if prefix.is_empty() {
                    semantic
                } else {
                    format!("{}__{}", prefix, semantic)
                };
                unique_id(candidate, existing)
            })
            .collect()
    }

    /// Ask the LLM for semantic-part proposals, one request per file,
    /// bounded by the orchestrator. Files whose proposal count does not
    /// match the text count are logged and dropped, which makes the whole
    /// file fall back to local generation in [`Self::assign_all`].
    pub async fn propose_ids(
        &self,
        grouped: &BTreeMap<String, Vec<String>>,
        client: &LlmClient,
        orchestrator: &BatchOrchestrator,
    ) -> HashMap<String, Vec<String>> {
        let futures: Vec<_> = grouped
            .iter()
            .map(|(file, texts)| async move {
                let result = orchestrator
                    .submit(async {
                        client
                            .generate_ids(texts)
                            .await
                            .map_err(anyhow::Error::from)
                    })
                    .await;
                (file.clone(), texts.len(), result)
            })
            .collect();

        let mut proposals = HashMap::new();
        for (file, expected, result) in join_all(futures).await {
            match result {
                Ok(ids) => {
                    if let Some(accepted) = accept_proposal(&file, expected, ids) {
                        proposals.insert(file, accepted);
                    }
                }
                Err(error) => {
                    warn!(file = %file, error = %error, "id generation failed; using local generation");
                }
            }
        }
        proposals
    }
}

/// Validate an LLM proposal batch: the id count must match the text count
/// exactly, otherwise the whole file is rejected.
fn accept_proposal(file: &str, expected: usize, ids: Vec<String>) -> Option<Vec<String>> {
    if ids.len() == expected {
        Some(ids)
    } else {
        warn!(
            file = %file,
            expected,
            received = ids.len(),
            "LLM id count mismatch; falling back to local generation for this file"
        );
        None
    }
}

/// Make a candidate unique against the existing-id set and claim it.
fn unique_id(candidate: String, existing: &mut HashSet<String>) -> String {
    let id = if existing.contains(&candidate) {
        let mut n = 1usize;
        loop {
            let suffixed = format!("{}_{}", candidate, n);
            if !existing.contains(&suffixed) {
                break suffixed;
            }
            n += 1;
        }
    } else {
        candidate
    };
    existing.insert(id.clone());
    id
}
