//! Batch translation driver.
//!
//! An ordered collection of untranslated entries is chunked into
//! fixed-size batches and fanned out through the orchestrator. Results are
//! written into a slot vector pre-sized to the batch count, so
//! `results[i]` always corresponds to input batch `i` regardless of
//! completion order. A failed batch keeps its original content: graceful
//! degradation, counted and reported, never silent loss.

use std::future::Future;

use anyhow::Result;
use futures::future::join_all;
use serde_json::{Map, Value};
use tracing::warn;

use crate::batch::client::LlmClient;
use crate::batch::orchestrator::BatchOrchestrator;

/// Per-batch result: translated content, or the original content kept
/// after a batch-level failure. Represented as a value, never a throw, so
/// downstream aggregation is total over all batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome<T> {
    Ok(T),
    Failed { original: T, error: String },
}

impl<T> BatchOutcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, BatchOutcome::Ok(_))
    }

    /// The batch content regardless of outcome.
    pub fn content(&self) -> &T {
        match self {
            BatchOutcome::Ok(content) => content,
            BatchOutcome::Failed { original, .. } => original,
        }
    }
}

/// Run every batch through the orchestrator, preserving submission order
/// in the result vector.
pub async fn run_batches<T, F, Fut>(
    orchestrator: &BatchOrchestrator,
    batches: Vec<T>,
    run: F,
) -> Vec<BatchOutcome<T>>
where
    T: Clone,
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let count = batches.len();
    let mut slots: Vec<Option<BatchOutcome<T>>> = Vec::with_capacity(count);
    slots.resize_with(count, || None);

    let futures: Vec<_> = batches
        .into_iter()
        .enumerate()
        .map(|(index, batch)| {
            let original = batch.clone();
            let task = run(index, batch);
            async move {
                match orchestrator.submit(task).await {
                    Ok(result) => (index, BatchOutcome::Ok(result)),
                    Err(error) => {
                        warn!(batch = index, error = %error, "batch failed; keeping original content");
                        (
                            index,
                            BatchOutcome::Failed {
                                original,
                                error: error.to_string(),
                            },
                        )
                    }
                }
            }
        })
        .collect();

    // Indexed writes, never completion-order appends.
    for (index, outcome) in join_all(futures).await {
        slots[index] = Some(outcome);
    }

    slots
        .into_iter()
        .map(|slot| slot.expect("every batch writes its own slot"))
        .collect()
}

/// Summary of one translation run.
#[derive(Debug)]
pub struct TranslateReport {
    /// `results[i]` corresponds to input batch `i`.
    pub results: Vec<BatchOutcome<Map<String, Value>>>,
    pub translated_entries: usize,
    pub failed_batches: usize,
}

/// Chunk `entries` (identifier, source text) into batches of `batch_size`
/// and translate them concurrently.
pub async fn translate_entries(
    client: &LlmClient,
    orchestrator: &BatchOrchestrator,
    entries: &[(String, String)],
    source_locale: &str,
    target_locale: &str,
    batch_size: usize,
) -> TranslateReport {
    let batch_size = batch_size.max(1);
    let batches: Vec<Map<String, Value>> = entries
        .chunks(batch_size)
        .map(|chunk| {
            chunk
                .iter()
                .map(|(id, text)| (id.clone(), Value::String(text.clone())))
                .collect()
        })
        .collect();

    let results = run_batches(orchestrator, batches, |_, batch| async move {
        let translated = client
            .translate_batch(&batch, source_locale, target_locale)
            .await?;
        Ok(translated)
    })
    .await;

    let translated_entries = results
        .iter()
        .filter(|r| r.is_ok())
        .map(|r| r.content().len())
        .sum();
    let failed_batches = results.iter().filter(|r| !r.is_ok()).count();

    TranslateReport {
        results,
        translated_entries,
        failed_batches,
    }
}
