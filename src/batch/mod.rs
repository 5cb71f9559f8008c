//! Bounded-concurrency batch processing.
//!
//! The [`BatchOrchestrator`] is a semaphore-gated task queue used by every
//! LLM-assisted step. The [`client`] module layers a retrying HTTP client
//! on top of it; [`translate`] chunks ordered collections into fixed-size
//! batches with ordering and partial-failure guarantees.

pub mod client;
pub mod orchestrator;
pub mod translate;

pub use client::{LlmClient, LlmError, backoff_delay};
pub use orchestrator::{BatchOrchestrator, OrchestratorStatus};
pub use translate::{BatchOutcome, TranslateReport, run_batches, translate_entries};
