//! Bounded-concurrency task queue.
//!
//! All work runs as non-blocking asynchronous tasks on one logical
//! runtime; only network I/O is genuinely concurrent, bounded by
//! `max_concurrency`. The orchestrator never retries a task; retry policy
//! belongs to the caller (see [`super::client`]).

use std::future::Future;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use anyhow::Result;
use tokio::sync::Semaphore;

/// Point-in-time queue observability snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorStatus {
    pub running: usize,
    pub queued: usize,
    pub max_concurrency: usize,
}

/// Semaphore-gated task queue.
///
/// `max_concurrency` is fixed for the lifetime of the orchestrator; to
/// change it, construct a replacement; in-flight tasks on the old
/// instance are unaffected and drain naturally.
pub struct BatchOrchestrator {
    semaphore: Arc<Semaphore>,
    running: Arc<AtomicUsize>,
    queued: Arc<AtomicUsize>,
    max_concurrency: usize,
}

impl BatchOrchestrator {
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            running: Arc::new(AtomicUsize::new(0)),
            queued: Arc::new(AtomicUsize::new(0)),
            max_concurrency,
        }
    }

    /// Enqueue a task and resolve with its outcome.
    ///
    /// The task future is not polled until a concurrency slot frees up;
    /// when it settles, the slot is released immediately so the next
    /// queued task can start.
    pub async fn submit<T, F>(&self, task: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.queued.fetch_add(1, Ordering::SeqCst);
        let permit = self.semaphore.acquire().await;
        self.queued.fetch_sub(1, Ordering::SeqCst);
        let _permit = match permit {
            Ok(permit) => permit,
            Err(_) => anyhow::bail!("orchestrator semaphore closed"),
        };

        self.running.fetch_add(1, Ordering::SeqCst);
        let _guard = RunningGuard {
            running: Arc::clone(&self.running),
        };
        task.await
    }

    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            running: self.running.load(Ordering::SeqCst),
            queued: self.queued.load(Ordering::SeqCst),
            max_concurrency: self.max_concurrency,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }
}

struct RunningGuard {
    running: Arc<AtomicUsize>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_running_never_exceeds_max() {
        let orchestrator = BatchOrchestrator::new(3);
        let current = Arc::new(AtomicUsize::new(0));
        let observed_max = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..25)
            .map(|_| {
                let current = Arc::clone(&current);
                let observed_max = Arc::clone(&observed_max);
                orchestrator.submit(async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    observed_max.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();
        let results = join_all(tasks).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(observed_max.load(Ordering::SeqCst), 3);
        let status = orchestrator.status();
        assert_eq!(status.running, 0);
        assert_eq!(status.queued, 0);
    }

    #[tokio::test]
    async fn test_submit_propagates_failure() {
        let orchestrator = BatchOrchestrator::new(2);
        let ok = orchestrator.submit(async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: Result<()> = orchestrator
            .submit(async { anyhow::bail!("task failed") })
            .await;
        assert_eq!(err.unwrap_err().to_string(), "task failed");
    }

    #[tokio::test]
    async fn test_failed_task_frees_slot() {
        let orchestrator = BatchOrchestrator::new(1);
        let _: Result<()> = orchestrator.submit(async { anyhow::bail!("boom") }).await;
        // The slot must be free again or this would deadlock.
        let ok = orchestrator.submit(async { Ok(1) }).await;
        assert_eq!(ok.unwrap(), 1);
        assert_eq!(orchestrator.status().running, 0);
    }

    #[tokio::test]
    async fn test_status_reports_max_concurrency() {
        let orchestrator = BatchOrchestrator::new(5);
        assert_eq!(
            orchestrator.status(),
            OrchestratorStatus {
                running: 0,
                queued: 0,
                max_concurrency: 5
            }
        );
        // Zero is clamped so the queue can always drain.
        assert_eq!(BatchOrchestrator::new(0).max_concurrency(), 1);
    }
}
