//! Fixed-capacity worker pool for front-end startup tasks.
//!
//! # Responsibilities
//! - Run submitted tasks with at most `capacity` running at once
//! - Forward every task's reports to the supervisor channel
//! - Refuse submissions once shutdown has begun
//! - Soft drain: wait for in-flight tasks, never cancel them
//!
//! # Design Decisions
//! - A semaphore bounds concurrency; tasks queue on it in the runtime
//! - The accepting flag is flipped under the same lock submissions take,
//!   so no task slips in after `shutdown` returns
//! - Tasks still running when a drain times out are detached, not aborted

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::frontend::StartupReport;
use crate::observability::metrics;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("worker pool is shut down; rejected task '{0}'")]
    Rejected(&'static str),
}

/// Result of [`WorkerPool::drain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainOutcome {
    /// Tasks that finished during the drain.
    pub completed: usize,
    /// Tasks still running when the timeout expired.
    pub pending: usize,
}

#[derive(Debug)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    accepting: AtomicBool,
    submitted: AtomicUsize,
    tasks: Mutex<JoinSet<()>>,
    reports: mpsc::UnboundedSender<StartupReport>,
}

impl WorkerPool {
    /// Create a pool and the receiver its reports are delivered to.
    pub fn new(capacity: usize) -> (Self, mpsc::UnboundedReceiver<StartupReport>) {
        let capacity = capacity.max(1);
        let (reports, rx) = mpsc::unbounded_channel();

        (
            Self {
                permits: Arc::new(Semaphore::new(capacity)),
                accepting: AtomicBool::new(true),
                submitted: AtomicUsize::new(0),
                tasks: Mutex::new(JoinSet::new()),
                reports,
            },
            rx,
        )
    }

    /// Queue a task. Must be called from within a Tokio runtime.
    pub fn submit<F>(&self, label: &'static str, task: F) -> Result<(), PoolError>
    where
        F: Future<Output = Vec<StartupReport>> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if !self.accepting.load(Ordering::SeqCst) {
            metrics::record_pool_rejection();
            tracing::warn!(task = label, "Worker pool rejected submission after shutdown");
            return Err(PoolError::Rejected(label));
        }

        let permits = self.permits.clone();
        let reports = self.reports.clone();
        let span = tracing::info_span!("startup_task", task = label);

        tasks.spawn(
            async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    tracing::error!("Worker pool semaphore closed");
                    return;
                };

                for report in task.await {
                    // The supervisor may already be gone during shutdown.
                    let _ = reports.send(report);
                }
            }
            .instrument(span),
        );

        self.submitted.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(task = label, "Task submitted");
        Ok(())
    }

    /// Stop accepting submissions. Returns `true` for the first call only.
    pub fn shutdown(&self) -> bool {
        let _tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let was_accepting = self.accepting.swap(false, Ordering::SeqCst);
        if was_accepting {
            tracing::info!(submitted = self.submitted(), "Worker pool shutting down");
        }
        was_accepting
    }

    pub fn is_shutdown(&self) -> bool {
        !self.accepting.load(Ordering::SeqCst)
    }

    /// Wait up to `timeout` for submitted tasks to finish.
    pub async fn drain(&self, timeout: Duration) -> DrainOutcome {
        let mut set = {
            let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *tasks)
        };

        let mut outcome = DrainOutcome::default();
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            match tokio::time::timeout_at(deadline, set.join_next()).await {
                Ok(Some(Ok(()))) => outcome.completed += 1,
                Ok(Some(Err(e))) => {
                    outcome.completed += 1;
                    tracing::error!(error = %e, "Startup task panicked");
                }
                Ok(None) => break,
                Err(_) => {
                    outcome.pending = set.len();
                    tracing::warn!(
                        pending = outcome.pending,
                        timeout_secs = timeout.as_secs(),
                        "Worker pool drain timed out, leaving tasks running"
                    );
                    set.detach_all();
                    break;
                }
            }
        }

        outcome
    }

    /// Number of tasks accepted since creation.
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }
}
