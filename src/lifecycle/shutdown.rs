//! Shutdown coordination.
//!
//! # Ordering
//! ```text
//! termination signal
//!     → (a) pool stops accepting, servers told to stop, in-flight startups drained
//!     → (b) node killed gracefully (waits for outstanding leases)
//!     → (c) one timestamped termination record
//! ```
//!
//! The handler runs at most once. Failures in (b) are logged and the
//! sequence still reaches (c).

use chrono::{DateTime, Local};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::frontend::{DrainOutcome, WorkerPool};
use crate::lifecycle::signals;
use crate::lifecycle::state::{ProcessState, ProcessStatus};
use crate::node::{KillOutcome, NodeLifecycle, ShutdownError};

/// Format of the timestamp in the termination record.
pub const TERMINATION_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Stop signal shared with every running server.
///
/// Late subscribers still observe a signal that fired before they subscribed.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Resolves once [`Shutdown::trigger`] has been called.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            let _ = rx.wait_for(|stopped| *stopped).await;
        }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    NotYet = 0,
    InProgress = 1,
    Done = 2,
}

impl From<u8> for ShutdownState {
    fn from(val: u8) -> Self {
        match val {
            1 => ShutdownState::InProgress,
            2 => ShutdownState::Done,
            _ => ShutdownState::NotYet,
        }
    }
}

/// What the single termination handler run did.
#[derive(Debug)]
pub struct TerminationRecord {
    pub terminated_at: DateTime<Local>,
    pub drain: DrainOutcome,
    pub kill: Result<KillOutcome, ShutdownError>,
}

pub type TerminationHandle = JoinHandle<Option<TerminationRecord>>;

pub struct ShutdownCoordinator {
    state: AtomicU8,
    registered: AtomicBool,
    pool: Arc<WorkerPool>,
    lifecycle: Arc<NodeLifecycle>,
    shutdown: Shutdown,
    status: Arc<ProcessStatus>,
    drain_timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(
        pool: Arc<WorkerPool>,
        lifecycle: Arc<NodeLifecycle>,
        shutdown: Shutdown,
        status: Arc<ProcessStatus>,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            state: AtomicU8::new(ShutdownState::NotYet as u8),
            registered: AtomicBool::new(false),
            pool,
            lifecycle,
            shutdown,
            status,
            drain_timeout,
        }
    }

    pub fn state(&self) -> ShutdownState {
        ShutdownState::from(self.state.load(Ordering::SeqCst))
    }

    /// Run [`ShutdownCoordinator::terminate`] when the process receives a termination signal.
    pub fn register(self: &Arc<Self>) -> Option<TerminationHandle> {
        self.register_with(signals::termination_signal())
    }

    /// Run [`ShutdownCoordinator::terminate`] when `trigger` resolves.
    ///
    /// Only the first registration is accepted.
    pub fn register_with<F>(self: &Arc<Self>, trigger: F) -> Option<TerminationHandle>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.registered.swap(true, Ordering::SeqCst) {
            tracing::warn!("Termination handler already registered");
            return None;
        }

        let coordinator = self.clone();
        Some(tokio::spawn(async move {
            trigger.await;
            coordinator.terminate().await
        }))
    }

    /// The termination handler. Returns `None` if it already ran.
    pub async fn terminate(&self) -> Option<TerminationRecord> {
        if self
            .state
            .compare_exchange(
                ShutdownState::NotYet as u8,
                ShutdownState::InProgress as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            tracing::debug!("Termination handler already invoked");
            return None;
        }

        if let Err(e) = self.status.transition(ProcessState::ShuttingDown) {
            tracing::warn!(error = %e, "Shutting down from an unexpected state");
        }

        // (a)
        self.pool.shutdown();
        self.shutdown.trigger();
        let drain = self.pool.drain(self.drain_timeout).await;
        tracing::info!(
            completed = drain.completed,
            pending = drain.pending,
            "Startup tasks drained"
        );

        // (b)
        let kill = match tokio::time::timeout(self.drain_timeout, self.lifecycle.kill(true)).await {
            Ok(result) => result,
            Err(_) => Err(ShutdownError::Timeout(self.drain_timeout.as_secs())),
        };
        if let Err(e) = &kill {
            tracing::error!(error = %e, "Node did not shut down cleanly");
        }

        // (c)
        self.state.store(ShutdownState::Done as u8, Ordering::SeqCst);
        if let Err(e) = self.status.transition(ProcessState::Terminated) {
            tracing::warn!(error = %e, "Could not mark process terminated");
        }

        let terminated_at = Local::now();
        tracing::info!(
            at = %terminated_at.format(TERMINATION_TIME_FORMAT),
            "SOS instance terminated"
        );

        Some(TerminationRecord {
            terminated_at,
            drain,
            kill,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NodeSettings, StoreKind};
    use crate::storage::DefaultStorageFactory;

    async fn running_coordinator() -> (Arc<ShutdownCoordinator>, Arc<NodeLifecycle>, Arc<WorkerPool>) {
        let status = Arc::new(ProcessStatus::new());
        for next in [
            ProcessState::Configuring,
            ProcessState::NodeInitializing,
            ProcessState::NodeReady,
            ProcessState::Running,
        ] {
            status.transition(next).unwrap();
        }

        let mut settings = NodeSettings::default();
        settings.store.kind = StoreKind::Memory;
        let lifecycle = Arc::new(NodeLifecycle::new());
        lifecycle
            .init(Arc::new(settings), &DefaultStorageFactory)
            .await
            .unwrap();

        let (pool, _rx) = WorkerPool::new(3);
        let pool = Arc::new(pool);
        let coordinator = Arc::new(ShutdownCoordinator::new(
            pool.clone(),
            lifecycle.clone(),
            Shutdown::new(),
            status,
            Duration::from_secs(1),
        ));
        (coordinator, lifecycle, pool)
    }

    #[tokio::test]
    async fn test_shutdown_signal_reaches_late_subscribers() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        assert!(shutdown.is_triggered());
        tokio::time::timeout(Duration::from_millis(100), shutdown.signalled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_terminate_runs_once() {
        let (coordinator, lifecycle, pool) = running_coordinator().await;

        let record = coordinator.terminate().await.unwrap();
        assert_eq!(record.kill.unwrap(), KillOutcome::Killed);
        assert!(coordinator.terminate().await.is_none());

        assert_eq!(coordinator.state(), ShutdownState::Done);
        assert_eq!(coordinator.status.current(), ProcessState::Terminated);
        assert_eq!(lifecycle.teardown_count(), 1);
        assert!(pool.is_shutdown());
        assert!(coordinator.shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_concurrent_invocations_produce_one_record() {
        let (coordinator, lifecycle, _pool) = running_coordinator().await;

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = coordinator.clone();
                tokio::spawn(async move { c.terminate().await })
            })
            .collect();

        let mut records = 0;
        for h in handles {
            if h.await.unwrap().is_some() {
                records += 1;
            }
        }
        assert_eq!(records, 1);
        assert_eq!(lifecycle.teardown_count(), 1);
    }

    #[tokio::test]
    async fn test_register_only_once() {
        let (coordinator, _lifecycle, _pool) = running_coordinator().await;
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = coordinator
            .register_with(async move {
                let _ = rx.await;
            })
            .unwrap();
        assert!(coordinator.register_with(async {}).is_none());
        assert_eq!(coordinator.state(), ShutdownState::NotYet);

        tx.send(()).unwrap();
        assert!(handle.await.unwrap().is_some());
    }
}
