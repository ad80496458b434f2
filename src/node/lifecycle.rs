//! Node lifecycle management.
//!
//! # States
//! ```text
//! Empty ──init──▶ Live ──kill──▶ Destroyed
//!                  │
//!                  └── lease() hands out read guards
//! ```
//!
//! # Design Decisions
//! - `init` on a live or destroyed node is rejected, never replaces the handle
//! - `kill` takes the write side of the lock, so teardown waits for every
//!   outstanding lease and no lease can be taken afterwards
//! - Teardown runs at most once; repeated `kill` calls are no-ops

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedRwLockReadGuard, RwLock};

use crate::config::NodeSettings;
use crate::node::{Node, NodeError};
use crate::observability::metrics;
use crate::storage::{StorageError, StorageFactory};

/// Errors raised while tearing the node down.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("node teardown failed: {0}")]
    Teardown(#[from] StorageError),

    #[error("node teardown did not complete within {0} seconds")]
    Timeout(u64),
}

/// Result of a [`NodeLifecycle::kill`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    /// This call ran the teardown.
    Killed,
    /// An earlier call already tore the node down.
    AlreadyKilled,
    /// There was never a node to kill.
    NeverInitialized,
}

#[derive(Debug)]
enum Slot {
    Empty,
    Live(Arc<Node>),
    Destroyed,
}

/// Owner of the single node instance.
#[derive(Debug)]
pub struct NodeLifecycle {
    slot: Arc<RwLock<Slot>>,
    teardowns: AtomicUsize,
}

/// Read access to the live node.
///
/// While any lease is held the node cannot be destroyed.
pub struct NodeLease {
    _guard: OwnedRwLockReadGuard<Slot>,
    node: Arc<Node>,
}

impl NodeLease {
    /// A handle that outlives the lease. It does not block teardown.
    pub fn node(&self) -> Arc<Node> {
        self.node.clone()
    }
}

impl Deref for NodeLease {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

impl NodeLifecycle {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(RwLock::new(Slot::Empty)),
            teardowns: AtomicUsize::new(0),
        }
    }

    /// Create storage through `factory` and build the node.
    pub async fn init(
        &self,
        settings: Arc<NodeSettings>,
        factory: &dyn StorageFactory,
    ) -> Result<Arc<Node>, NodeError> {
        let mut slot = self.slot.write().await;
        match *slot {
            Slot::Empty => {}
            Slot::Live(_) => return Err(NodeError::AlreadyInitialized),
            Slot::Destroyed => return Err(NodeError::Destroyed),
        }

        let storage = factory.create(&settings.store)?;
        let node = Arc::new(Node::builder().settings(settings).storage(storage).build()?);

        tracing::info!(
            name = %node.settings().node.name,
            store = node.storage().kind(),
            agent = node.agent().is_some(),
            "Node initialised"
        );

        *slot = Slot::Live(node.clone());
        Ok(node)
    }

    /// Borrow the live node. Fails once the node is gone.
    pub async fn lease(&self) -> Result<NodeLease, NodeError> {
        let guard = self.slot.clone().read_owned().await;
        let node = match &*guard {
            Slot::Live(node) => node.clone(),
            Slot::Empty | Slot::Destroyed => return Err(NodeError::NotRunning),
        };

        Ok(NodeLease {
            _guard: guard,
            node,
        })
    }

    /// Tear the node down. Safe to call any number of times.
    ///
    /// A graceful kill flushes storage before returning. The node counts as
    /// destroyed even when the flush fails.
    pub async fn kill(&self, graceful: bool) -> Result<KillOutcome, ShutdownError> {
        let mut slot = self.slot.write().await;
        let node = match std::mem::replace(&mut *slot, Slot::Destroyed) {
            Slot::Live(node) => node,
            Slot::Destroyed => {
                tracing::debug!("Node already killed");
                return Ok(KillOutcome::AlreadyKilled);
            }
            Slot::Empty => {
                *slot = Slot::Empty;
                tracing::warn!("Kill requested before the node was initialised");
                return Ok(KillOutcome::NeverInitialized);
            }
        };

        self.teardowns.fetch_add(1, Ordering::SeqCst);
        metrics::record_node_teardown();

        node.teardown(graceful)?;
        tracing::info!(graceful, "Node killed");
        Ok(KillOutcome::Killed)
    }

    pub async fn is_live(&self) -> bool {
        matches!(*self.slot.read().await, Slot::Live(_))
    }

    /// Number of teardowns actually executed.
    pub fn teardown_count(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

impl Default for NodeLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
