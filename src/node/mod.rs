//! Node subsystem.
//!
//! # Data Flow
//! ```text
//! NodeSettings + StorageFactory
//!     → lifecycle.rs init (creates storage, builds Node)
//!     → Node { storage, Option<Agent> }
//!     → leased read-only by front-end startup tasks
//!     → lifecycle.rs kill (flush storage, release agent)
//! ```
//!
//! # Design Decisions
//! - One Node per lifecycle manager, no process-wide global
//! - The agent is optional; without it filesystem front ends stay down
//! - Teardown happens once, behind the lifecycle write lock

pub mod agent;
pub mod lifecycle;

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::NodeSettings;
use crate::guid::HashAlgorithm;
use crate::storage::{Storage, StorageError};

pub use agent::{Agent, AgentError};
pub use lifecycle::{KillOutcome, NodeLease, NodeLifecycle, ShutdownError};

/// Errors raised while creating or accessing the node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("storage initialisation failed: {0}")]
    Storage(#[from] StorageError),

    #[error("node builder is missing {0}")]
    Incomplete(&'static str),

    #[error("a node is already running; kill it before initialising again")]
    AlreadyInitialized,

    #[error("node has been destroyed")]
    Destroyed,

    #[error("node is not running")]
    NotRunning,
}

/// The running node instance.
#[derive(Debug)]
pub struct Node {
    settings: Arc<NodeSettings>,
    storage: Arc<dyn Storage>,
    agent: Option<Arc<Agent>>,
}

/// Summary reported by the REST API and the web UI.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NodeInfo {
    pub name: String,
    pub store: &'static str,
    pub agent: bool,
    pub algorithm: HashAlgorithm,
}

impl Node {
    pub fn builder() -> NodeBuilder {
        NodeBuilder::default()
    }

    pub fn settings(&self) -> &NodeSettings {
        &self.settings
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// The agent capability, if this node exposes one.
    pub fn agent(&self) -> Option<Arc<Agent>> {
        self.agent.clone()
    }

    pub fn info(&self) -> NodeInfo {
        NodeInfo {
            name: self.settings.node.name.clone(),
            store: self.storage.kind(),
            agent: self.agent.is_some(),
            algorithm: self.settings.guid.algorithm,
        }
    }

    fn teardown(&self, graceful: bool) -> Result<(), StorageError> {
        if let Some(agent) = &self.agent {
            agent.release();
        }

        if graceful {
            self.storage.flush()?;
        }

        Ok(())
    }
}

/// Builder wiring settings and storage into a [`Node`].
#[derive(Default)]
pub struct NodeBuilder {
    settings: Option<Arc<NodeSettings>>,
    storage: Option<Arc<dyn Storage>>,
}

impl NodeBuilder {
    pub fn settings(mut self, settings: Arc<NodeSettings>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn build(self) -> Result<Node, NodeError> {
        let settings = self.settings.ok_or(NodeError::Incomplete("settings"))?;
        let storage = self.storage.ok_or(NodeError::Incomplete("storage"))?;

        let agent = settings
            .node
            .agent
            .then(|| Arc::new(Agent::new(storage.clone(), settings.guid.algorithm)));

        Ok(Node {
            settings,
            storage,
            agent,
        })
    }
}
