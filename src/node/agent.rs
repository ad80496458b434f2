//! The agent capability: content-addressed reads and writes over node storage.

use std::sync::{Arc, RwLock, RwLockReadGuard};
use thiserror::Error;

use crate::guid::{Guid, HashAlgorithm};
use crate::storage::{Storage, StorageError};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent has been released")]
    Released,

    #[error("no data stored under {0}")]
    NotFound(Guid),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Capability handed to front ends that need to read or write content.
///
/// The agent is released when the node is killed; every call after that
/// fails with [`AgentError::Released`]. Each call holds the read side of
/// `released` while it touches storage, and [`Agent::release`] takes the
/// write side, so release waits for in-flight calls.
#[derive(Debug)]
pub struct Agent {
    storage: Arc<dyn Storage>,
    algorithm: HashAlgorithm,
    released: RwLock<bool>,
}

impl Agent {
    pub fn new(storage: Arc<dyn Storage>, algorithm: HashAlgorithm) -> Self {
        Self {
            storage,
            algorithm,
            released: RwLock::new(false),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Store `data` and return its address.
    pub fn add_data(&self, data: &[u8]) -> Result<Guid, AgentError> {
        let _live = self.live()?;
        let guid = Guid::of(self.algorithm, data);
        self.storage.put(&guid, data)?;
        tracing::debug!(guid = %guid, bytes = data.len(), "Data added");
        Ok(guid)
    }

    pub fn get_data(&self, guid: &Guid) -> Result<Vec<u8>, AgentError> {
        let _live = self.live()?;
        self.storage
            .get(guid)?
            .ok_or_else(|| AgentError::NotFound(guid.clone()))
    }

    pub fn has_data(&self, guid: &Guid) -> Result<bool, AgentError> {
        let _live = self.live()?;
        Ok(self.storage.contains(guid))
    }

    /// Blocks until calls already inside storage have returned.
    pub(crate) fn release(&self) {
        *self.released.write().unwrap_or_else(|e| e.into_inner()) = true;
    }

    pub fn is_released(&self) -> bool {
        *self.released.read().unwrap_or_else(|e| e.into_inner())
    }

    fn live(&self) -> Result<RwLockReadGuard<'_, bool>, AgentError> {
        let guard = self.released.read().unwrap_or_else(|e| e.into_inner());
        if *guard {
            Err(AgentError::Released)
        } else {
            Ok(guard)
        }
    }
}
