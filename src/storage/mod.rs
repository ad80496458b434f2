//! Content-addressed storage subsystem.
//!
//! # Data Flow
//! ```text
//! StoreConfig
//!     → StorageFactory::create
//!     → Arc<dyn Storage> (local directory or in-memory map)
//!     → owned by the Node, used through its Agent
//!     → flushed once when the node is killed
//! ```
//!
//! # Design Decisions
//! - The factory is a trait so the orchestrator can be driven with fakes
//! - Blobs are keyed by their GUID; the storage layer never hashes
//! - Storage calls are synchronous; blobs are small and local

pub mod local;
pub mod memory;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{StoreConfig, StoreKind};
use crate::guid::Guid;

pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot open store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store at {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("I/O error on {guid}: {source}")]
    Io {
        guid: String,
        #[source]
        source: std::io::Error,
    },

    #[error("flush failed: {0}")]
    Flush(String),
}

/// A backend that stores immutable blobs under their content address.
pub trait Storage: Send + Sync + fmt::Debug {
    /// Short backend name for logs.
    fn kind(&self) -> &'static str;

    fn put(&self, guid: &Guid, data: &[u8]) -> Result<(), StorageError>;

    fn get(&self, guid: &Guid) -> Result<Option<Vec<u8>>, StorageError>;

    fn contains(&self, guid: &Guid) -> bool;

    /// Persist any pending state. Called once during node teardown.
    fn flush(&self) -> Result<(), StorageError>;
}

/// Builds a storage handle from settings.
pub trait StorageFactory: Send + Sync {
    fn create(&self, config: &StoreConfig) -> Result<Arc<dyn Storage>, StorageError>;
}

/// Factory for the backends shipped with this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStorageFactory;

impl StorageFactory for DefaultStorageFactory {
    fn create(&self, config: &StoreConfig) -> Result<Arc<dyn Storage>, StorageError> {
        let storage: Arc<dyn Storage> = match config.kind {
            StoreKind::Local => Arc::new(LocalStorage::open(&config.location)?),
            StoreKind::Memory => Arc::new(MemoryStorage::new()),
        };

        tracing::debug!(kind = storage.kind(), "Storage created");
        Ok(storage)
    }
}
