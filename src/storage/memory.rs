//! Volatile in-process storage.

use dashmap::DashMap;

use crate::guid::Guid;
use crate::storage::{Storage, StorageError};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: DashMap<Guid, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn put(&self, guid: &Guid, data: &[u8]) -> Result<(), StorageError> {
        self.blobs
            .entry(guid.clone())
            .or_insert_with(|| data.to_vec());
        Ok(())
    }

    fn get(&self, guid: &Guid) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.blobs.get(guid).map(|r| r.value().clone()))
    }

    fn contains(&self, guid: &Guid) -> bool {
        self.blobs.contains_key(guid)
    }

    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
