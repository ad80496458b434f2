//! Directory-backed storage. One file per blob, named by GUID.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::guid::Guid;
use crate::storage::{Storage, StorageError};

#[derive(Debug)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: &Path) -> Result<Self, StorageError> {
        if root.exists() && !root.is_dir() {
            return Err(StorageError::NotADirectory(root.to_path_buf()));
        }

        fs::create_dir_all(root).map_err(|source| StorageError::Open {
            path: root.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %root.display(), "Local store opened");

        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn blob_path(&self, guid: &Guid) -> PathBuf {
        self.root.join(guid.as_str())
    }
}

impl Storage for LocalStorage {
    fn kind(&self) -> &'static str {
        "local"
    }

    fn put(&self, guid: &Guid, data: &[u8]) -> Result<(), StorageError> {
        let path = self.blob_path(guid);
        if path.exists() {
            return Ok(());
        }

        fs::write(&path, data).map_err(|source| StorageError::Io {
            guid: guid.to_string(),
            source,
        })
    }

    fn get(&self, guid: &Guid) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.blob_path(guid)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                guid: guid.to_string(),
                source,
            }),
        }
    }

    fn contains(&self, guid: &Guid) -> bool {
        self.blob_path(guid).is_file()
    }

    fn flush(&self) -> Result<(), StorageError> {
        #[cfg(unix)]
        {
            let dir = fs::File::open(&self.root).map_err(|e| StorageError::Flush(e.to_string()))?;
            dir.sync_all().map_err(|e| StorageError::Flush(e.to_string()))?;
        }

        tracing::debug!(path = %self.root.display(), "Local store flushed");
        Ok(())
    }
}
