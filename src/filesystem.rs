//! Filesystem bridge.
//!
//! Maps slash-separated paths under a root GUID onto content stored through
//! the node's agent. The WebDAV server and the web UI both read it.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::guid::Guid;
use crate::node::{Agent, AgentError};

#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such file: {0}")]
    NotFound(String),

    #[error("the root directory cannot be written or removed")]
    IsRoot,

    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// A file in the bridge namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: String,
    pub guid: Guid,
    pub size: usize,
}

#[derive(Debug)]
pub struct FileSystem {
    root: Guid,
    agent: Arc<Agent>,
    entries: DashMap<String, FileEntry>,
}

impl FileSystem {
    pub fn new(root: Guid, agent: Arc<Agent>) -> Self {
        tracing::info!(root = %root, "Filesystem bridge created");
        Self {
            root,
            agent,
            entries: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Guid {
        &self.root
    }

    /// Store `data` at `path`. Returns `true` if the path was new.
    pub fn write(&self, path: &str, data: &[u8]) -> Result<bool, FsError> {
        let path = normalize(path);
        if path == "/" {
            return Err(FsError::IsRoot);
        }

        let guid = self.agent.add_data(data)?;
        let entry = FileEntry {
            path: path.clone(),
            guid,
            size: data.len(),
        };

        Ok(self.entries.insert(path, entry).is_none())
    }

    pub fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let path = normalize(path);
        let guid = self
            .entries
            .get(&path)
            .map(|e| e.guid.clone())
            .ok_or(FsError::NotFound(path))?;

        Ok(self.agent.get_data(&guid)?)
    }

    pub fn stat(&self, path: &str) -> Option<FileEntry> {
        self.entries.get(&normalize(path)).map(|e| e.value().clone())
    }

    pub fn remove(&self, path: &str) -> Result<(), FsError> {
        let path = normalize(path);
        if path == "/" {
            return Err(FsError::IsRoot);
        }

        self.entries
            .remove(&path)
            .map(|_| ())
            .ok_or(FsError::NotFound(path))
    }

    /// Entries at or below `prefix`, sorted by path.
    pub fn list(&self, prefix: &str) -> Vec<FileEntry> {
        let prefix = normalize(prefix);
        let mut entries: Vec<FileEntry> = self
            .entries
            .iter()
            .filter(|e| is_under(e.key(), &prefix))
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    /// `true` if `path` is the root or the parent of at least one entry.
    pub fn is_directory(&self, path: &str) -> bool {
        let path = normalize(path);
        path == "/"
            || self
                .entries
                .iter()
                .any(|e| e.key() != &path && is_under(e.key(), &path))
    }
}

fn is_under(path: &str, prefix: &str) -> bool {
    prefix == "/"
        || path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Canonical form: leading slash, no empty or `.` segments, no trailing slash.
pub fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    format!("/{}", segments.join("/"))
}
