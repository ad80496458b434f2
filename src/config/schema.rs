//! Configuration schema definitions.
//!
//! This module defines the complete settings structure for a node instance.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::guid::HashAlgorithm;

/// Root settings for a node instance.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NodeSettings {
    /// Node identity and capabilities.
    pub node: NodeConfig,

    /// Storage backend parameters.
    pub store: StoreConfig,

    /// Content-address generation settings.
    pub guid: GuidConfig,

    /// REST API listener.
    pub rest: RestConfig,

    /// Web UI listener.
    pub webapp: WebAppConfig,

    /// WebDAV filesystem bridge listener.
    pub webdav: WebDavConfig,

    /// Front-end worker pool.
    pub pool: PoolConfig,

    /// Shutdown behaviour.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Node identity and capability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Human readable node name, reported by the REST API and web UI.
    pub name: String,

    /// Host address every front end binds to.
    pub bind_host: String,

    /// Whether the node exposes an agent capability.
    /// Without an agent the filesystem bridge cannot be mounted.
    pub agent: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "sos-node".to_string(),
            bind_host: "0.0.0.0".to_string(),
            agent: true,
        }
    }
}

/// Kind of storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Blobs stored as files under `location`.
    Local,
    /// Volatile in-process store.
    Memory,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,

    /// Root directory for `local` stores.
    pub location: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Local,
            location: PathBuf::from("sos-data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuidConfig {
    /// Hash algorithm used for content addresses and generated roots.
    pub algorithm: HashAlgorithm,
}

/// REST API listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RestConfig {
    pub port: u16,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebAppConfig {
    pub port: u16,
}

impl Default for WebAppConfig {
    fn default() -> Self {
        Self { port: 9000 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebDavConfig {
    pub port: u16,
}

impl Default for WebDavConfig {
    fn default() -> Self {
        Self { port: 8081 }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of front-end startup tasks running at once.
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { capacity: 3 }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long the termination handler waits for in-flight startup tasks.
    pub drain_timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9095".to_string(),
        }
    }
}
