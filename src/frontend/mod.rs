//! Front-end composition subsystem.
//!
//! # Data Flow
//! ```text
//! FrontEndSelection (-j, -fs) + live Node
//!     → composer.rs decides which startup tasks to submit
//!     → pool.rs runs them on a fixed-capacity worker pool
//!     → each startup yields a StartupReport
//!     → supervisor.rs logs reports, never propagates failures
//! ```
//!
//! # Design Decisions
//! - Every front end has the same `start(context, port)` shape
//! - A failed startup is contained to its own task and never retried
//! - The orchestrator does not wait for any startup to finish

pub mod composer;
pub mod pool;
pub mod supervisor;

use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::filesystem::FileSystem;
use crate::guid::Guid;
use crate::http::{RestApi, WebApp, WebDav};
use crate::lifecycle::Shutdown;
use crate::node::{Node, NodeError};

pub use composer::{Composer, Composition, FrontEndSelection};
pub use pool::{DrainOutcome, PoolError, WorkerPool};
pub use supervisor::{spawn_supervisor, SupervisorSummary};

/// Errors raised while starting a front end.
#[derive(Debug, Error)]
pub enum FrontEndError {
    #[error("cannot bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("node unavailable: {0}")]
    NodeUnavailable(#[from] NodeError),

    #[error("{0} needs a filesystem bridge")]
    MissingFilesystem(&'static str),

    #[error("{0}")]
    Failed(String),
}

/// Everything a front end may use while starting and serving.
#[derive(Clone)]
pub struct FrontEndContext {
    pub node: Arc<Node>,
    pub filesystem: Option<Arc<FileSystem>>,
    pub shutdown: Shutdown,
}

impl fmt::Debug for FrontEndContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrontEndContext")
            .field("node", &self.node.settings().node.name)
            .field("root", &self.filesystem.as_ref().map(|fs| fs.root().to_string()))
            .finish()
    }
}

/// A network-facing service layered over the node.
///
/// `start` resolves once the service is accepting traffic (or failed to);
/// serving continues in the background until the shutdown signal fires.
pub trait FrontEnd: Send + Sync {
    fn name(&self) -> &'static str;

    fn start(&self, ctx: FrontEndContext, port: u16) -> BoxFuture<'static, Result<(), FrontEndError>>;
}

/// Outcome of one front-end startup.
#[derive(Debug)]
pub struct StartupReport {
    pub front_end: &'static str,
    pub port: u16,
    /// Filesystem bridge root, for front ends started over a bridge.
    pub root: Option<Guid>,
    pub outcome: Result<(), FrontEndError>,
}

impl StartupReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// The front ends the composer may launch.
#[derive(Clone)]
pub struct FrontEnds {
    pub rest: Arc<dyn FrontEnd>,
    pub webapp: Arc<dyn FrontEnd>,
    pub webdav: Arc<dyn FrontEnd>,
}

impl Default for FrontEnds {
    fn default() -> Self {
        Self {
            rest: Arc::new(RestApi),
            webapp: Arc::new(WebApp),
            webdav: Arc::new(WebDav),
        }
    }
}
