//! Startup orchestration.
//!
//! # Responsibilities
//! - Print usage, parse arguments and load configuration
//! - Initialize the node (fatal on failure)
//! - Submit front-end startups without waiting for them
//! - Register the termination handler
//!
//! # Design Decisions
//! - Fail fast before the node is ready: nothing touches storage or the
//!   network until arguments and config are valid
//! - After the node is ready, front-end failures are only reported
//! - `launch` returns as soon as the handler is registered

use clap::error::ErrorKind;
use futures_util::future::BoxFuture;
use std::ffi::OsString;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::cli::{self, SEPARATOR};
use crate::config::{load_config, ConfigError, NodeSettings};
use crate::frontend::{spawn_supervisor, Composer, Composition, FrontEnds, SupervisorSummary, WorkerPool};
use crate::guid::{Guid, GuidError};
use crate::lifecycle::shutdown::{Shutdown, ShutdownCoordinator, TerminationHandle, TerminationRecord};
use crate::lifecycle::state::{ProcessState, ProcessStatus};
use crate::node::{NodeError, NodeLifecycle};
use crate::observability::logging::LogHandle;
use crate::observability::metrics;
use crate::storage::{DefaultStorageFactory, StorageFactory};

/// Problems detected before the node exists.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid arguments: {0}")]
    Cli(#[from] clap::Error),

    #[error("invalid -root identifier: {0}")]
    InvalidRoot(#[from] GuidError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("storage initialisation failed: {0}")]
    StorageInitialization(#[source] NodeError),
}

impl LaunchError {
    /// `true` for `--help` and `--version`, which are not failures.
    pub fn is_informational(&self) -> bool {
        match self {
            LaunchError::Configuration(ConfigurationError::Cli(e)) => !e.use_stderr(),
            _ => false,
        }
    }

    /// Output for `--version`. `--help` has none: the usage is printed
    /// at every start already.
    pub fn version_text(&self) -> Option<String> {
        match self {
            LaunchError::Configuration(ConfigurationError::Cli(e))
                if e.kind() == ErrorKind::DisplayVersion =>
            {
                Some(e.render().to_string())
            }
            _ => None,
        }
    }

    /// Exit status for a launch that never reached `Running`.
    pub fn exit_code(&self) -> ExitCode {
        if self.is_informational() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

/// What fires the termination handler.
pub enum ShutdownTrigger {
    /// SIGINT, SIGTERM, SIGQUIT or Ctrl-C.
    OsSignals,
    Custom(BoxFuture<'static, ()>),
}

/// The pluggable parts of a launch.
pub struct Collaborators {
    pub storage: Arc<dyn StorageFactory>,
    pub front_ends: FrontEnds,
    pub trigger: ShutdownTrigger,
    pub logging: LogHandle,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            storage: Arc::new(DefaultStorageFactory),
            front_ends: FrontEnds::default(),
            trigger: ShutdownTrigger::OsSignals,
            logging: LogHandle::detached(),
        }
    }
}

/// A running instance.
pub struct Launch {
    pub settings: Arc<NodeSettings>,
    pub lifecycle: Arc<NodeLifecycle>,
    pub pool: Arc<WorkerPool>,
    pub coordinator: Arc<ShutdownCoordinator>,
    pub composition: Composition,
    pub supervisor: JoinHandle<SupervisorSummary>,
    pub termination: Option<TerminationHandle>,
}

impl Launch {
    /// Wait for the termination handler to finish.
    ///
    /// The supervisor summary is collected if every startup task has
    /// finished within the drain timeout.
    pub async fn wait(self) -> (Option<TerminationRecord>, Option<SupervisorSummary>) {
        let record = match self.termination {
            Some(handle) => match handle.await {
                Ok(record) => record,
                Err(e) => {
                    tracing::error!(error = %e, "Termination handler failed");
                    None
                }
            },
            None => None,
        };

        let drain_timeout = Duration::from_secs(self.settings.shutdown.drain_timeout_secs);
        drop(self.coordinator);
        drop(self.pool);

        let summary = match tokio::time::timeout(drain_timeout, self.supervisor).await {
            Ok(Ok(summary)) => Some(summary),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Supervisor failed");
                None
            }
            Err(_) => {
                tracing::debug!("Startup tasks still running; supervisor summary skipped");
                None
            }
        };

        (record, summary)
    }

    /// Wait for termination and pick the exit status.
    ///
    /// Only a failed launch exits non-zero; a teardown failure has already
    /// been logged by the termination handler.
    pub async fn finish(self) -> ExitCode {
        let (record, summary) = self.wait().await;
        if let Some(summary) = summary {
            tracing::info!(
                started = summary.started.len(),
                failed = summary.failed.len(),
                "Front-end summary"
            );
        }
        if record.is_none() {
            tracing::warn!("Termination handler produced no record");
        }
        ExitCode::SUCCESS
    }
}

/// Bring the instance up.
///
/// `args` is the full argument list, program name first.
pub async fn launch<I, T>(
    args: I,
    collaborators: Collaborators,
    status: Arc<ProcessStatus>,
) -> Result<Launch, LaunchError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    advance(&status, ProcessState::Configuring);

    println!("{}", cli::usage_text());
    println!("{SEPARATOR}");

    let args = cli::parse_args(args).map_err(ConfigurationError::from)?;

    let root = match (&args.root, args.filesystem) {
        (Some(text), true) => Some(Guid::parse(text).map_err(ConfigurationError::from)?),
        (Some(text), false) => {
            tracing::warn!(root = %text, "-root is ignored without -fs");
            None
        }
        (None, _) => None,
    };

    let settings = Arc::new(load_config(&args.config).map_err(ConfigurationError::from)?);
    collaborators
        .logging
        .apply_level(&settings.observability.log_level);

    tracing::info!(
        config = %args.config.display(),
        name = %settings.node.name,
        store = ?settings.store.kind,
        rest = args.rest,
        filesystem = args.filesystem,
        "Configuration loaded"
    );

    if settings.observability.metrics_enabled {
        match settings.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    advance(&status, ProcessState::NodeInitializing);
    let lifecycle = Arc::new(NodeLifecycle::new());
    if let Err(e) = lifecycle
        .init(settings.clone(), collaborators.storage.as_ref())
        .await
    {
        advance(&status, ProcessState::Failed);
        tracing::error!(error = %e, "Node initialisation failed");
        return Err(LaunchError::StorageInitialization(e));
    }
    advance(&status, ProcessState::NodeReady);

    let (pool, reports) = WorkerPool::new(settings.pool.capacity);
    let pool = Arc::new(pool);
    let supervisor = spawn_supervisor(reports);
    let shutdown = Shutdown::new();

    let composition = Composer::new(
        pool.clone(),
        lifecycle.clone(),
        collaborators.front_ends,
        settings.clone(),
        shutdown.clone(),
    )
    .compose(args.selection(), root)
    .await;
    advance(&status, ProcessState::Running);

    let coordinator = Arc::new(ShutdownCoordinator::new(
        pool.clone(),
        lifecycle.clone(),
        shutdown,
        status,
        Duration::from_secs(settings.shutdown.drain_timeout_secs),
    ));
    let termination = match collaborators.trigger {
        ShutdownTrigger::OsSignals => coordinator.register(),
        ShutdownTrigger::Custom(trigger) => coordinator.register_with(trigger),
    };

    tracing::info!(
        "Shutdown handler has been registered. Send SIGTERM on process {}",
        std::process::id()
    );

    Ok(Launch {
        settings,
        lifecycle,
        pool,
        coordinator,
        composition,
        supervisor,
        termination,
    })
}

fn advance(status: &ProcessStatus, next: ProcessState) {
    if let Err(e) = status.transition(next) {
        tracing::warn!(error = %e, "Unexpected process state transition");
    }
}
