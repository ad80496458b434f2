//! Decides which front-end startup tasks to submit.
//!
//! | Selection | Tasks |
//! |-----------|-------|
//! | `-j`      | REST API |
//! | `-fs`     | web UI bound to the bridge, then WebDAV (one task) |
//! | no `-fs`  | web UI alone |
//!
//! The bridge branch is skipped when the node has no agent.

use std::sync::Arc;

use crate::config::NodeSettings;
use crate::filesystem::FileSystem;
use crate::frontend::{FrontEnd, FrontEndContext, FrontEndError, FrontEnds, StartupReport, WorkerPool};
use crate::guid::Guid;
use crate::lifecycle::Shutdown;
use crate::node::NodeLifecycle;

/// Which optional front ends were requested on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontEndSelection {
    pub enable_rest: bool,
    pub enable_filesystem_bridge: bool,
}

/// What [`Composer::compose`] submitted.
#[derive(Debug, Clone, Default)]
pub struct Composition {
    /// Labels of the tasks accepted by the pool, in submission order.
    pub submitted: Vec<&'static str>,
    /// Labels the pool refused because shutdown had begun.
    pub rejected: Vec<&'static str>,
    /// Root of the filesystem bridge, when one was built.
    pub root: Option<Guid>,
}

pub struct Composer {
    pool: Arc<WorkerPool>,
    lifecycle: Arc<NodeLifecycle>,
    front_ends: FrontEnds,
    settings: Arc<NodeSettings>,
    shutdown: Shutdown,
}

impl Composer {
    pub fn new(
        pool: Arc<WorkerPool>,
        lifecycle: Arc<NodeLifecycle>,
        front_ends: FrontEnds,
        settings: Arc<NodeSettings>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            pool,
            lifecycle,
            front_ends,
            settings,
            shutdown,
        }
    }

    /// Submit the startup tasks for `selection`. Never waits for them.
    ///
    /// `root` is used verbatim for the bridge; a random one is generated
    /// when absent.
    pub async fn compose(&self, selection: FrontEndSelection, root: Option<Guid>) -> Composition {
        let mut composition = Composition::default();

        if selection.enable_rest {
            let task = self.start(self.front_ends.rest.clone(), self.settings.rest.port, None);
            self.submit(&mut composition, "rest", async move { vec![task.await] });
        }

        if !selection.enable_filesystem_bridge {
            let task = self.start(self.front_ends.webapp.clone(), self.settings.webapp.port, None);
            self.submit(&mut composition, "webapp", async move { vec![task.await] });
            return composition;
        }

        let root = root.unwrap_or_else(|| Guid::random(self.settings.guid.algorithm));
        let agent = match self.lifecycle.lease().await {
            Ok(lease) => lease.agent(),
            Err(e) => {
                tracing::error!(root = %root, error = %e, "Cannot mount filesystem bridge");
                return composition;
            }
        };
        let Some(agent) = agent else {
            tracing::info!(root = %root, "Node has no agent; filesystem bridge not mounted");
            return composition;
        };

        let filesystem = Arc::new(FileSystem::new(root.clone(), agent));
        let webapp = self.start(
            self.front_ends.webapp.clone(),
            self.settings.webapp.port,
            Some(filesystem.clone()),
        );
        let webdav = self.start(
            self.front_ends.webdav.clone(),
            self.settings.webdav.port,
            Some(filesystem),
        );

        // The web UI goes first; WebDAV starts whatever the UI's outcome.
        self.submit(&mut composition, "filesystem-bridge", async move {
            let ui = webapp.await;
            let dav = webdav.await;
            vec![ui, dav]
        });
        composition.root = Some(root);
        composition
    }

    fn submit<F>(&self, composition: &mut Composition, label: &'static str, task: F)
    where
        F: std::future::Future<Output = Vec<StartupReport>> + Send + 'static,
    {
        match self.pool.submit(label, task) {
            Ok(()) => composition.submitted.push(label),
            Err(_) => composition.rejected.push(label),
        }
    }

    /// Startup of one front end under a node lease.
    ///
    /// The lease is held only while `start` runs; kill waits for it. Once
    /// serving, front ends go through the agent, which kill releases.
    fn start(
        &self,
        front_end: Arc<dyn FrontEnd>,
        port: u16,
        filesystem: Option<Arc<FileSystem>>,
    ) -> impl std::future::Future<Output = StartupReport> + Send + 'static {
        let lifecycle = self.lifecycle.clone();
        let shutdown = self.shutdown.clone();

        async move {
            let name = front_end.name();
            let root = filesystem.as_ref().map(|fs| fs.root().clone());
            tracing::debug!(front_end = name, port, "Starting front end");

            let outcome = match lifecycle.lease().await {
                Ok(lease) => {
                    let ctx = FrontEndContext {
                        node: lease.node(),
                        filesystem,
                        shutdown,
                    };
                    front_end.start(ctx, port).await
                }
                Err(e) => Err(FrontEndError::NodeUnavailable(e)),
            };

            StartupReport {
                front_end: name,
                port,
                root,
                outcome,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreKind;
    use crate::frontend::spawn_supervisor;
    use crate::guid::HashAlgorithm;
    use crate::storage::DefaultStorageFactory;
    use futures_util::future::BoxFuture;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records the order of starts and optionally fails.
    struct Recording {
        name: &'static str,
        fail: bool,
        log: Arc<Mutex<Vec<(&'static str, Option<String>)>>>,
    }

    impl FrontEnd for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn start(&self, ctx: FrontEndContext, _port: u16) -> BoxFuture<'static, Result<(), FrontEndError>> {
            let root = ctx.filesystem.as_ref().map(|fs| fs.root().to_string());
            self.log.lock().unwrap().push((self.name, root));
            let fail = self.fail;
            let name = self.name;
            Box::pin(async move {
                if fail {
                    Err(FrontEndError::Failed(format!("{name} refused")))
                } else {
                    Ok(())
                }
            })
        }
    }

    struct Fixture {
        pool: Arc<WorkerPool>,
        rx: Option<tokio::sync::mpsc::UnboundedReceiver<StartupReport>>,
        lifecycle: Arc<NodeLifecycle>,
        composer: Composer,
        log: Arc<Mutex<Vec<(&'static str, Option<String>)>>>,
    }

    async fn fixture(agent: bool, failing: &[&'static str]) -> Fixture {
        let mut settings = NodeSettings::default();
        settings.store.kind = StoreKind::Memory;
        settings.node.agent = agent;
        let settings = Arc::new(settings);

        let lifecycle = Arc::new(NodeLifecycle::new());
        lifecycle
            .init(settings.clone(), &DefaultStorageFactory)
            .await
            .unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        let make = |name: &'static str| -> Arc<dyn FrontEnd> {
            Arc::new(Recording {
                name,
                fail: failing.contains(&name),
                log: log.clone(),
            })
        };
        let front_ends = FrontEnds {
            rest: make("rest"),
            webapp: make("webapp"),
            webdav: make("webdav"),
        };

        let (pool, rx) = WorkerPool::new(settings.pool.capacity);
        let pool = Arc::new(pool);
        let composer = Composer::new(pool.clone(), lifecycle.clone(), front_ends, settings, Shutdown::new());

        Fixture {
            pool,
            rx: Some(rx),
            lifecycle,
            composer,
            log,
        }
    }

    #[tokio::test]
    async fn test_rest_and_bridge_start_three_front_ends() {
        let mut f = fixture(true, &[]).await;
        let supervisor = spawn_supervisor(f.rx.take().unwrap());

        let selection = FrontEndSelection {
            enable_rest: true,
            enable_filesystem_bridge: true,
        };
        let composition = f.composer.compose(selection, None).await;
        assert_eq!(composition.submitted, vec!["rest", "filesystem-bridge"]);
        assert!(composition.root.is_some());

        f.pool.shutdown();
        f.pool.drain(Duration::from_secs(1)).await;
        drop(f.pool);
        drop(f.composer);

        let mut summary = supervisor.await.unwrap();
        summary.started.sort();
        assert_eq!(summary.started, vec!["rest", "webapp", "webdav"]);
    }

    #[tokio::test]
    async fn test_webapp_failure_does_not_stop_webdav() {
        let f = fixture(true, &["webapp"]).await;
        let selection = FrontEndSelection {
            enable_rest: false,
            enable_filesystem_bridge: true,
        };
        f.composer.compose(selection, None).await;
        f.pool.drain(Duration::from_secs(1)).await;

        let log = f.log.lock().unwrap();
        let order: Vec<_> = log.iter().map(|(name, _)| *name).collect();
        assert_eq!(order, vec!["webapp", "webdav"]);
    }

    #[tokio::test]
    async fn test_supplied_root_is_used_verbatim() {
        let f = fixture(true, &[]).await;
        let root = Guid::random(HashAlgorithm::Sha512);
        let selection = FrontEndSelection {
            enable_rest: false,
            enable_filesystem_bridge: true,
        };

        let composition = f.composer.compose(selection, Some(root.clone())).await;
        assert_eq!(composition.root.as_ref().map(Guid::as_str), Some(root.as_str()));

        f.pool.drain(Duration::from_secs(1)).await;
        let log = f.log.lock().unwrap();
        assert!(log.iter().all(|(_, r)| r.as_deref() == Some(root.as_str())));
    }

    #[tokio::test]
    async fn test_failed_bridge_report_names_root() {
        let mut f = fixture(true, &["webdav"]).await;
        let root = Guid::random(HashAlgorithm::Sha256);
        let selection = FrontEndSelection {
            enable_rest: true,
            enable_filesystem_bridge: true,
        };
        f.composer.compose(selection, Some(root.clone())).await;
        f.pool.drain(Duration::from_secs(1)).await;

        let mut rx = f.rx.take().unwrap();
        let mut reports = Vec::new();
        while let Ok(report) = rx.try_recv() {
            reports.push(report);
        }
        assert_eq!(reports.len(), 3);

        let webdav = reports.iter().find(|r| r.front_end == "webdav").unwrap();
        assert!(webdav.outcome.is_err());
        assert_eq!(webdav.port, 8081);
        assert_eq!(webdav.root.as_ref(), Some(&root));

        let rest = reports.iter().find(|r| r.front_end == "rest").unwrap();
        assert!(rest.root.is_none());
    }

    #[tokio::test]
    async fn test_without_bridge_starts_webapp_alone() {
        let f = fixture(true, &[]).await;
        let composition = f.composer.compose(FrontEndSelection::default(), None).await;
        assert_eq!(composition.submitted, vec!["webapp"]);
        assert!(composition.root.is_none());

        f.pool.drain(Duration::from_secs(1)).await;
        assert_eq!(*f.log.lock().unwrap(), vec![("webapp", None)]);
    }

    #[tokio::test]
    async fn test_bridge_without_agent_is_noop() {
        let f = fixture(false, &[]).await;
        let selection = FrontEndSelection {
            enable_rest: true,
            enable_filesystem_bridge: true,
        };
        let composition = f.composer.compose(selection, None).await;
        assert_eq!(composition.submitted, vec!["rest"]);
        assert!(composition.root.is_none());
    }

    #[tokio::test]
    async fn test_start_after_kill_reports_node_unavailable() {
        let mut f = fixture(true, &[]).await;
        let supervisor = spawn_supervisor(f.rx.take().unwrap());
        f.lifecycle.kill(true).await.unwrap();

        let composition = f.composer.compose(FrontEndSelection::default(), None).await;
        assert_eq!(composition.submitted, vec!["webapp"]);

        f.pool.drain(Duration::from_secs(1)).await;
        drop(f.pool);
        drop(f.composer);
        let summary = supervisor.await.unwrap();
        assert_eq!(summary.failed, vec!["webapp"]);
        assert!(f.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_after_pool_shutdown() {
        let f = fixture(true, &[]).await;
        f.pool.shutdown();
        let composition = f.composer.compose(FrontEndSelection::default(), None).await;
        assert!(composition.submitted.is_empty());
        assert_eq!(composition.rejected, vec!["webapp"]);
    }
}
