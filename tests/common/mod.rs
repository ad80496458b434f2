//! Shared fakes for integration tests.
#![allow(dead_code)]

use futures_util::future::BoxFuture;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use sos_node::config::StoreConfig;
use sos_node::frontend::{FrontEnd, FrontEndContext, FrontEndError, FrontEnds};
use sos_node::guid::Guid;
use sos_node::lifecycle::ShutdownTrigger;
use sos_node::storage::{DefaultStorageFactory, Storage, StorageError, StorageFactory};

/// One recorded `FrontEnd::start` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Start {
    pub front_end: &'static str,
    pub port: u16,
    pub root: Option<String>,
}

pub type StartLog = Arc<Mutex<Vec<Start>>>;

/// Front end that records its start and never binds anything.
pub struct FakeFrontEnd {
    pub name: &'static str,
    pub fail: bool,
    pub delay: Duration,
    pub log: StartLog,
}

impl FrontEnd for FakeFrontEnd {
    fn name(&self) -> &'static str {
        self.name
    }

    fn start(&self, ctx: FrontEndContext, port: u16) -> BoxFuture<'static, Result<(), FrontEndError>> {
        let start = Start {
            front_end: self.name,
            port,
            root: ctx.filesystem.as_ref().map(|fs| fs.root().to_string()),
        };
        let log = self.log.clone();
        let fail = self.fail;
        let delay = self.delay;

        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            log.lock().unwrap().push(start);
            if fail {
                Err(FrontEndError::Failed("injected bind failure".into()))
            } else {
                Ok(())
            }
        })
    }
}

/// Fake front ends; names in `failing` report an error.
pub fn fake_front_ends(failing: &[&'static str], delay: Duration) -> (FrontEnds, StartLog) {
    let log: StartLog = Arc::new(Mutex::new(Vec::new()));
    let make = |name: &'static str| -> Arc<dyn FrontEnd> {
        Arc::new(FakeFrontEnd {
            name,
            fail: failing.contains(&name),
            delay,
            log: log.clone(),
        })
    };

    let front_ends = FrontEnds {
        rest: make("rest"),
        webapp: make("webapp"),
        webdav: make("webdav"),
    };
    (front_ends, log)
}

/// Storage factory that counts calls and can be told to fail.
#[derive(Default)]
pub struct CountingFactory {
    pub calls: AtomicUsize,
    pub fail: bool,
    /// Hand out stores whose `flush` always fails.
    pub fail_flush: bool,
}

impl CountingFactory {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn failing_flush() -> Self {
        Self {
            fail_flush: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StorageFactory for CountingFactory {
    fn create(&self, config: &StoreConfig) -> Result<Arc<dyn Storage>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StorageError::NotADirectory(PathBuf::from("/injected")));
        }
        let inner = DefaultStorageFactory.create(config)?;
        if self.fail_flush {
            return Ok(Arc::new(UnflushableStorage { inner }));
        }
        Ok(inner)
    }
}

/// Delegates to `inner` but refuses to flush.
#[derive(Debug)]
pub struct UnflushableStorage {
    inner: Arc<dyn Storage>,
}

impl Storage for UnflushableStorage {
    fn kind(&self) -> &'static str {
        self.inner.kind()
    }

    fn put(&self, guid: &Guid, data: &[u8]) -> Result<(), StorageError> {
        self.inner.put(guid, data)
    }

    fn get(&self, guid: &Guid) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.get(guid)
    }

    fn contains(&self, guid: &Guid) -> bool {
        self.inner.contains(guid)
    }

    fn flush(&self) -> Result<(), StorageError> {
        Err(StorageError::Flush("injected flush failure".into()))
    }
}

/// A memory-store config file; `extra` is appended verbatim.
pub fn config_file(extra: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[store]\nkind = \"memory\"\n\n[shutdown]\ndrain_timeout_secs = 2\n").unwrap();
    file.write_all(extra.as_bytes()).unwrap();
    file
}

/// Argument list for `launch`, program name included.
pub fn args(config: &tempfile::NamedTempFile, flags: &[&str]) -> Vec<String> {
    let mut args = vec![
        "sos-node".to_string(),
        "-c".to_string(),
        config.path().display().to_string(),
    ];
    args.extend(flags.iter().map(|f| f.to_string()));
    args
}

/// A trigger fired by sending on the returned channel.
pub fn manual_trigger() -> (oneshot::Sender<()>, ShutdownTrigger) {
    let (tx, rx) = oneshot::channel();
    let trigger = ShutdownTrigger::Custom(Box::pin(async move {
        let _ = rx.await;
    }));
    (tx, trigger)
}

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}
