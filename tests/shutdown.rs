//! Termination handling while front ends are still starting.

mod common;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use common::{args, config_file, fake_front_ends, manual_trigger, CountingFactory};
use sos_node::frontend::{PoolError, StartupReport};
use sos_node::lifecycle::{launch, Collaborators, ProcessState, ProcessStatus, ShutdownState};
use sos_node::node::KillOutcome;

async fn no_reports() -> Vec<StartupReport> {
    Vec::new()
}

#[tokio::test]
async fn test_termination_during_startup() {
    let config = config_file("");
    let (front_ends, log) = fake_front_ends(&[], Duration::from_millis(300));
    let (tx, trigger) = manual_trigger();
    let status = Arc::new(ProcessStatus::new());

    let running = launch(
        args(&config, &["-j", "-fs"]),
        Collaborators {
            storage: Arc::new(CountingFactory::default()),
            front_ends,
            trigger,
            ..Collaborators::default()
        },
        status.clone(),
    )
    .await
    .unwrap();

    let pool = running.pool.clone();
    let lifecycle = running.lifecycle.clone();
    let coordinator = running.coordinator.clone();

    // Fire while every startup is still sleeping.
    tx.send(()).unwrap();
    let (record, _) = running.wait().await;
    let record = record.unwrap();

    assert_eq!(record.kill.unwrap(), KillOutcome::Killed);
    assert_eq!(record.drain.pending, 0);
    assert_eq!(lifecycle.teardown_count(), 1);
    assert!(!lifecycle.is_live().await);

    assert!(pool.is_shutdown());
    assert_eq!(pool.submit("late", no_reports()), Err(PoolError::Rejected("late")));

    // The handler does not run twice.
    assert!(coordinator.terminate().await.is_none());
    assert_eq!(coordinator.state(), ShutdownState::Done);
    assert_eq!(lifecycle.teardown_count(), 1);
    assert_eq!(status.current(), ProcessState::Terminated);

    // In-flight startups were allowed to finish.
    assert_eq!(log.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_slow_startup_is_detached_after_drain_timeout() {
    let config = config_file("");
    let (front_ends, _log) = fake_front_ends(&[], Duration::from_secs(30));
    let (tx, trigger) = manual_trigger();

    let running = launch(
        args(&config, &["-j"]),
        Collaborators {
            storage: Arc::new(CountingFactory::default()),
            front_ends,
            trigger,
            ..Collaborators::default()
        },
        Arc::new(ProcessStatus::new()),
    )
    .await
    .unwrap();
    let lifecycle = running.lifecycle.clone();

    tx.send(()).unwrap();
    let started = tokio::time::Instant::now();
    let (record, _) = tokio::time::timeout(Duration::from_secs(10), running.wait())
        .await
        .unwrap();
    let record = record.unwrap();

    assert!(record.drain.pending >= 1);
    // The stuck startups still hold node leases, so kill gives up too.
    assert!(record.kill.is_err());
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(lifecycle.teardown_count(), 0);
}

#[tokio::test]
async fn test_failed_flush_still_exits_cleanly() {
    let config = config_file("");
    let (front_ends, _log) = fake_front_ends(&[], Duration::ZERO);
    let (tx, trigger) = manual_trigger();
    let status = Arc::new(ProcessStatus::new());

    let running = launch(
        args(&config, &["-j"]),
        Collaborators {
            storage: Arc::new(CountingFactory::failing_flush()),
            front_ends,
            trigger,
            ..Collaborators::default()
        },
        status.clone(),
    )
    .await
    .unwrap();

    let lifecycle = running.lifecycle.clone();
    let coordinator = running.coordinator.clone();

    tx.send(()).unwrap();
    let code = running.finish().await;
    assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::SUCCESS));

    assert_eq!(lifecycle.teardown_count(), 1);
    assert!(!lifecycle.is_live().await);
    assert_eq!(coordinator.state(), ShutdownState::Done);
    assert_eq!(status.current(), ProcessState::Terminated);
}
