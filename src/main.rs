//! SOS node
//!
//! ```text
//!   sos-node -c <PATH> [-j] [-fs [-root <GUID>]]
//!
//!   ┌──────────┐   ┌──────────────┐   ┌────────────────────────────────┐
//!   │   cli    │──▶│    node      │──▶│       frontend pool (3)        │
//!   │ + config │   │  lifecycle   │   │  rest │ webapp → webdav │ ... │
//!   └──────────┘   └──────┬───────┘   └────────────────────────────────┘
//!                         │
//!                         ▼
//!                ┌──────────────────┐
//!                │ shutdown handler │  SIGTERM/SIGINT/SIGQUIT
//!                │ drain → kill →   │
//!                │ termination log  │
//!                └──────────────────┘
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use sos_node::lifecycle::{launch, Collaborators, ProcessStatus};
use sos_node::observability::logging::{init_logging, DEFAULT_FILTER};

#[tokio::main]
async fn main() -> ExitCode {
    let logging = init_logging(DEFAULT_FILTER);

    tracing::info!("sos-node v{} starting", env!("CARGO_PKG_VERSION"));

    let collaborators = Collaborators {
        logging,
        ..Collaborators::default()
    };
    let status = Arc::new(ProcessStatus::new());

    let running = match launch(std::env::args_os(), collaborators, status.clone()).await {
        Ok(running) => running,
        Err(e) if e.is_informational() => {
            if let Some(version) = e.version_text() {
                print!("{version}");
            }
            return e.exit_code();
        }
        Err(e) => {
            tracing::error!(error = %e, state = %status.current(), "Startup failed");
            eprintln!("{e}");
            return e.exit_code();
        }
    };

    running.finish().await
}
