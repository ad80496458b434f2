//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Parse CLI → Load config → Init node → Submit front ends → Register handler
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop pool → Drain startups → Kill node → Log termination
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT/SIGQUIT → Trigger the termination handler
//!
//! State (state.rs):
//!     Process state machine shared by startup and shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then node, then front ends
//! - Fail fast before the node is ready, contain failures after
//! - Ordered shutdown: stop pool, kill node, log; the handler runs once

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use shutdown::{Shutdown, ShutdownCoordinator, ShutdownState, TerminationHandle, TerminationRecord};
pub use startup::{launch, Collaborators, ConfigurationError, Launch, LaunchError, ShutdownTrigger};
pub use state::{ProcessState, ProcessStatus};
