//! SOS node bootstrap library.
//!
//! Parses the command line, initialises a single storage node, launches
//! the requested front ends on a worker pool and tears everything down
//! once on a termination signal.

pub mod cli;
pub mod config;
pub mod filesystem;
pub mod frontend;
pub mod guid;
pub mod http;
pub mod lifecycle;
pub mod node;
pub mod observability;
pub mod storage;

pub use config::NodeSettings;
pub use guid::Guid;
pub use lifecycle::{launch, Collaborators, Launch, LaunchError};
pub use node::{Node, NodeLifecycle};
