//! HTTP front ends.
//!
//! # Data Flow
//! ```text
//! FrontEnd::start(context, port)
//!     → server.rs (bind, middleware, graceful shutdown)
//!     → rest.rs   (REST API over the node's agent)
//!     → webapp.rs (web UI, optionally showing the filesystem bridge)
//!     → webdav.rs (filesystem bridge over WebDAV)
//! ```

pub mod rest;
pub mod server;
pub mod webapp;
pub mod webdav;

pub use rest::RestApi;
pub use webapp::WebApp;
pub use webdav::WebDav;
