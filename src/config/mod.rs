//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), path given with -c
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → NodeSettings (validated, immutable)
//!     → shared via Arc with the node and every front end
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Any loading failure is fatal before the node is initialised

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::NodeSettings;
pub use schema::{StoreConfig, StoreKind};
pub use validation::ValidationError;
