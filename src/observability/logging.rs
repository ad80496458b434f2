//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Honour `RUST_LOG`, falling back to a caller supplied filter
//! - Apply the configured `log_level` once the config file is read
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Initialised before the config file is read, so config errors are logged too

use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Default filter when neither `RUST_LOG` nor the config say otherwise.
pub const DEFAULT_FILTER: &str = "sos_node=info,tower_http=info";

/// Handle to the installed filter.
///
/// A filter taken from `RUST_LOG` is never replaced.
#[derive(Clone)]
pub struct LogHandle {
    reload: Option<reload::Handle<EnvFilter, Registry>>,
}

impl LogHandle {
    /// A handle that ignores level changes (no subscriber installed by us).
    pub fn detached() -> Self {
        Self { reload: None }
    }

    /// Switch to the configured level, unless `RUST_LOG` is in charge.
    pub fn apply_level(&self, level: &str) {
        let Some(reload) = &self.reload else {
            return;
        };

        match EnvFilter::try_new(filter_for_level(level)) {
            Ok(filter) => {
                if let Err(e) = reload.reload(filter) {
                    tracing::warn!(error = %e, "Could not apply log level");
                }
            }
            Err(e) => tracing::warn!(level, error = %e, "Ignoring invalid log level"),
        }
    }
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle")
            .field("reloadable", &self.reload.is_some())
            .finish()
    }
}

/// Install the global subscriber.
///
/// Returns a detached handle if a subscriber was already installed.
pub fn init_logging(default_filter: &str) -> LogHandle {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(default_filter), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if installed && !from_env {
        LogHandle {
            reload: Some(handle),
        }
    } else {
        LogHandle::detached()
    }
}

/// Filter string for a configured log level, scoped to this crate.
pub fn filter_for_level(level: &str) -> String {
    format!("sos_node={level},tower_http={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_for_level() {
        assert_eq!(filter_for_level("debug"), "sos_node=debug,tower_http=debug");
        assert!(EnvFilter::try_new(filter_for_level("warn")).is_ok());
    }

    #[test]
    fn test_detached_handle_ignores_levels() {
        let handle = LogHandle::detached();
        handle.apply_level("debug");
        assert_eq!(format!("{handle:?}"), "LogHandle { reloadable: false }");
    }
}
