//! Command-line arguments.
//!
//! Multi-letter flags are traditionally spelled with one dash (`-fs`,
//! `-root`); they are rewritten to their long form before clap sees them.

use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::frontend::FrontEndSelection;

/// Separator printed under the usage synopsis.
pub const SEPARATOR: &str = "=====================================================";

#[derive(Debug, Clone, Parser)]
#[command(name = "sos-node", version)]
#[command(about = "Start an SOS node and its front ends", long_about = None)]
pub struct Args {
    /// Node configuration file
    #[arg(short = 'c', value_name = "PATH")]
    pub config: PathBuf,

    /// Start the REST API
    #[arg(short = 'j')]
    pub rest: bool,

    /// Mount the filesystem bridge (web UI and WebDAV)
    #[arg(long = "fs")]
    pub filesystem: bool,

    /// Root GUID of the filesystem bridge (with -fs)
    #[arg(long = "root", value_name = "GUID")]
    pub root: Option<String>,
}

impl Args {
    pub fn selection(&self) -> FrontEndSelection {
        FrontEndSelection {
            enable_rest: self.rest,
            enable_filesystem_bridge: self.filesystem,
        }
    }
}

/// Parse a full argument list, program name first.
pub fn parse_args<I, T>(args: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    Args::try_parse_from(normalize_args(args))
}

/// Rewrite `-fs` and `-root` (and `-root=GUID`) to double-dash form.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            match text {
                "-fs" | "-root" => OsString::from(format!("-{text}")),
                _ if text.starts_with("-root=") => OsString::from(format!("-{text}")),
                _ => arg,
            }
        })
        .collect()
}

/// Usage synopsis shown at every start.
pub fn usage_text() -> String {
    Args::command().render_help().to_string()
}
