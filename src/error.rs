//! Error types for discovery, loading and running applets.
//!
//! None of these are fatal: every path ends with the navigator back in its
//! browsing state.

use std::io;
use std::path::PathBuf;

/// A single applet package could not be turned into a manifest.
///
/// Discovery logs the error and moves on to the next package.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("descriptor not found in {0}")]
    MissingDescriptor(PathBuf),
    #[error("malformed descriptor {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A catalog entry could not be constructed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("applet `{0}` is not in the catalog")]
    UnknownApplet(String),
    #[error("entry point `{entry_point}` of applet `{applet}` is not available")]
    EntryPointUnavailable { applet: String, entry_point: String },
    #[error("entry point `{entry_point}` does not export `{class_name}` (applet `{applet}`)")]
    TypeNotExported {
        applet: String,
        entry_point: String,
        class_name: String,
    },
}

/// Why an applet's `start` returned early.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AppletError {
    /// The environment raised the interrupt latch while the applet was running.
    #[error("interrupted")]
    Interrupted,
    #[error("{0}")]
    Failed(String),
}
