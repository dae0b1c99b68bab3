//! Error taxonomy shared by every component
//!
//! External failures (kube, reqwest, filesystem) are converted into one of
//! these kinds at the component boundary. The underlying reason is kept as
//! text so the CLI can report it.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T, E = ShellError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ShellError {
    /// Cluster unreachable or credentials rejected
    #[error("unable to reach the cluster during {call}: {reason}")]
    Connectivity { call: &'static str, reason: String },

    /// The named Deployment does not exist in the namespace
    #[error("deployment {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    /// kubectl could not be downloaded and no fallback exists on PATH
    #[error("unable to download kubectl {version}: {reason}")]
    Download { version: String, reason: String },

    /// No usable cluster configuration could be loaded
    #[error("no usable cluster configuration: {0}")]
    Config(String),

    #[error("cluster reported an unusable version string: {0:?}")]
    InvalidVersion(String),

    #[error("deployment {namespace}/{name} cannot be debugged: {reason}")]
    InvalidWorkload {
        namespace: String,
        name: String,
        reason: String,
    },

    #[error("binary cache error at {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize override document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to launch {}: {source}", program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ShellError {
    pub(crate) fn cache(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Cache {
            path: path.into(),
            source,
        }
    }
}
