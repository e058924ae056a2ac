//! Error types for caddy-gen
//!
//! [`Error`] covers failures that abort a reconcile pass or the watcher loop.
//! [`BindingError`] covers one malformed binding group inside a container label;
//! those are skipped and logged, never propagated out of a pass.

use thiserror::Error;

/// Result type alias for caddy-gen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Container runtime errors (listing, event stream)
    #[error("Container runtime error: {0}")]
    Inventory(String),

    /// Notification command errors
    #[error("Notify error: {0}")]
    Notify(String),

    /// Output file errors
    #[error("Output store error: {0}")]
    OutputStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a container runtime error
    pub fn inventory(msg: impl Into<String>) -> Self {
        Self::Inventory(msg.into())
    }

    /// Create a notify error
    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify(msg.into())
    }

    /// Create an output store error
    pub fn output_store(msg: impl Into<String>) -> Self {
        Self::OutputStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// A binding group that could not be turned into a route
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// Nothing before the first `|`
    #[error("binding has an empty head")]
    EmptyHead,

    /// Head holds only a path matcher
    #[error("binding '{head}' has no port")]
    MissingPort {
        /// The offending head
        head: String,
    },

    /// Port token is not a number in 1..=65535
    #[error("invalid port '{token}' in binding '{head}'")]
    InvalidPort {
        /// The offending token
        token: String,
        /// The head it came from
        head: String,
    },

    /// Container has no address on the scanned network
    #[error("container '{container}' has no IP address on network '{network}'")]
    MissingProxyTarget {
        /// Container display name
        container: String,
        /// Network that was scanned
        network: String,
    },
}
