//! Error types for the remote channel

use thiserror::Error;

/// Unified error type for channel operations
///
/// A remote command that runs but exits non-zero is NOT an error at this
/// layer; it is surfaced through [`crate::ExecOutput`] and the caller decides
/// whether it is fatal. Errors here mean the channel itself failed.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to spawn a local process
    #[error("failed to spawn process: {reason}")]
    SpawnFailed {
        /// The reason for the spawn failure
        reason: String,
    },

    /// Could not establish a connection to the remote host
    #[error("connection to {host} failed: {reason}")]
    ConnectionFailed {
        /// The hostname or address that failed to connect
        host: String,
        /// The detailed reason for the connection failure
        reason: String,
    },

    /// A file transfer failed
    #[error("transfer of {path} failed: {reason}")]
    TransferFailed {
        /// The path being transferred
        path: String,
        /// The detailed reason for the transfer failure
        reason: String,
    },

    /// A directory mirror failed
    #[error("mirror failed: {reason}")]
    MirrorFailed {
        /// The detailed reason for the mirror failure
        reason: String,
    },

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a spawn failed error
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            reason: reason.into(),
        }
    }

    /// Create a connection failed error
    pub fn connection_failed(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            host: host.into(),
            reason: reason.into(),
        }
    }

    /// Create a transfer failed error
    pub fn transfer_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TransferFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
