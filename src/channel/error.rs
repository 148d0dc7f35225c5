//! Errors raised by the command channel.

use thiserror::Error;

/// Errors surfaced while executing a command on the remote host.
///
/// Every variant is a transport failure: the round trip did not complete and
/// no remote output is available to classify.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ChannelError {
    /// Raised when configuration is missing required values. The error message
    /// includes guidance on how to provide the value via environment variable
    /// or configuration file.
    #[error("missing {field}: set DOKKU_RECONCILE_{env_suffix} or add {field} to dokku-reconcile.toml", env_suffix = field.to_uppercase())]
    InvalidConfig {
        /// Configuration field that failed validation.
        field: String,
    },
    /// Raised when the local transport process cannot be spawned.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Command that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
    /// Raised when the transport started but the round trip did not complete.
    #[error("transport to {host} failed with status {status_text}: {stderr}")]
    Transport {
        /// Remote host the command was addressed to.
        host: String,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Stderr captured from the transport client.
        stderr: String,
    },
    /// Raised when a serialised channel's lock was poisoned by a panicking
    /// holder.
    #[error("command channel lock poisoned")]
    Poisoned,
}
