//! Errors raised by fact extractors and mutations.

use thiserror::Error;

use crate::channel::ChannelError;
use crate::grammar::GrammarError;
use crate::parse::ParseError;

/// Failure of a single query or mutation against the host.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum HostError {
    /// The command round trip did not complete.
    #[error("transport failure: {0}")]
    Channel(#[from] ChannelError),
    /// The command ran but its output did not match the grammar.
    #[error("unparseable output from `{command}`: {source}")]
    Parse {
        /// Command whose output was rejected.
        command: String,
        /// Underlying parse failure.
        #[source]
        source: ParseError,
    },
    /// The host tool reported a failure.
    #[error("`{command}` exited with status {status_text}: {stderr}")]
    Remote {
        /// Command that failed.
        command: String,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Verbatim stderr text.
        stderr: String,
    },
}

/// Errors raised while wiring a [`super::Host`] from configuration.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConnectError {
    /// The channel configuration was rejected.
    #[error(transparent)]
    Channel(#[from] ChannelError),
    /// The configured grammar override could not be loaded.
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}
