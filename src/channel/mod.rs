//! Command channel: one text command in, one captured result out.
//!
//! The channel owns the transport. Callers hand it a fully assembled command
//! string and receive stdout, stderr, and the exit status; deciding whether a
//! non-zero status means "absent" or "broken" is left to the output parser.
//! Each call is exactly one blocking round trip with no retries.

use std::sync::Mutex;

mod config;
mod error;
mod ssh;
mod types;
mod util;

pub use config::{
    ChannelConfig, ChannelConfigLoadError, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_SSH_PORT,
    DEFAULT_SSH_USER,
};
pub use error::ChannelError;
pub use ssh::{SSH_TRANSPORT_FAILURE, SshChannel};
pub use types::{CommandOutput, CommandRunner, ProcessCommandRunner};
pub use util::expand_tilde;

/// Executes a single command against the managed host.
pub trait CommandChannel {
    /// Runs `command` remotely and captures its result.
    ///
    /// The command text is not templated or escaped.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] when the round trip could not be completed.
    fn execute(&self, command: &str) -> Result<CommandOutput, ChannelError>;
}

impl<C: CommandChannel + ?Sized> CommandChannel for &C {
    fn execute(&self, command: &str) -> Result<CommandOutput, ChannelError> {
        (**self).execute(command)
    }
}

/// Wraps a channel so that at most one command is in flight at a time.
///
/// Share one instance (for example behind an `Arc`) between reconciliation
/// flows targeting the same host.
#[derive(Debug, Default)]
pub struct SerializedChannel<C> {
    inner: Mutex<C>,
}

impl<C: CommandChannel> SerializedChannel<C> {
    /// Wraps `inner`.
    #[must_use]
    pub const fn new(inner: C) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Consumes the wrapper, returning the inner channel.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Poisoned`] when a previous holder panicked.
    pub fn into_inner(self) -> Result<C, ChannelError> {
        self.inner.into_inner().map_err(|_| ChannelError::Poisoned)
    }
}

impl<C: CommandChannel> CommandChannel for SerializedChannel<C> {
    fn execute(&self, command: &str) -> Result<CommandOutput, ChannelError> {
        let guard = self.inner.lock().map_err(|_| ChannelError::Poisoned)?;
        guard.execute(command)
    }
}
