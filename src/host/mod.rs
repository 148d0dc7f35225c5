//! Typed queries and mutations against one managed host.
//!
//! Every method issues exactly one command through the channel and decodes
//! the result; nothing is cached between calls.

use camino::Utf8Path;
use tracing::{debug, info};

use crate::channel::{ChannelConfig, CommandChannel, CommandOutput, CommandRunner, SshChannel};
use crate::grammar::Grammar;

mod command;
mod error;
mod facts;
mod mutations;

pub use command::CommandLine;
pub use error::{ConnectError, HostError};

/// Client for the host tool over a command channel.
#[derive(Clone, Debug)]
pub struct Host<C: CommandChannel> {
    channel: C,
    grammar: Grammar,
}

impl<C: CommandChannel> Host<C> {
    /// Creates a client using the built-in grammar.
    #[must_use]
    pub fn new(channel: C) -> Self {
        Self::with_grammar(channel, Grammar::default())
    }

    /// Creates a client using an explicit grammar table.
    #[must_use]
    pub const fn with_grammar(channel: C, grammar: Grammar) -> Self {
        Self { channel, grammar }
    }

    /// Returns the grammar used to decode output.
    #[must_use]
    pub const fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Returns the underlying channel.
    #[must_use]
    pub const fn channel(&self) -> &C {
        &self.channel
    }

    /// Runs `command` and returns its output whatever the exit status.
    fn run(&self, command: &CommandLine) -> Result<(String, CommandOutput), HostError> {
        let text = command.render();
        debug!(command = %text, "issuing host command");
        let output = self.channel.execute(&text)?;
        Ok((text, output))
    }

    /// Runs `command` and requires a successful exit.
    fn run_ok(&self, command: &CommandLine) -> Result<CommandOutput, HostError> {
        let (text, output) = self.run(command)?;
        if output.is_success() {
            return Ok(output);
        }
        Err(HostError::Remote {
            command: text,
            status_text: output.status_text(),
            stderr: output.stderr.trim().to_owned(),
        })
    }
}

impl<R: CommandRunner> Host<SshChannel<R>> {
    /// Builds an SSH-backed client from `config`, loading the grammar
    /// override named by `grammar_file` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::Channel`] when the configuration is invalid
    /// and [`ConnectError::Grammar`] when the grammar file cannot be loaded.
    pub fn connect(config: ChannelConfig, runner: R) -> Result<Self, ConnectError> {
        let channel = SshChannel::new(config, runner)?;
        let settings = channel.config();
        let grammar = settings
            .grammar_file
            .as_deref()
            .map_or_else(|| Ok(Grammar::default()), |path| Grammar::load(Utf8Path::new(path)))?;
        info!(
            destination = %settings.destination(),
            grammar_override = settings.grammar_file.is_some(),
            "host client ready"
        );
        Ok(Self::with_grammar(channel, grammar))
    }
}
