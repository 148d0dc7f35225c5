//! Command channel backed by the system `ssh` client.

use std::ffi::OsString;

use tracing::debug;

use super::{ChannelConfig, ChannelError, CommandChannel, CommandOutput, CommandRunner};
use super::{ProcessCommandRunner, util::expand_tilde};

/// Exit status the OpenSSH client reserves for its own failures.
pub const SSH_TRANSPORT_FAILURE: i32 = 255;

/// Executes host tool commands over SSH using the configured runner.
#[derive(Clone, Debug)]
pub struct SshChannel<R: CommandRunner> {
    config: ChannelConfig,
    runner: R,
}

impl SshChannel<ProcessCommandRunner> {
    /// Convenience constructor that wires the real process runner.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::InvalidConfig`] when validation fails.
    pub fn with_process_runner(config: ChannelConfig) -> Result<Self, ChannelError> {
        Self::new(config, ProcessCommandRunner)
    }
}

impl<R: CommandRunner> SshChannel<R> {
    /// Creates a new channel using the provided runner and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::InvalidConfig`] when configuration validation
    /// fails.
    pub fn new(config: ChannelConfig, runner: R) -> Result<Self, ChannelError> {
        config.validate()?;
        Ok(Self { config, runner })
    }

    /// Returns a reference to the underlying configuration.
    #[must_use]
    pub const fn config(&self) -> &ChannelConfig {
        &self.config
    }

    fn build_ssh_args(&self, command: &str) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("-p"),
            OsString::from(self.config.ssh_port.to_string()),
        ];

        if let Some(ref identity_file) = self.config.ssh_identity_file {
            args.push(OsString::from("-i"));
            args.push(OsString::from(expand_tilde(identity_file)));
        }

        if self.config.ssh_batch_mode {
            args.push(OsString::from("-o"));
            args.push(OsString::from("BatchMode=yes"));
        }

        if !self.config.ssh_strict_host_key_checking {
            args.push(OsString::from("-o"));
            args.push(OsString::from("StrictHostKeyChecking=no"));
        }

        if let Some(ref known_hosts) = self.config.ssh_known_hosts_file {
            args.push(OsString::from("-o"));
            args.push(OsString::from(format!("UserKnownHostsFile={known_hosts}")));
        }

        args.push(OsString::from("-o"));
        args.push(OsString::from(format!(
            "ConnectTimeout={}",
            self.config.ssh_connect_timeout_secs
        )));

        args.push(OsString::from(self.config.destination()));
        args.push(OsString::from(self.remote_command(command)));
        args
    }

    fn remote_command(&self, command: &str) -> String {
        match self.config.command_prefix {
            Some(ref prefix) => format!("{} {command}", prefix.trim()),
            None => command.to_owned(),
        }
    }

    fn transport_failure(&self, output: &CommandOutput) -> ChannelError {
        ChannelError::Transport {
            host: self.config.host.clone(),
            status_text: output.status_text(),
            stderr: output.stderr.trim().to_owned(),
        }
    }
}

impl<R: CommandRunner> CommandChannel for SshChannel<R> {
    fn execute(&self, command: &str) -> Result<CommandOutput, ChannelError> {
        debug!(host = %self.config.host, command, "executing remote command");
        let args = self.build_ssh_args(command);
        let output = self.runner.run(&self.config.ssh_bin, &args)?;

        match output.code {
            None | Some(SSH_TRANSPORT_FAILURE) => Err(self.transport_failure(&output)),
            Some(code) => {
                debug!(host = %self.config.host, command, code, "remote command finished");
                Ok(output)
            }
        }
    }
}
