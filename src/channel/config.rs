//! SSH channel configuration and validation.
//!
//! [`ChannelConfig`] is loaded via `ortho-config`, which merges defaults,
//! configuration files, and environment variables.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use super::ChannelError;

/// Default SSH user; the host tool's own login shell dispatches commands.
pub const DEFAULT_SSH_USER: &str = "dokku";

/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Default connect timeout handed to the `ssh` client, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// SSH transport settings loaded via `ortho-config`.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "DOKKU_RECONCILE",
    discovery(
        app_name = "dokku-reconcile",
        env_var = "DOKKU_RECONCILE_CONFIG_PATH",
        config_file_name = "dokku-reconcile.toml",
        dotfile_name = ".dokku-reconcile.toml",
        project_file_name = "dokku-reconcile.toml"
    )
)]
pub struct ChannelConfig {
    /// Path to the `ssh` executable.
    #[ortho_config(default = "ssh".to_owned())]
    pub ssh_bin: String,
    /// Remote user to connect as.
    #[ortho_config(default = DEFAULT_SSH_USER.to_owned())]
    pub ssh_user: String,
    /// Hostname or address of the managed host. Required.
    pub host: String,
    /// SSH port on the managed host.
    #[ortho_config(default = DEFAULT_SSH_PORT)]
    pub ssh_port: u16,
    /// Path to the SSH private key. Supports tilde expansion. When absent the
    /// `ssh` client falls back to its default key locations.
    pub ssh_identity_file: Option<String>,
    /// Whether to force batch mode so SSH never prompts for a password.
    #[ortho_config(default = true)]
    pub ssh_batch_mode: bool,
    /// Whether to enforce host key checking.
    #[ortho_config(default = true)]
    pub ssh_strict_host_key_checking: bool,
    /// Known hosts file override.
    pub ssh_known_hosts_file: Option<String>,
    /// Connect timeout passed to the `ssh` client, in seconds.
    #[ortho_config(default = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub ssh_connect_timeout_secs: u64,
    /// Word prepended to every command, for example `dokku` when logging in
    /// as a regular user rather than the host tool's own account.
    pub command_prefix: Option<String>,
    /// Optional TOML file overriding the built-in output grammar.
    pub grammar_file: Option<String>,
}

/// Errors raised when loading the channel configuration from layered sources.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ChannelConfigLoadError {
    /// Indicates that parsing or merging configuration layers failed.
    #[error("channel configuration parsing failed: {0}")]
    Parse(String),
}

impl ChannelConfig {
    /// Builds a configuration for `host` with every other field defaulted.
    #[must_use]
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            ssh_bin: String::from("ssh"),
            ssh_user: DEFAULT_SSH_USER.to_owned(),
            host: host.into(),
            ssh_port: DEFAULT_SSH_PORT,
            ssh_identity_file: None,
            ssh_batch_mode: true,
            ssh_strict_host_key_checking: true,
            ssh_known_hosts_file: None,
            ssh_connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            command_prefix: None,
            grammar_file: None,
        }
    }

    /// Ensures configuration values are present after trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::InvalidConfig`] when any required field is
    /// empty, an optional field is set to a blank value, or the port is zero.
    pub fn validate(&self) -> Result<(), ChannelError> {
        Self::require_value(&self.ssh_bin, "ssh_bin")?;
        Self::require_value(&self.ssh_user, "ssh_user")?;
        Self::require_value(&self.host, "host")?;
        if self.ssh_port == 0 {
            return Err(ChannelError::InvalidConfig {
                field: String::from("ssh_port"),
            });
        }
        Self::require_optional_value(self.ssh_identity_file.as_deref(), "ssh_identity_file")?;
        Self::require_optional_value(self.ssh_known_hosts_file.as_deref(), "ssh_known_hosts_file")?;
        Self::require_optional_value(self.command_prefix.as_deref(), "command_prefix")?;
        Self::require_optional_value(self.grammar_file.as_deref(), "grammar_file")?;
        Ok(())
    }

    /// Loads configuration from defaults, configuration files, and
    /// environment variables without parsing CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelConfigLoadError::Parse`] when merging sources fails.
    pub fn load_without_cli_args() -> Result<Self, ChannelConfigLoadError> {
        Self::load_from_iter([std::ffi::OsString::from("dokku-reconcile")])
            .map_err(|err| ChannelConfigLoadError::Parse(err.to_string()))
    }

    /// Loads configuration using the process argument iterator.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelConfigLoadError::Parse`] when merging sources fails.
    pub fn load_from_sources() -> Result<Self, ChannelConfigLoadError> {
        Self::load().map_err(|err| ChannelConfigLoadError::Parse(err.to_string()))
    }

    /// Returns the `user@host` destination string.
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.ssh_user, self.host)
    }

    fn require_optional_value(value: Option<&str>, field: &str) -> Result<(), ChannelError> {
        match value {
            None => Ok(()),
            Some(v) if !v.trim().is_empty() => Ok(()),
            Some(_) => Err(ChannelError::InvalidConfig {
                field: field.to_owned(),
            }),
        }
    }

    fn require_value(value: &str, field: &str) -> Result<(), ChannelError> {
        Self::require_optional_value(Some(value), field)
    }
}
