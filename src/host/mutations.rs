//! Mutation operations. Each returns success or the host's verbatim failure.

use tracing::info;

use crate::channel::CommandChannel;
use crate::entity::{Alias, AppName, Domain, ServiceKind, ServiceName};

use super::{CommandLine, Host, HostError};

impl<C: CommandChannel> Host<C> {
    /// Binds `domain` to `app`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the command fails.
    pub fn add_domain(&self, app: &AppName, domain: &Domain) -> Result<(), HostError> {
        self.mutate(&CommandLine::new("domains", "add").arg(app).arg(domain))
    }

    /// Unbinds `domain` from `app`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the command fails.
    pub fn remove_domain(&self, app: &AppName, domain: &Domain) -> Result<(), HostError> {
        self.mutate(&CommandLine::new("domains", "remove").arg(app).arg(domain))
    }

    /// Enables automatic certificates for `app`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the command fails.
    pub fn enable_certificate(&self, app: &AppName) -> Result<(), HostError> {
        self.mutate(&CommandLine::new("letsencrypt", "enable").arg(app))
    }

    /// Disables automatic certificates for `app`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the command fails.
    pub fn disable_certificate(&self, app: &AppName) -> Result<(), HostError> {
        self.mutate(&CommandLine::new("letsencrypt", "disable").arg(app))
    }

    /// Installs the global certificate renewal job.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the command fails.
    pub fn install_renewal_job(&self) -> Result<(), HostError> {
        self.mutate(&CommandLine::new("letsencrypt", "cron-job").switch("add"))
    }

    /// Links `service` to `app`, exposing it under `alias` when given.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the command fails.
    pub fn link_service(
        &self,
        kind: ServiceKind,
        service: &ServiceName,
        app: &AppName,
        alias: Option<&Alias>,
    ) -> Result<(), HostError> {
        self.mutate(
            &CommandLine::new(kind.namespace(), "link")
                .arg(service)
                .arg(app)
                .flag("alias", alias),
        )
    }

    /// Unlinks `service` from `app`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the command fails.
    pub fn unlink_service(
        &self,
        kind: ServiceKind,
        service: &ServiceName,
        app: &AppName,
    ) -> Result<(), HostError> {
        self.mutate(
            &CommandLine::new(kind.namespace(), "unlink")
                .arg(service)
                .arg(app),
        )
    }

    fn mutate(&self, command: &CommandLine) -> Result<(), HostError> {
        self.run_ok(command)?;
        info!(command = %command, "host mutation applied");
        Ok(())
    }
}
