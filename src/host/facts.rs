//! Fact extractors.

use std::collections::BTreeSet;

use tracing::debug;

use crate::channel::CommandChannel;
use crate::entity::{AppName, Domain, ServiceKind, ServiceName};
use crate::parse::{RemoteFailure, Report, decode_flag, decode_signal};

use super::{CommandLine, Host, HostError};

impl<C: CommandChannel> Host<C> {
    /// Domains currently bound to `app`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Remote`] when the report command fails and
    /// [`HostError::Parse`] when the vhosts key is missing from the report.
    pub fn domains(&self, app: &AppName) -> Result<BTreeSet<String>, HostError> {
        let command = CommandLine::new("domains", "report").arg(app);
        let output = self.run_ok(&command)?;
        let domains = Report::parse(&output.stdout)
            .list(&self.grammar.domains_vhosts)
            .map_err(|source| HostError::Parse {
                command: command.render(),
                source,
            })?;
        debug!(app = %app, count = domains.len(), "decoded domain list");
        Ok(domains)
    }

    /// Whether `domain` is bound to `app`.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Host::domains`].
    pub fn domain_bound(&self, app: &AppName, domain: &Domain) -> Result<bool, HostError> {
        Ok(self.domains(app)?.contains(domain.as_str()))
    }

    /// Whether automatic certificates are active for `app`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Remote`] when the query fails and
    /// [`HostError::Parse`] when it prints neither flag literal.
    pub fn certificate_active(&self, app: &AppName) -> Result<bool, HostError> {
        let command = CommandLine::new("letsencrypt", "active").arg(app);
        let output = self.run_ok(&command)?;
        let active = decode_flag("letsencrypt active", &output.stdout, &self.grammar.letsencrypt_flag)
            .map_err(|source| HostError::Parse {
                command: command.render(),
                source,
            })?;
        debug!(app = %app, active, "decoded certificate flag");
        Ok(active)
    }

    /// Whether the global certificate renewal job is installed.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Remote`] when the cron listing fails.
    pub fn renewal_job_installed(&self) -> Result<bool, HostError> {
        let command = CommandLine::new("cron", "list").switch("global");
        let output = self.run_ok(&command)?;
        let installed = output.stdout.contains(self.grammar.renewal_job_marker.as_str());
        debug!(installed, "decoded renewal job presence");
        Ok(installed)
    }

    /// Whether service `service` of plugin `kind` exists.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Remote`] when the check fails with stderr that is
    /// not a recognised absence.
    pub fn service_exists(&self, kind: ServiceKind, service: &ServiceName) -> Result<bool, HostError> {
        let command = CommandLine::new(kind.namespace(), "exists").arg(service);
        let (text, output) = self.run(&command)?;
        let exists = decode_signal(output, &self.grammar.service_missing)
            .map_err(|failure| remote_failure(text, failure))?;
        debug!(%kind, service = %service, exists, "decoded service presence");
        Ok(exists)
    }

    /// Whether `service` is linked to `app`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Remote`] when the check fails with stderr that is
    /// not a recognised absence.
    pub fn service_linked(
        &self,
        kind: ServiceKind,
        service: &ServiceName,
        app: &AppName,
    ) -> Result<bool, HostError> {
        let command = CommandLine::new(kind.namespace(), "linked")
            .arg(service)
            .arg(app);
        let (text, output) = self.run(&command)?;
        let linked = decode_signal(output, &self.grammar.link_missing)
            .map_err(|failure| remote_failure(text, failure))?;
        debug!(%kind, service = %service, app = %app, linked, "decoded link presence");
        Ok(linked)
    }
}

fn remote_failure(command: String, failure: RemoteFailure) -> HostError {
    HostError::Remote {
        command,
        status_text: failure.status_text,
        stderr: failure.stderr,
    }
}
