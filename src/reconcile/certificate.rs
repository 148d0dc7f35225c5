//! Certificate lifecycle state machine.
//!
//! Enabling certificates also ensures the host-wide renewal job exists. The
//! job is checked before it is installed, and a failure there is reported
//! separately without disabling the certificates again.

use tracing::{info, warn};

use crate::channel::CommandChannel;
use crate::entity::{AppName, Certificate};
use crate::host::Host;

use super::{
    ImportError, Observation, PreconditionViolation, Reconcile, ReconcileError, ensure_unchanged,
    split_import_id,
};

/// Reconciles automatic certificate management per application.
#[derive(Debug)]
pub struct CertificateReconciler<'h, C: CommandChannel> {
    host: &'h Host<C>,
}

impl<'h, C: CommandChannel> CertificateReconciler<'h, C> {
    /// Creates a reconciler over `host`.
    #[must_use]
    pub const fn new(host: &'h Host<C>) -> Self {
        Self { host }
    }

    fn ensure_renewal_job(&self) -> Result<(), ReconcileError> {
        if self.host.renewal_job_installed()? {
            return Ok(());
        }
        self.host.install_renewal_job()?;
        info!("certificate renewal job installed");
        Ok(())
    }
}

impl<C: CommandChannel> Reconcile for CertificateReconciler<'_, C> {
    type State = Certificate;

    fn create(&self, desired: &Certificate) -> Result<Certificate, ReconcileError> {
        if self.host.certificate_active(&desired.app)? {
            return Err(PreconditionViolation::AlreadyExists {
                kind: "certificate",
                entity: format!("for {}", desired.app),
            }
            .into());
        }
        self.host.enable_certificate(&desired.app)?;
        info!(app = %desired.app, "certificates enabled");

        if let Err(err) = self.ensure_renewal_job() {
            warn!(app = %desired.app, "renewal job setup failed after enable");
            return Err(ReconcileError::RenewalJob {
                app: desired.app.to_string(),
                source: Box::new(err),
            });
        }
        Ok(desired.clone())
    }

    fn read(&self, prior: &Certificate) -> Result<Observation<Certificate>, ReconcileError> {
        if self.host.certificate_active(&prior.app)? {
            Ok(Observation::Present(prior.clone()))
        } else {
            info!(app = %prior.app, "certificates no longer active");
            Ok(Observation::Vanished)
        }
    }

    fn update(
        &self,
        prior: &Certificate,
        desired: &Certificate,
    ) -> Result<Certificate, ReconcileError> {
        ensure_unchanged("app_name", &prior.app, &desired.app)?;
        Ok(desired.clone())
    }

    fn delete(&self, prior: &Certificate) -> Result<(), ReconcileError> {
        if !self.host.certificate_active(&prior.app)? {
            warn!(app = %prior.app, "certificates already inactive; nothing to delete");
            return Ok(());
        }
        self.host.disable_certificate(&prior.app)?;
        info!(app = %prior.app, "certificates disabled");
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Certificate, ImportError> {
        let parts = split_import_id(id, &[1], "1")?;
        let app = parts.first().copied().unwrap_or_default();
        AppName::new(app)
            .map(Certificate::new)
            .map_err(|source| ImportError::Invalid {
                id: id.to_owned(),
                source,
            })
    }
}
