//! Domain binding state machine.

use tracing::{info, warn};

use crate::channel::CommandChannel;
use crate::entity::{AppName, Domain, DomainBinding};
use crate::host::Host;

use super::{
    ImportError, Observation, PreconditionViolation, Reconcile, ReconcileError, ensure_unchanged,
    split_import_id,
};

/// Reconciles domains bound to applications.
#[derive(Debug)]
pub struct DomainReconciler<'h, C: CommandChannel> {
    host: &'h Host<C>,
}

impl<'h, C: CommandChannel> DomainReconciler<'h, C> {
    /// Creates a reconciler over `host`.
    #[must_use]
    pub const fn new(host: &'h Host<C>) -> Self {
        Self { host }
    }
}

impl<C: CommandChannel> Reconcile for DomainReconciler<'_, C> {
    type State = DomainBinding;

    fn create(&self, desired: &DomainBinding) -> Result<DomainBinding, ReconcileError> {
        if self.host.domain_bound(&desired.app, &desired.domain)? {
            return Err(already_exists(desired).into());
        }
        self.host.add_domain(&desired.app, &desired.domain)?;
        info!(app = %desired.app, domain = %desired.domain, "domain bound");
        Ok(desired.clone())
    }

    fn read(&self, prior: &DomainBinding) -> Result<Observation<DomainBinding>, ReconcileError> {
        if self.host.domain_bound(&prior.app, &prior.domain)? {
            Ok(Observation::Present(prior.clone()))
        } else {
            info!(app = %prior.app, domain = %prior.domain, "domain binding vanished");
            Ok(Observation::Vanished)
        }
    }

    fn update(
        &self,
        prior: &DomainBinding,
        desired: &DomainBinding,
    ) -> Result<DomainBinding, ReconcileError> {
        ensure_unchanged("app_name", &prior.app, &desired.app)?;
        if prior.domain == desired.domain {
            return Ok(desired.clone());
        }

        let bound = self.host.domains(&prior.app)?;
        if bound.contains(desired.domain.as_str()) {
            return Err(already_exists(desired).into());
        }

        if bound.contains(prior.domain.as_str()) {
            self.host.remove_domain(&prior.app, &prior.domain)?;
            info!(app = %prior.app, domain = %prior.domain, "old domain removed");
            if let Err(err) = self.host.add_domain(&desired.app, &desired.domain) {
                warn!(app = %desired.app, domain = %desired.domain, "domain move left half done");
                return Err(ReconcileError::PartialMove {
                    completed: format!("removing domain {} from {}", prior.domain, prior.app),
                    source: Box::new(err.into()),
                });
            }
        } else {
            self.host.add_domain(&desired.app, &desired.domain)?;
        }

        info!(app = %desired.app, domain = %desired.domain, "domain moved");
        Ok(desired.clone())
    }

    fn delete(&self, prior: &DomainBinding) -> Result<(), ReconcileError> {
        if !self.host.domain_bound(&prior.app, &prior.domain)? {
            warn!(app = %prior.app, domain = %prior.domain, "domain already absent; nothing to delete");
            return Ok(());
        }
        self.host.remove_domain(&prior.app, &prior.domain)?;
        info!(app = %prior.app, domain = %prior.domain, "domain unbound");
        Ok(())
    }

    fn import(&self, id: &str) -> Result<DomainBinding, ImportError> {
        let parts = split_import_id(id, &[2], "2")?;
        let invalid = |source| ImportError::Invalid {
            id: id.to_owned(),
            source,
        };
        match parts.as_slice() {
            [app, domain] => Ok(DomainBinding::new(
                AppName::new(*app).map_err(invalid)?,
                Domain::new(*domain).map_err(invalid)?,
            )),
            _ => Err(ImportError::FieldCount {
                id: id.to_owned(),
                expected: "2",
                found: parts.len(),
            }),
        }
    }
}

fn already_exists(binding: &DomainBinding) -> PreconditionViolation {
    PreconditionViolation::AlreadyExists {
        kind: "domain",
        entity: format!("{} on {}", binding.domain, binding.app),
    }
}
