//! Service link state machine for the host's datastore plugins.

use tracing::{info, warn};

use crate::channel::CommandChannel;
use crate::entity::{Alias, AppName, ServiceKind, ServiceLink, ServiceName};
use crate::host::Host;

use super::{
    ImportError, Observation, PreconditionViolation, Reconcile, ReconcileError, ensure_unchanged,
    split_import_id,
};

/// Reconciles links between one plugin's services and applications.
#[derive(Debug)]
pub struct ServiceLinkReconciler<'h, C: CommandChannel> {
    host: &'h Host<C>,
    kind: ServiceKind,
}

impl<'h, C: CommandChannel> ServiceLinkReconciler<'h, C> {
    /// Creates a reconciler for services of plugin `kind`.
    #[must_use]
    pub const fn new(host: &'h Host<C>, kind: ServiceKind) -> Self {
        Self { host, kind }
    }

    /// Plugin handled by this reconciler.
    #[must_use]
    pub const fn kind(&self) -> ServiceKind {
        self.kind
    }

    fn require_service(&self, link: &ServiceLink) -> Result<(), ReconcileError> {
        if self.host.service_exists(link.kind, &link.service)? {
            return Ok(());
        }
        Err(PreconditionViolation::MissingDependency {
            field: "service_name",
            value: link.service.to_string(),
        }
        .into())
    }

    /// Presence of the link, `false` when the service itself is gone.
    fn linked(&self, link: &ServiceLink) -> Result<bool, ReconcileError> {
        if !self.host.service_exists(link.kind, &link.service)? {
            return Ok(false);
        }
        Ok(self.host.service_linked(link.kind, &link.service, &link.app)?)
    }
}

impl<C: CommandChannel> Reconcile for ServiceLinkReconciler<'_, C> {
    type State = ServiceLink;

    fn create(&self, desired: &ServiceLink) -> Result<ServiceLink, ReconcileError> {
        self.require_service(desired)?;
        if self
            .host
            .service_linked(desired.kind, &desired.service, &desired.app)?
        {
            return Err(PreconditionViolation::AlreadyExists {
                kind: "service link",
                entity: format!("{} {} to {}", desired.kind, desired.service, desired.app),
            }
            .into());
        }
        self.host.link_service(
            desired.kind,
            &desired.service,
            &desired.app,
            desired.alias.as_ref(),
        )?;
        info!(kind = %desired.kind, service = %desired.service, app = %desired.app, "service linked");
        Ok(desired.clone())
    }

    fn read(&self, prior: &ServiceLink) -> Result<Observation<ServiceLink>, ReconcileError> {
        self.require_service(prior)?;
        if self
            .host
            .service_linked(prior.kind, &prior.service, &prior.app)?
        {
            Ok(Observation::Present(prior.clone()))
        } else {
            info!(kind = %prior.kind, service = %prior.service, app = %prior.app, "service link vanished");
            Ok(Observation::Vanished)
        }
    }

    fn update(
        &self,
        prior: &ServiceLink,
        desired: &ServiceLink,
    ) -> Result<ServiceLink, ReconcileError> {
        ensure_unchanged("app_name", &prior.app, &desired.app)?;
        ensure_unchanged("service_kind", &prior.kind, &desired.kind)?;
        ensure_unchanged("service_name", &prior.service, &desired.service)?;
        if prior.alias == desired.alias {
            return Ok(desired.clone());
        }

        if self.linked(prior)? {
            self.host
                .unlink_service(prior.kind, &prior.service, &prior.app)?;
            info!(kind = %prior.kind, service = %prior.service, app = %prior.app, "service unlinked for alias change");
            if let Err(err) = self.host.link_service(
                desired.kind,
                &desired.service,
                &desired.app,
                desired.alias.as_ref(),
            ) {
                warn!(kind = %desired.kind, service = %desired.service, app = %desired.app, "alias change left link removed");
                return Err(ReconcileError::PartialMove {
                    completed: format!(
                        "unlinking {} {} from {}",
                        prior.kind, prior.service, prior.app
                    ),
                    source: Box::new(err.into()),
                });
            }
        } else {
            self.create(desired)?;
        }

        info!(kind = %desired.kind, service = %desired.service, app = %desired.app, "service link alias changed");
        Ok(desired.clone())
    }

    fn delete(&self, prior: &ServiceLink) -> Result<(), ReconcileError> {
        if !self.linked(prior)? {
            warn!(kind = %prior.kind, service = %prior.service, app = %prior.app, "service link already absent; nothing to delete");
            return Ok(());
        }
        self.host
            .unlink_service(prior.kind, &prior.service, &prior.app)?;
        info!(kind = %prior.kind, service = %prior.service, app = %prior.app, "service unlinked");
        Ok(())
    }

    fn import(&self, id: &str) -> Result<ServiceLink, ImportError> {
        let parts = split_import_id(id, &[2, 3], "2 or 3")?;
        let invalid = |source| ImportError::Invalid {
            id: id.to_owned(),
            source,
        };
        let (app, service, alias) = match parts.as_slice() {
            [app, service] => (*app, *service, None),
            [app, service, alias] => (*app, *service, Some(*alias)),
            _ => {
                return Err(ImportError::FieldCount {
                    id: id.to_owned(),
                    expected: "2 or 3",
                    found: parts.len(),
                });
            }
        };
        Ok(ServiceLink::new(
            AppName::new(app).map_err(invalid)?,
            self.kind,
            ServiceName::new(service).map_err(invalid)?,
            alias.map(Alias::new).transpose().map_err(invalid)?,
        ))
    }
}
