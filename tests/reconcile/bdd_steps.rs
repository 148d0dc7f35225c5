//! BDD step definitions for reconciling entities against `FakeHost`.

use dokku_reconcile::{
    Alias, AppName, Certificate, CertificateReconciler, Domain, DomainBinding, DomainReconciler,
    EntityError, Host, Request, ServiceKind, ServiceLink, ServiceLinkReconciler, ServiceName,
    apply,
};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{OperationResult, ReconcileContext};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn binding(app: &str, domain: &str) -> Result<DomainBinding, StepError> {
    Ok(DomainBinding::new(AppName::new(app)?, Domain::new(domain)?))
}

fn service_link(
    kind: &str,
    service: &str,
    app: &str,
    alias: Option<&str>,
) -> Result<ServiceLink, StepError> {
    Ok(ServiceLink::new(
        AppName::new(app)?,
        kind.parse()?,
        ServiceName::new(service)?,
        alias.map(Alias::new).transpose()?,
    ))
}

fn expect(condition: bool, message: impl Into<String>) -> Result<(), StepError> {
    if condition {
        Ok(())
    } else {
        Err(StepError::Assertion(message.into()))
    }
}

#[given("a host with app \"{app}\"")]
fn host_with_app(reconcile_context: ReconcileContext, app: String) -> ReconcileContext {
    ReconcileContext {
        host: reconcile_context.host.clone().with_app(&app),
        ..reconcile_context
    }
}

#[given("domain \"{domain}\" is bound to \"{app}\"")]
fn domain_bound(reconcile_context: ReconcileContext, domain: String, app: String) -> ReconcileContext {
    ReconcileContext {
        host: reconcile_context.host.clone().with_domain(&app, &domain),
        ..reconcile_context
    }
}

#[given("certificates are active for \"{app}\"")]
fn certificates_active(reconcile_context: ReconcileContext, app: String) -> ReconcileContext {
    ReconcileContext {
        host: reconcile_context.host.clone().with_certificate(&app),
        ..reconcile_context
    }
}

#[given("a \"{kind}\" service named \"{service}\"")]
fn service_exists(reconcile_context: ReconcileContext, kind: String, service: String) -> ReconcileContext {
    ReconcileContext {
        host: reconcile_context.host.clone().with_service(&kind, &service),
        ..reconcile_context
    }
}

#[given("\"{kind}\" service \"{service}\" is already linked to \"{app}\" under alias \"{alias}\"")]
fn service_already_linked(
    reconcile_context: ReconcileContext,
    kind: String,
    service: String,
    app: String,
    alias: String,
) -> ReconcileContext {
    ReconcileContext {
        host: reconcile_context
            .host
            .clone()
            .with_link(&kind, &service, &app, Some(&alias)),
        ..reconcile_context
    }
}

#[given("the next \"{prefix}\" command fails with \"{stderr}\"")]
fn next_command_fails(reconcile_context: ReconcileContext, prefix: String, stderr: String) -> ReconcileContext {
    reconcile_context
        .host
        .fail_next(&prefix, &format!(" !     {stderr}\n"));
    reconcile_context
}

#[when("I create domain \"{domain}\" on \"{app}\"")]
fn create_domain(
    reconcile_context: ReconcileContext,
    domain: String,
    app: String,
) -> Result<ReconcileContext, StepError> {
    let context = reconcile_context.before_operation();
    let host = Host::new(context.host.clone());
    let request = Request::Create {
        desired: binding(&app, &domain)?,
    };
    let result = apply(&DomainReconciler::new(&host), request);
    Ok(context.record(result))
}

#[when("I read domain \"{domain}\" on \"{app}\"")]
fn read_domain(
    reconcile_context: ReconcileContext,
    domain: String,
    app: String,
) -> Result<ReconcileContext, StepError> {
    let context = reconcile_context.before_operation();
    let host = Host::new(context.host.clone());
    let request = Request::Read {
        prior: binding(&app, &domain)?,
    };
    let result = apply(&DomainReconciler::new(&host), request);
    Ok(context.record(result))
}

#[when("I move domain \"{from}\" to \"{to}\" on \"{app}\"")]
fn move_domain(
    reconcile_context: ReconcileContext,
    from: String,
    to: String,
    app: String,
) -> Result<ReconcileContext, StepError> {
    let context = reconcile_context.before_operation();
    let host = Host::new(context.host.clone());
    let request = Request::Update {
        prior: binding(&app, &from)?,
        desired: binding(&app, &to)?,
    };
    let result = apply(&DomainReconciler::new(&host), request);
    Ok(context.record(result))
}

#[when("I delete domain \"{domain}\" on \"{app}\"")]
fn delete_domain(
    reconcile_context: ReconcileContext,
    domain: String,
    app: String,
) -> Result<ReconcileContext, StepError> {
    let context = reconcile_context.before_operation();
    let host = Host::new(context.host.clone());
    let request = Request::Delete {
        prior: binding(&app, &domain)?,
    };
    let result = apply(&DomainReconciler::new(&host), request);
    Ok(context.record(result))
}

#[when("I create a certificate for \"{app}\"")]
fn create_certificate(
    reconcile_context: ReconcileContext,
    app: String,
) -> Result<ReconcileContext, StepError> {
    let context = reconcile_context.before_operation();
    let host = Host::new(context.host.clone());
    let request = Request::Create {
        desired: Certificate::new(AppName::new(app)?),
    };
    let result = apply(&CertificateReconciler::new(&host), request);
    Ok(context.record(result))
}

#[when("I delete the certificate for \"{app}\"")]
fn delete_certificate(
    reconcile_context: ReconcileContext,
    app: String,
) -> Result<ReconcileContext, StepError> {
    let context = reconcile_context.before_operation();
    let host = Host::new(context.host.clone());
    let request = Request::Delete {
        prior: Certificate::new(AppName::new(app)?),
    };
    let result = apply(&CertificateReconciler::new(&host), request);
    Ok(context.record(result))
}

fn run_link_request(
    context: ReconcileContext,
    kind: ServiceKind,
    request: Request<ServiceLink>,
) -> ReconcileContext {
    let host = Host::new(context.host.clone());
    let result = apply(&ServiceLinkReconciler::new(&host, kind), request);
    context.record(result)
}

#[when("I link \"{kind}\" service \"{service}\" to \"{app}\" under alias \"{alias}\"")]
fn link_with_alias(
    reconcile_context: ReconcileContext,
    kind: String,
    service: String,
    app: String,
    alias: String,
) -> Result<ReconcileContext, StepError> {
    let desired = service_link(&kind, &service, &app, Some(&alias))?;
    let service_kind = desired.kind;
    Ok(run_link_request(
        reconcile_context.before_operation(),
        service_kind,
        Request::Create { desired },
    ))
}

#[when("I link \"{kind}\" service \"{service}\" to \"{app}\" without an alias")]
fn link_without_alias(
    reconcile_context: ReconcileContext,
    kind: String,
    service: String,
    app: String,
) -> Result<ReconcileContext, StepError> {
    let desired = service_link(&kind, &service, &app, None)?;
    let service_kind = desired.kind;
    Ok(run_link_request(
        reconcile_context.before_operation(),
        service_kind,
        Request::Create { desired },
    ))
}

#[when("I change the alias of \"{kind}\" service \"{service}\" on \"{app}\" from \"{old}\" to \"{new}\"")]
fn change_alias(
    reconcile_context: ReconcileContext,
    kind: String,
    service: String,
    app: String,
    old: String,
    new: String,
) -> Result<ReconcileContext, StepError> {
    let prior = service_link(&kind, &service, &app, Some(&old))?;
    let desired = service_link(&kind, &service, &app, Some(&new))?;
    let service_kind = prior.kind;
    Ok(run_link_request(
        reconcile_context.before_operation(),
        service_kind,
        Request::Update { prior, desired },
    ))
}

#[when("I unlink \"{kind}\" service \"{service}\" from \"{app}\"")]
fn unlink(
    reconcile_context: ReconcileContext,
    kind: String,
    service: String,
    app: String,
) -> Result<ReconcileContext, StepError> {
    let prior = service_link(&kind, &service, &app, None)?;
    let service_kind = prior.kind;
    Ok(run_link_request(
        reconcile_context.before_operation(),
        service_kind,
        Request::Delete { prior },
    ))
}

#[when("I import \"{kind}\" link \"{id}\"")]
fn import_link(
    reconcile_context: ReconcileContext,
    kind: String,
    id: String,
) -> Result<ReconcileContext, StepError> {
    use dokku_reconcile::Reconcile;

    let service_kind: ServiceKind = kind.parse()?;
    let context = reconcile_context.before_operation();
    let host = Host::new(context.host.clone());
    let reconciler = ServiceLinkReconciler::new(&host, service_kind);
    let imported = reconciler.import(&id).ok();
    let result = apply(&reconciler, Request::Import { id });
    Ok(ReconcileContext {
        imported_link: imported,
        ..context.record(result)
    })
}

#[then("the operation succeeds")]
fn operation_succeeds(reconcile_context: &ReconcileContext) -> Result<(), StepError> {
    match reconcile_context.result {
        Some(OperationResult::Reconciled) => Ok(()),
        ref other => Err(StepError::Assertion(format!(
            "expected reconciled state, got {other:?}"
        ))),
    }
}

#[then("the entity is reported vanished")]
fn entity_vanished(reconcile_context: &ReconcileContext) -> Result<(), StepError> {
    expect(
        reconcile_context.result == Some(OperationResult::Vanished),
        format!("expected vanished, got {:?}", reconcile_context.result),
    )
}

#[then("the entity is reported deleted")]
fn entity_deleted(reconcile_context: &ReconcileContext) -> Result<(), StepError> {
    expect(
        reconcile_context.result == Some(OperationResult::Deleted),
        format!("expected deleted, got {:?}", reconcile_context.result),
    )
}

#[then("the operation fails with kind \"{kind}\"")]
fn operation_fails(reconcile_context: &ReconcileContext, kind: String) -> Result<(), StepError> {
    let Some(OperationResult::Failed {
        kind: actual,
        ref message,
    }) = reconcile_context.result
    else {
        return Err(StepError::Assertion(format!(
            "expected failure, got {:?}",
            reconcile_context.result
        )));
    };
    expect(
        actual == kind,
        format!("expected {kind} failure, got {actual}: {message}"),
    )
}

#[then("no mutation was issued")]
fn no_mutation(reconcile_context: &ReconcileContext) -> Result<(), StepError> {
    let issued = reconcile_context.host.mutation_count() - reconcile_context.mutations_before;
    expect(issued == 0, format!("expected no mutation, {issued} issued"))
}

#[then("\"{app}\" serves domain \"{domain}\"")]
fn serves_domain(reconcile_context: &ReconcileContext, app: String, domain: String) -> Result<(), StepError> {
    expect(
        reconcile_context.host.domains(&app).contains(&domain),
        format!("{app} should serve {domain}"),
    )
}

#[then("\"{app}\" does not serve domain \"{domain}\"")]
fn does_not_serve_domain(
    reconcile_context: &ReconcileContext,
    app: String,
    domain: String,
) -> Result<(), StepError> {
    expect(
        !reconcile_context.host.domains(&app).contains(&domain),
        format!("{app} should not serve {domain}"),
    )
}

#[then("certificates end up active for \"{app}\"")]
fn certificates_end_active(reconcile_context: &ReconcileContext, app: String) -> Result<(), StepError> {
    expect(
        reconcile_context.host.certificate_active(&app),
        format!("certificates should be active for {app}"),
    )
}

#[then("certificates end up inactive for \"{app}\"")]
fn certificates_end_inactive(reconcile_context: &ReconcileContext, app: String) -> Result<(), StepError> {
    expect(
        !reconcile_context.host.certificate_active(&app),
        format!("certificates should be inactive for {app}"),
    )
}

#[then("the renewal job ends up installed")]
fn renewal_job_installed(reconcile_context: &ReconcileContext) -> Result<(), StepError> {
    expect(
        reconcile_context.host.renewal_job_installed(),
        "renewal job should be installed",
    )
}

#[then("\"{kind}\" service \"{service}\" is linked to \"{app}\" with alias \"{alias}\"")]
fn linked_with_alias(
    reconcile_context: &ReconcileContext,
    kind: String,
    service: String,
    app: String,
    alias: String,
) -> Result<(), StepError> {
    let actual = reconcile_context.host.link_alias(&kind, &service, &app);
    expect(
        actual == Some(Some(alias.clone())),
        format!("expected {service} linked to {app} as {alias}, got {actual:?}"),
    )
}

#[then("\"{kind}\" service \"{service}\" is not linked to \"{app}\"")]
fn not_linked(
    reconcile_context: &ReconcileContext,
    kind: String,
    service: String,
    app: String,
) -> Result<(), StepError> {
    let actual = reconcile_context.host.link_alias(&kind, &service, &app);
    expect(
        actual.is_none(),
        format!("expected {service} unlinked from {app}, got {actual:?}"),
    )
}

#[then("the imported link is \"{kind}\" service \"{service}\" on \"{app}\" with alias \"{alias}\"")]
fn imported_link_matches(
    reconcile_context: &ReconcileContext,
    kind: String,
    service: String,
    app: String,
    alias: String,
) -> Result<(), StepError> {
    let expected = service_link(&kind, &service, &app, Some(&alias))?;
    expect(
        reconcile_context.imported_link.as_ref() == Some(&expected),
        format!(
            "expected {expected:?}, got {:?}",
            reconcile_context.imported_link
        ),
    )
}
