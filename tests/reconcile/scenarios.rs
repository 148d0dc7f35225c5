//! BDD scenarios for domain, certificate, and service link reconciliation.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ReconcileContext, reconcile_context};

#[scenario(path = "tests/features/reconcile.feature", name = "Bind a new domain")]
fn scenario_bind_domain(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Refuse to bind a domain twice"
)]
fn scenario_bind_domain_twice(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Detect a domain removed out of band"
)]
fn scenario_domain_drift(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(path = "tests/features/reconcile.feature", name = "Move a domain")]
fn scenario_move_domain(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Report a half-finished domain move"
)]
fn scenario_partial_domain_move(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Delete an absent domain"
)]
fn scenario_delete_absent_domain(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Enable certificates and install the renewal job"
)]
fn scenario_enable_certificates(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Report a renewal job failure"
)]
fn scenario_renewal_job_failure(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Disable certificates"
)]
fn scenario_disable_certificates(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Link a service with an alias"
)]
fn scenario_link_with_alias(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Refuse to link a missing service"
)]
fn scenario_link_missing_service(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Change a link alias"
)]
fn scenario_change_alias(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Unlink a service twice"
)]
fn scenario_unlink_twice(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "Import a service link with an alias"
)]
fn scenario_import_link(reconcile_context: ReconcileContext) {
    drop(reconcile_context);
}
