//! Shared fixtures for reconciler BDD scenarios.

use dokku_reconcile::test_support::FakeHost;
use dokku_reconcile::{Outcome, ReconcileError, ServiceLink};
use rstest::fixture;

/// Shape of a finished operation, independent of the entity kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OperationResult {
    Reconciled,
    Vanished,
    Deleted,
    Failed { kind: &'static str, message: String },
}

#[derive(Clone, Debug)]
pub struct ReconcileContext {
    pub host: FakeHost,
    pub mutations_before: usize,
    pub result: Option<OperationResult>,
    pub imported_link: Option<ServiceLink>,
}

impl ReconcileContext {
    /// Records the mutation baseline before an operation runs.
    #[must_use]
    pub fn before_operation(self) -> Self {
        Self {
            mutations_before: self.host.mutation_count(),
            ..self
        }
    }

    /// Stores the result of an operation.
    #[must_use]
    pub fn record<S>(self, result: Result<Outcome<S>, ReconcileError>) -> Self {
        let recorded = match result {
            Ok(Outcome::Reconciled(_)) => OperationResult::Reconciled,
            Ok(Outcome::Vanished) => OperationResult::Vanished,
            Ok(Outcome::Deleted) => OperationResult::Deleted,
            Err(err) => OperationResult::Failed {
                kind: err.kind(),
                message: err.to_string(),
            },
        };
        Self {
            result: Some(recorded),
            ..self
        }
    }
}

#[fixture]
pub fn reconcile_context() -> ReconcileContext {
    ReconcileContext {
        host: FakeHost::new(),
        mutations_before: 0,
        result: None,
        imported_link: None,
    }
}
