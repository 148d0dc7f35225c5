//! Create/read/update/delete state machines for each managed entity kind.
//!
//! Every operation re-queries the host before deciding, and a mutation is
//! only issued once the matching fact confirms the precondition: absence
//! before create, presence before delete. Updates that change identity fields
//! are refused before any command is sent.
//!
//! Updates of changeable fields are a best-effort move: the old value is
//! removed, then the new one added. When the second step fails the first is
//! not rolled back and [`ReconcileError::PartialMove`] reports what already
//! happened.

use std::fmt::{self, Display};

use tracing::info;

mod certificate;
mod domain;
mod error;
mod link;

pub use certificate::CertificateReconciler;
pub use domain::DomainReconciler;
pub use error::{ImportError, PreconditionViolation, ReconcileError};
pub use link::ServiceLinkReconciler;

/// Result of reading an entity back from the host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Observation<S> {
    /// The entity is present; the state is confirmed.
    Present(S),
    /// The entity no longer exists; callers should drop their stored state.
    Vanished,
}

/// One state machine per entity kind.
pub trait Reconcile {
    /// Reconciled state tuple persisted by the caller.
    type State: Clone + Eq + fmt::Debug;

    /// Creates the entity when absent.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionViolation::AlreadyExists`] (wrapped) when the
    /// entity is present, or any query or mutation failure.
    fn create(&self, desired: &Self::State) -> Result<Self::State, ReconcileError>;

    /// Re-queries the host for the entity described by `prior`.
    ///
    /// # Errors
    ///
    /// Returns any query failure. Absence is not an error.
    fn read(&self, prior: &Self::State) -> Result<Observation<Self::State>, ReconcileError>;

    /// Moves the entity from `prior` to `desired`.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionViolation::IdentityChanged`] (wrapped) before any
    /// command when an identity field differs, and
    /// [`ReconcileError::PartialMove`] when only the first step took effect.
    fn update(
        &self,
        prior: &Self::State,
        desired: &Self::State,
    ) -> Result<Self::State, ReconcileError>;

    /// Removes the entity. Deleting an absent entity succeeds.
    ///
    /// # Errors
    ///
    /// Returns any query or mutation failure.
    fn delete(&self, prior: &Self::State) -> Result<(), ReconcileError>;

    /// Rebuilds a state from an opaque identifier without querying the host.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] when the identifier is malformed.
    fn import(&self, id: &str) -> Result<Self::State, ImportError>;
}

/// Operation selector sent by the declarative front-end.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request<S> {
    /// Create `desired`.
    Create {
        /// Requested state.
        desired: S,
    },
    /// Refresh `prior`.
    Read {
        /// Previously reconciled state.
        prior: S,
    },
    /// Move from `prior` to `desired`.
    Update {
        /// Previously reconciled state.
        prior: S,
        /// Requested state.
        desired: S,
    },
    /// Delete `prior`.
    Delete {
        /// Previously reconciled state.
        prior: S,
    },
    /// Rebuild a state from an identifier.
    Import {
        /// Opaque identifier.
        id: String,
    },
}

impl<S> Request<S> {
    /// Operation name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Read { .. } => "read",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::Import { .. } => "import",
        }
    }
}

/// Result returned to the declarative front-end.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome<S> {
    /// The state to persist as current truth.
    Reconciled(S),
    /// The entity no longer exists; drop stored state.
    Vanished,
    /// The entity was deleted or was already absent.
    Deleted,
}

/// Dispatches `request` to `reconciler`.
///
/// # Errors
///
/// Returns whatever the selected operation returns.
pub fn apply<R: Reconcile>(
    reconciler: &R,
    request: Request<R::State>,
) -> Result<Outcome<R::State>, ReconcileError> {
    let operation = request.name();
    let outcome = match request {
        Request::Create { desired } => Outcome::Reconciled(reconciler.create(&desired)?),
        Request::Read { prior } => match reconciler.read(&prior)? {
            Observation::Present(state) => Outcome::Reconciled(state),
            Observation::Vanished => Outcome::Vanished,
        },
        Request::Update { prior, desired } => {
            Outcome::Reconciled(reconciler.update(&prior, &desired)?)
        }
        Request::Delete { prior } => {
            reconciler.delete(&prior)?;
            Outcome::Deleted
        }
        Request::Import { id } => Outcome::Reconciled(reconciler.import(&id)?),
    };
    info!(operation, "reconciliation finished");
    Ok(outcome)
}

/// Refuses a change to an identity field.
fn ensure_unchanged<T>(field: &'static str, prior: &T, desired: &T) -> Result<(), ReconcileError>
where
    T: Display + PartialEq,
{
    if prior == desired {
        return Ok(());
    }
    Err(PreconditionViolation::IdentityChanged {
        field,
        prior: prior.to_string(),
        desired: desired.to_string(),
    }
    .into())
}

/// Splits an import identifier on single spaces, checking the field count.
fn split_import_id<'a>(
    id: &'a str,
    accepted: &[usize],
    expected: &'static str,
) -> Result<Vec<&'a str>, ImportError> {
    let parts: Vec<&str> = id.split(' ').collect();
    if accepted.contains(&parts.len()) {
        Ok(parts)
    } else {
        Err(ImportError::FieldCount {
            id: id.to_owned(),
            expected,
            found: parts.len(),
        })
    }
}
