//! Failure taxonomy for reconciliation operations.

use thiserror::Error;

use crate::channel::ChannelError;
use crate::entity::EntityError;
use crate::host::HostError;
use crate::parse::ParseError;

/// A reconciler's own idempotency or identity check failed.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PreconditionViolation {
    /// The entity is already present, so creating it would duplicate it.
    #[error("{kind} {entity} already exists")]
    AlreadyExists {
        /// Entity kind, for example `domain`.
        kind: &'static str,
        /// Human readable entity reference.
        entity: String,
    },
    /// An update tried to change a field that requires replacement.
    #[error("cannot change {field} from {prior:?} to {desired:?}; replace the resource instead")]
    IdentityChanged {
        /// Offending attribute.
        field: &'static str,
        /// Value in the prior state.
        prior: String,
        /// Value requested.
        desired: String,
    },
    /// Something the entity depends on is missing on the host.
    #[error("{field} {value:?} not found on host")]
    MissingDependency {
        /// Attribute naming the dependency.
        field: &'static str,
        /// Value that was looked up.
        value: String,
    },
}

/// Errors raised when an import identifier cannot be split into a reference.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ImportError {
    /// The identifier had the wrong number of space-separated fields.
    #[error("import id {id:?} must have {expected} space-separated fields, found {found}")]
    FieldCount {
        /// Verbatim identifier.
        id: String,
        /// Accepted field counts, for example `2 or 3`.
        expected: &'static str,
        /// Number of fields found.
        found: usize,
    },
    /// A field broke the host's naming rules.
    #[error("invalid import id {id:?}: {source}")]
    Invalid {
        /// Verbatim identifier.
        id: String,
        /// Underlying validation failure.
        #[source]
        source: EntityError,
    },
}

/// Failure of one reconciliation operation. No partial state accompanies it.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ReconcileError {
    /// The command channel could not complete a round trip.
    #[error("transport failure: {0}")]
    Transport(ChannelError),
    /// Remote output did not match the expected grammar.
    #[error("parse failure in `{command}`: {source}")]
    Parse {
        /// Command whose output was rejected.
        command: String,
        /// Underlying parse failure.
        #[source]
        source: ParseError,
    },
    /// The reconciler refused to mutate.
    #[error("precondition violated: {0}")]
    Precondition(#[from] PreconditionViolation),
    /// The host tool reported a failure.
    #[error("remote failure in `{command}` (status {status_text}): {stderr}")]
    Remote {
        /// Command that failed.
        command: String,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Verbatim stderr text.
        stderr: String,
    },
    /// The first step of a two-step move succeeded and the second failed.
    /// The first step is not rolled back.
    #[error("{completed} succeeded but the follow-up failed: {source}")]
    PartialMove {
        /// Description of the step that took effect.
        completed: String,
        /// Failure of the second step.
        #[source]
        source: Box<ReconcileError>,
    },
    /// Certificates were enabled but the renewal job could not be ensured.
    /// The enable is not rolled back.
    #[error("certificates enabled for {app} but renewal job setup failed: {source}")]
    RenewalJob {
        /// Application whose certificates were enabled.
        app: String,
        /// Underlying failure.
        #[source]
        source: Box<ReconcileError>,
    },
    /// The import identifier was malformed.
    #[error(transparent)]
    Import(#[from] ImportError),
}

impl ReconcileError {
    /// Short classification of the failure.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Parse { .. } => "parse",
            Self::Precondition(_) => "precondition",
            Self::Remote { .. } => "remote",
            Self::PartialMove { .. } => "partial-move",
            Self::RenewalJob { .. } => "renewal-job",
            Self::Import(_) => "import",
        }
    }
}

impl From<HostError> for ReconcileError {
    fn from(value: HostError) -> Self {
        match value {
            HostError::Channel(err) => Self::Transport(err),
            HostError::Parse { command, source } => Self::Parse { command, source },
            HostError::Remote {
                command,
                status_text,
                stderr,
            } => Self::Remote {
                command,
                status_text,
                stderr,
            },
        }
    }
}
