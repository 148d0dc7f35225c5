//! Remote reconciliation engine for a single Dokku-style PaaS host.
//!
//! The crate turns a text-based, non-transactional command interface reached
//! over SSH into idempotent create/read/update/delete operations for three
//! entity kinds: domain bindings, automatic TLS certificates, and datastore
//! service links. Commands travel through a [`channel::CommandChannel`], their
//! output is decoded by [`parse`] using a data-driven [`grammar::Grammar`],
//! and [`reconcile`] composes the resulting facts and mutations into state
//! machines that re-query the host before every change.

pub mod channel;
pub mod entity;
pub mod grammar;
pub mod host;
pub mod parse;
pub mod reconcile;
pub mod test_support;

pub use channel::{
    ChannelConfig, ChannelConfigLoadError, ChannelError, CommandChannel, CommandOutput,
    CommandRunner, ProcessCommandRunner, SerializedChannel, SshChannel,
};
pub use entity::{
    Alias, AppName, Certificate, Domain, DomainBinding, EntityError, ServiceKind, ServiceLink,
    ServiceName,
};
pub use grammar::{Grammar, GrammarError};
pub use host::{ConnectError, Host, HostError};
pub use parse::ParseError;
pub use reconcile::{
    CertificateReconciler, DomainReconciler, ImportError, Observation, Outcome,
    PreconditionViolation, Reconcile, ReconcileError, Request, ServiceLinkReconciler, apply,
};
