//! Output parser for the host tool's two output shapes.
//!
//! Report blocks (`key: value` lines) are decoded by [`Report`]; presence
//! checks that only speak through exit status and stderr are decoded by
//! [`decode_signal`]. Neither ever substitutes a default for something the
//! host did not say.

use thiserror::Error;

mod report;
mod signal;

pub use report::{FieldValue, Report};
pub use signal::{RemoteFailure, RemoteResponse, decode_flag, decode_signal};

/// Errors raised when remote output does not match the expected grammar.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ParseError {
    /// A requested report key never appeared in the output.
    #[error("report key {key:?} missing from output")]
    MissingKey {
        /// Key that was requested.
        key: String,
    },
    /// A value did not match any accepted literal.
    #[error("unexpected value for {field}: {value:?}")]
    UnexpectedValue {
        /// Field or query that produced the value.
        field: String,
        /// Verbatim value that was rejected.
        value: String,
    },
}
