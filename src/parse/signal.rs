//! Boolean facts inferred from exit status and stderr text.

use crate::channel::CommandOutput;
use crate::grammar::{AbsencePatterns, FlagLiterals};

use super::ParseError;

/// Non-zero exit of a presence check whose stderr is not a recognised
/// absence. The host reported it, so callers surface it as a remote failure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteFailure {
    /// Human readable representation of the exit status.
    pub status_text: String,
    /// Verbatim stderr text, trimmed.
    pub stderr: String,
}

/// Classified response of a presence check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RemoteResponse {
    /// The command exited successfully.
    Success(CommandOutput),
    /// The command failed with a recognised "not there" message.
    KnownAbsence,
    /// The command failed for any other reason.
    UnknownFailure {
        /// Human readable representation of the exit status.
        status_text: String,
        /// Verbatim stderr text.
        stderr: String,
    },
}

impl RemoteResponse {
    /// Classifies `output` using the operation's absence patterns.
    #[must_use]
    pub fn classify(output: CommandOutput, absent: &AbsencePatterns) -> Self {
        if output.is_success() {
            return Self::Success(output);
        }
        if absent.matches(&output.stderr) {
            return Self::KnownAbsence;
        }
        Self::UnknownFailure {
            status_text: output.status_text(),
            stderr: output.stderr.trim().to_owned(),
        }
    }
}

/// Decodes a presence check: success is `true`, a recognised absence is
/// `false`, anything else is an error.
///
/// # Errors
///
/// Returns a [`RemoteFailure`] for non-zero exits whose stderr matches none
/// of `absent`.
pub fn decode_signal(
    output: CommandOutput,
    absent: &AbsencePatterns,
) -> Result<bool, RemoteFailure> {
    match RemoteResponse::classify(output, absent) {
        RemoteResponse::Success(_) => Ok(true),
        RemoteResponse::KnownAbsence => Ok(false),
        RemoteResponse::UnknownFailure {
            status_text,
            stderr,
        } => Err(RemoteFailure {
            status_text,
            stderr,
        }),
    }
}

/// Decodes a boolean printed on stdout.
///
/// # Errors
///
/// Returns [`ParseError::UnexpectedValue`] when the trimmed output equals
/// neither literal.
pub fn decode_flag(field: &str, stdout: &str, literals: &FlagLiterals) -> Result<bool, ParseError> {
    let value = stdout.trim();
    if value == literals.enabled {
        Ok(true)
    } else if value == literals.disabled {
        Ok(false)
    } else {
        Err(ParseError::UnexpectedValue {
            field: field.to_owned(),
            value: value.to_owned(),
        })
    }
}
