//! Grammar table describing the host tool's textual output.
//!
//! Report keys, stderr absence patterns, and flag literals are data so that a
//! new release of the host tool that rewords its output needs a grammar file,
//! not a code change. [`Grammar::default`] matches the current host tool.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use ortho_config::toml;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a report value is decoded.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Trimmed value kept as a single string.
    Scalar,
    /// Value split on single spaces into a set of tokens.
    List,
}

/// A report key and the shape of its value.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct FieldSpec {
    /// Key text before the first colon, compared after trimming.
    pub key: String,
    /// Value decoding rule.
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Builds a list-typed field.
    #[must_use]
    pub fn list(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: FieldKind::List,
        }
    }

    /// Builds a scalar field.
    #[must_use]
    pub fn scalar(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: FieldKind::Scalar,
        }
    }
}

/// Stderr substrings that turn a failed presence check into "absent".
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AbsencePatterns(pub Vec<String>);

impl AbsencePatterns {
    /// Returns `true` when `stderr` contains any recognised pattern.
    #[must_use]
    pub fn matches(&self, stderr: &str) -> bool {
        self.0.iter().any(|pattern| stderr.contains(pattern.as_str()))
    }
}

impl<const N: usize> From<[&str; N]> for AbsencePatterns {
    fn from(patterns: [&str; N]) -> Self {
        Self(patterns.iter().map(|p| (*p).to_owned()).collect())
    }
}

/// Literal tokens printed by boolean queries.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct FlagLiterals {
    /// Token meaning enabled.
    pub enabled: String,
    /// Token meaning disabled.
    pub disabled: String,
}

/// Complete grammar table consumed by the fact extractors.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Grammar {
    /// Report key listing the domains bound to an application.
    pub domains_vhosts: FieldSpec,
    /// Stderr patterns of `<service>:exists` meaning the service is missing.
    pub service_missing: AbsencePatterns,
    /// Stderr patterns of `<service>:linked` meaning the link is missing.
    pub link_missing: AbsencePatterns,
    /// Output of the certificate-active query.
    pub letsencrypt_flag: FlagLiterals,
    /// Substring identifying the certificate renewal job in the global cron
    /// listing.
    pub renewal_job_marker: String,
}

impl Default for Grammar {
    fn default() -> Self {
        Self {
            domains_vhosts: FieldSpec::list("Domains app vhosts"),
            service_missing: AbsencePatterns::from(["does not exist"]),
            link_missing: AbsencePatterns::from(["not linked"]),
            letsencrypt_flag: FlagLiterals {
                enabled: String::from("true"),
                disabled: String::from("false"),
            },
            renewal_job_marker: String::from("letsencrypt:auto-renew"),
        }
    }
}

/// Errors raised while loading a grammar table.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum GrammarError {
    /// Raised when the grammar file cannot be read.
    #[error("failed to read grammar {path}: {message}")]
    Io {
        /// Path that could not be read.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
    /// Raised when grammar content does not deserialise.
    #[error("invalid grammar: {0}")]
    Parse(String),
    /// Raised when a grammar entry is blank and would match everything.
    #[error("grammar entry {0} must not be empty")]
    Empty(String),
}

impl Grammar {
    /// Parses a grammar from TOML. Missing entries keep their built-in value.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::Parse`] for malformed TOML and
    /// [`GrammarError::Empty`] for blank keys or patterns.
    pub fn from_toml_str(contents: &str) -> Result<Self, GrammarError> {
        let grammar: Self =
            toml::from_str(contents).map_err(|err| GrammarError::Parse(err.to_string()))?;
        grammar.validate()?;
        Ok(grammar)
    }

    /// Parses a grammar from JSON. Missing entries keep their built-in value.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::Parse`] for malformed JSON and
    /// [`GrammarError::Empty`] for blank keys or patterns.
    pub fn from_json_str(contents: &str) -> Result<Self, GrammarError> {
        let grammar: Self =
            serde_json::from_str(contents).map_err(|err| GrammarError::Parse(err.to_string()))?;
        grammar.validate()?;
        Ok(grammar)
    }

    /// Reads and parses a TOML grammar file.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::Io`] when the file cannot be read, otherwise
    /// any error from [`Grammar::from_toml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self, GrammarError> {
        let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
        let io_error = |message: String| GrammarError::Io {
            path: path.to_path_buf(),
            message,
        };
        let file_name = path
            .file_name()
            .ok_or_else(|| io_error(String::from("grammar path is missing a filename")))?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(|err| io_error(err.to_string()))?;
        let contents = dir
            .read_to_string(file_name)
            .map_err(|err| io_error(err.to_string()))?;
        Self::from_toml_str(&contents)
    }

    /// Rejects blank entries.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::Empty`] naming the first blank entry.
    pub fn validate(&self) -> Result<(), GrammarError> {
        let blank = |value: &str| value.trim().is_empty();
        if blank(&self.domains_vhosts.key) {
            return Err(GrammarError::Empty(String::from("domains_vhosts.key")));
        }
        if self.service_missing.0.iter().any(|p| blank(p)) {
            return Err(GrammarError::Empty(String::from("service_missing")));
        }
        if self.link_missing.0.iter().any(|p| blank(p)) {
            return Err(GrammarError::Empty(String::from("link_missing")));
        }
        if blank(&self.letsencrypt_flag.enabled) || blank(&self.letsencrypt_flag.disabled) {
            return Err(GrammarError::Empty(String::from("letsencrypt_flag")));
        }
        if blank(&self.renewal_job_marker) {
            return Err(GrammarError::Empty(String::from("renewal_job_marker")));
        }
        Ok(())
    }
}
