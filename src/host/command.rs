//! Command line assembly in the host tool's `<namespace>:<verb> <args...>`
//! syntax.

use std::fmt;

/// A host tool command built from caller-supplied values.
///
/// Values are appended verbatim; callers pass only validated names.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandLine {
    namespace: String,
    verb: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Starts a command `<namespace>:<verb>`.
    #[must_use]
    pub fn new(namespace: impl Into<String>, verb: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            verb: verb.into(),
            args: Vec::new(),
        }
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl AsRef<str>) -> Self {
        self.args.push(value.as_ref().to_owned());
        self
    }

    /// Appends `--name value` as two tokens when `value` is present; nothing
    /// otherwise.
    #[must_use]
    pub fn flag(mut self, name: &str, value: Option<impl AsRef<str>>) -> Self {
        if let Some(v) = value {
            self.args.push(format!("--{name}"));
            self.args.push(v.as_ref().to_owned());
        }
        self
    }

    /// Appends a bare `--name` switch.
    #[must_use]
    pub fn switch(mut self, name: &str) -> Self {
        self.args.push(format!("--{name}"));
        self
    }

    /// Renders the command text handed to the channel.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.verb)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
