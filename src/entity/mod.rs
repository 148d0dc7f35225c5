//! Entity references and reconciled state tuples.
//!
//! Names are validated on construction so that only well-formed values reach
//! command assembly; the command channel does not escape anything.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised when a value breaks the host's naming rules.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EntityError {
    /// Raised when a value is empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Attribute that was empty.
        field: &'static str,
    },
    /// Raised when a value contains characters the host rejects.
    #[error("invalid {field} {value:?}: {rule}")]
    Invalid {
        /// Attribute that failed validation.
        field: &'static str,
        /// Verbatim rejected value.
        value: String,
        /// Description of the naming rule.
        rule: &'static str,
    },
    /// Raised for a service plugin this engine does not manage.
    #[error("unsupported service kind {0:?}")]
    UnknownServiceKind(String),
}

const NAME_RULE: &str = "lowercase letters, digits and hyphens, starting with a letter";

fn validate_name(field: &'static str, value: &str) -> Result<(), EntityError> {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(EntityError::Empty { field });
    };
    let valid = first.is_ascii_lowercase()
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(EntityError::Invalid {
            field,
            value: value.to_owned(),
            rule: NAME_RULE,
        })
    }
}

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident, $validate:expr) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name(String);

        impl $name {
            /// Validates and wraps `value`.
            ///
            /// # Errors
            ///
            /// Returns [`EntityError`] when the value breaks the naming rule.
            pub fn new(value: impl Into<String>) -> Result<Self, EntityError> {
                let value = value.into();
                let check: fn(&str) -> Result<(), EntityError> = $validate;
                check(&value)?;
                Ok(Self(value))
            }

            /// Borrows the inner string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = EntityError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_newtype!(
    /// Application name on the managed host.
    AppName,
    |value| validate_name("app_name", value)
);

string_newtype!(
    /// Name of a datastore service instance.
    ServiceName,
    |value| validate_name("service_name", value)
);

string_newtype!(
    /// Domain bound to an application.
    Domain,
    |value| {
        if value.is_empty() {
            return Err(EntityError::Empty { field: "domain" });
        }
        if value.chars().any(|c| c.is_whitespace() || c == ':') {
            return Err(EntityError::Invalid {
                field: "domain",
                value: value.to_owned(),
                rule: "no whitespace or colons",
            });
        }
        Ok(())
    }
);

string_newtype!(
    /// Environment variable prefix under which a linked service exposes its
    /// connection URL.
    Alias,
    |value| {
        if value.is_empty() {
            return Err(EntityError::Empty { field: "alias" });
        }
        if value.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
            Ok(())
        } else {
            Err(EntityError::Invalid {
                field: "alias",
                value: value.to_owned(),
                rule: "uppercase letters and underscores",
            })
        }
    }
);

/// Datastore plugins whose link commands share one syntax.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ServiceKind {
    /// `mariadb` plugin.
    MariaDb,
    /// `nats` plugin.
    Nats,
    /// `postgres` plugin.
    Postgres,
    /// `mysql` plugin.
    MySql,
    /// `redis` plugin.
    Redis,
    /// `mongo` plugin.
    Mongo,
    /// `rabbitmq` plugin.
    RabbitMq,
}

impl ServiceKind {
    /// Command namespace of the plugin.
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::MariaDb => "mariadb",
            Self::Nats => "nats",
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Redis => "redis",
            Self::Mongo => "mongo",
            Self::RabbitMq => "rabbitmq",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

impl FromStr for ServiceKind {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mariadb" => Ok(Self::MariaDb),
            "nats" => Ok(Self::Nats),
            "postgres" => Ok(Self::Postgres),
            "mysql" => Ok(Self::MySql),
            "redis" => Ok(Self::Redis),
            "mongo" => Ok(Self::Mongo),
            "rabbitmq" => Ok(Self::RabbitMq),
            other => Err(EntityError::UnknownServiceKind(other.to_owned())),
        }
    }
}

/// A domain bound to an application.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DomainBinding {
    /// Owning application. Identity field.
    pub app: AppName,
    /// Bound domain. Changeable in place.
    pub domain: Domain,
}

impl DomainBinding {
    /// Builds a binding from validated parts.
    #[must_use]
    pub const fn new(app: AppName, domain: Domain) -> Self {
        Self { app, domain }
    }
}

/// Automatic TLS certificate management for an application.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Certificate {
    /// Application with certificates enabled. Identity field.
    pub app: AppName,
}

impl Certificate {
    /// Builds a certificate state for `app`.
    #[must_use]
    pub const fn new(app: AppName) -> Self {
        Self { app }
    }
}

/// A datastore service linked to an application.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ServiceLink {
    /// Linked application. Identity field.
    pub app: AppName,
    /// Datastore plugin. Identity field.
    pub kind: ServiceKind,
    /// Service instance. Identity field.
    pub service: ServiceName,
    /// Optional environment prefix; the host assigns one when absent.
    pub alias: Option<Alias>,
}

impl ServiceLink {
    /// Builds a link from validated parts.
    #[must_use]
    pub const fn new(
        app: AppName,
        kind: ServiceKind,
        service: ServiceName,
        alias: Option<Alias>,
    ) -> Self {
        Self {
            app,
            kind,
            service,
            alias,
        }
    }
}
