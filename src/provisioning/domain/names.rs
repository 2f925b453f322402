//! Validated names for databases, roles, and instances.
//!
//! Database and role names are spliced verbatim into `psql` command lines and
//! SQL scripts, so validation restricts them to the unquoted lowercase
//! identifier alphabet. Instance names only ever appear inside SQL string
//! literals and remote file names; they keep their case.

use super::ProvisioningDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum identifier length, matching PostgreSQL's `NAMEDATALEN - 1`.
const MAX_IDENTIFIER_LENGTH: usize = 63;

fn normalize_identifier(
    kind: &'static str,
    value: impl Into<String>,
) -> Result<String, ProvisioningDomainError> {
    let normalized = value.into().trim().to_ascii_lowercase();

    if normalized.is_empty() {
        return Err(ProvisioningDomainError::EmptyIdentifier { kind });
    }

    let has_valid_characters = normalized.chars().all(|character| {
        character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_'
    });
    let starts_with_digit = normalized
        .chars()
        .next()
        .is_some_and(|character| character.is_ascii_digit());
    if !has_valid_characters || starts_with_digit {
        return Err(ProvisioningDomainError::InvalidIdentifier {
            kind,
            value: normalized,
        });
    }

    if normalized.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ProvisioningDomainError::IdentifierTooLong {
            kind,
            value: normalized,
        });
    }

    Ok(normalized)
}

fn validate_instance_name(value: impl Into<String>) -> Result<String, ProvisioningDomainError> {
    let name = value.into().trim().to_owned();

    if name.is_empty() {
        return Err(ProvisioningDomainError::EmptyIdentifier { kind: "instance" });
    }
    let has_valid_characters = name.chars().all(|character| {
        character.is_ascii_alphanumeric() || character == '_' || character == '-'
    });
    if !has_valid_characters || name.starts_with('-') {
        return Err(ProvisioningDomainError::InvalidInstanceName(name));
    }
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ProvisioningDomainError::IdentifierTooLong {
            kind: "instance",
            value: name,
        });
    }

    Ok(name)
}

macro_rules! name_conversions {
    ($name:ident) => {
        impl $name {
            /// Returns the name as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ProvisioningDomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(self.as_str())
            }
        }
    };
}

macro_rules! pg_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a validated identifier.
            ///
            /// The input is trimmed and lowercased.
            ///
            /// # Errors
            ///
            /// Returns [`ProvisioningDomainError`] when the identifier is
            /// empty, too long, or contains characters outside `[a-z0-9_]`.
            pub fn new(value: impl Into<String>) -> Result<Self, ProvisioningDomainError> {
                normalize_identifier($kind, value).map(Self)
            }
        }

        name_conversions!($name);
    };
}

pg_identifier!(
    /// Validated PostgreSQL database name.
    DatabaseName,
    "database"
);

pg_identifier!(
    /// Validated PostgreSQL role (user) name.
    RoleName,
    "role"
);

/// Name of a deployment instance as stored in the `instance` table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceName(String);

impl InstanceName {
    /// Creates a validated instance name.
    ///
    /// The input is trimmed; case is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningDomainError`] when the name is empty, too long,
    /// starts with `-`, or contains characters outside `[A-Za-z0-9_-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, ProvisioningDomainError> {
        validate_instance_name(value).map(Self)
    }
}

name_conversions!(InstanceName);

impl RoleName {
    /// Returns the conventional `postgres` superuser role.
    #[must_use]
    pub fn postgres() -> Self {
        Self("postgres".to_owned())
    }
}

impl DatabaseName {
    /// Returns the `postgres` maintenance database.
    #[must_use]
    pub fn postgres() -> Self {
        Self("postgres".to_owned())
    }
}

impl From<&DatabaseName> for RoleName {
    /// A database owner defaults to a role with the same name.
    fn from(database: &DatabaseName) -> Self {
        Self(database.0.clone())
    }
}

impl From<&RoleName> for DatabaseName {
    fn from(role: &RoleName) -> Self {
        Self(role.0.clone())
    }
}

impl TryFrom<&InstanceName> for DatabaseName {
    type Error = ProvisioningDomainError;

    /// Lowercases the instance name; fails when it is not a valid identifier.
    fn try_from(instance: &InstanceName) -> Result<Self, Self::Error> {
        Self::new(instance.as_str())
    }
}

impl TryFrom<&InstanceName> for RoleName {
    type Error = ProvisioningDomainError;

    fn try_from(instance: &InstanceName) -> Result<Self, Self::Error> {
        Self::new(instance.as_str())
    }
}
