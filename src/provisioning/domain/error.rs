//! Error types for provisioning domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing provisioning domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProvisioningDomainError {
    /// An identifier is empty after trimming.
    #[error("{kind} name must not be empty")]
    EmptyIdentifier {
        /// Kind of identifier being validated.
        kind: &'static str,
    },

    /// An identifier contains characters outside `[a-z0-9_]` or starts with a
    /// digit.
    #[error(
        "{kind} name '{value}' is invalid (only lowercase alphanumeric and underscores allowed, not starting with a digit)"
    )]
    InvalidIdentifier {
        /// Kind of identifier being validated.
        kind: &'static str,
        /// Normalized rejected value.
        value: String,
    },

    /// An identifier exceeds the PostgreSQL identifier length limit.
    #[error("{kind} name exceeds 63 byte limit: {value}")]
    IdentifierTooLong {
        /// Kind of identifier being validated.
        kind: &'static str,
        /// Normalized rejected value.
        value: String,
    },

    /// An instance name contains characters outside `[A-Za-z0-9_-]` or
    /// starts with `-`.
    #[error("instance name '{0}' is invalid (only [A-Za-z0-9_-] allowed, not starting with '-')")]
    InvalidInstanceName(String),

    /// A password is empty.
    #[error("password must not be empty")]
    EmptyPassword,

    /// The administration token is empty or contains unsupported characters.
    #[error("admin token must be non-empty and contain only [A-Za-z0-9_-]")]
    InvalidAdminToken,

    /// A host address is empty after trimming.
    #[error("host must not be empty")]
    EmptyHost,

    /// A host address contains whitespace or starts with `-`.
    #[error("invalid host '{0}'")]
    InvalidHost(String),

    /// A host set contains no hosts.
    #[error("host set must contain at least one host")]
    EmptyHostSet,

    /// An id supplied on the command line is not a digit string.
    #[error("'{0}' is not a numeric id")]
    InvalidNumericId(String),

    /// `psql --version` output did not contain a version number.
    #[error("could not parse PostgreSQL version from '{0}'")]
    UnparseableVersion(String),

    /// The PostgreSQL version has no known PostGIS initialisation method.
    #[error("unsupported PostgreSQL version {0} for PostGIS initialisation")]
    UnsupportedPostgresVersion(String),
}
