//! Secret values whose contents never appear in `Debug` output.

use super::ProvisioningDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Password for a PostgreSQL role.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Password(String);

impl Password {
    /// Creates a password.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningDomainError::EmptyPassword`] when `value` is
    /// empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ProvisioningDomainError> {
        let password = value.into();
        if password.is_empty() {
            return Err(ProvisioningDomainError::EmptyPassword);
        }
        Ok(Self(password))
    }

    /// Exposes the secret for embedding in remote commands or scripts.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Password {
    type Error = ProvisioningDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Password> for String {
    fn from(value: Password) -> Self {
        value.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("Password(***)")
    }
}

/// Administration API token whose owner is granted access to new instances.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AdminToken(String);

impl AdminToken {
    /// Creates a validated token.
    ///
    /// The token is spliced into a SQL literal inside a shell command, so it
    /// is limited to `[A-Za-z0-9_-]`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningDomainError::InvalidAdminToken`] when the token is
    /// empty or contains other characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ProvisioningDomainError> {
        let token = value.into().trim().to_owned();
        let is_valid = !token.is_empty()
            && token.chars().all(|character| {
                character.is_ascii_alphanumeric() || character == '_' || character == '-'
            });
        if !is_valid {
            return Err(ProvisioningDomainError::InvalidAdminToken);
        }
        Ok(Self(token))
    }

    /// Exposes the token for the key lookup query.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AdminToken {
    type Error = ProvisioningDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AdminToken> for String {
    fn from(value: AdminToken) -> Self {
        value.0
    }
}

impl fmt::Debug for AdminToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("AdminToken(***)")
    }
}
