//! Authorization grant giving the administration user access to an instance.

use super::ProvisioningDomainError;
use std::fmt;

/// Identifier read back from `psql` output that consists only of ASCII
/// digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumericId(String);

impl NumericId {
    /// Parses trimmed `psql` output as a digit string.
    ///
    /// Returns `None` for empty output, error text, or anything containing a
    /// non-digit character.
    #[must_use]
    pub fn parse(output: &str) -> Option<Self> {
        let trimmed = output.trim();
        let is_digits = !trimmed.is_empty() && trimmed.bytes().all(|byte| byte.is_ascii_digit());
        is_digits.then(|| Self(trimmed.to_owned()))
    }

    /// Validates an identifier supplied by an operator.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningDomainError::InvalidNumericId`] unless the
    /// trimmed value is a non-empty ASCII digit string.
    pub fn new(value: &str) -> Result<Self, ProvisioningDomainError> {
        Self::parse(value).ok_or_else(|| ProvisioningDomainError::InvalidNumericId(value.to_owned()))
    }

    /// Returns the identifier digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NumericId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Request to grant a user access to an instance through the authorization
/// service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGrant {
    user_id: NumericId,
    instance_id: NumericId,
    api_id: u32,
}

impl AuthorizationGrant {
    /// Creates a grant for the given API.
    #[must_use]
    pub const fn new(user_id: NumericId, instance_id: NumericId, api_id: u32) -> Self {
        Self {
            user_id,
            instance_id,
            api_id,
        }
    }

    /// Returns the user being granted access.
    #[must_use]
    pub const fn user_id(&self) -> &NumericId {
        &self.user_id
    }

    /// Returns the instance access is granted to.
    #[must_use]
    pub const fn instance_id(&self) -> &NumericId {
        &self.instance_id
    }

    /// Returns the API identifier.
    #[must_use]
    pub const fn api_id(&self) -> u32 {
        self.api_id
    }

    /// Returns the endpoint path for the user's authorizations.
    #[must_use]
    pub fn endpoint_path(&self) -> String {
        format!("/v0/users/{}/authorizations/", self.user_id)
    }

    /// Returns the form-encoded request body.
    #[must_use]
    pub fn form_body(&self) -> String {
        format!("api_id={}&instance_id={}", self.api_id, self.instance_id)
    }
}
