//! Remote host addresses and the ordered host sets tasks run against.

use super::ProvisioningDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a remote host reachable by the command transport.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Host(String);

impl Host {
    /// Creates a validated host address.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningDomainError`] when the address is empty, contains
    /// whitespace, or starts with `-` (which `ssh` would read as an option).
    pub fn new(value: impl Into<String>) -> Result<Self, ProvisioningDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(ProvisioningDomainError::EmptyHost);
        }
        if normalized.starts_with('-') || normalized.chars().any(char::is_whitespace) {
            return Err(ProvisioningDomainError::InvalidHost(normalized));
        }
        Ok(Self(normalized))
    }

    /// Returns the host address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Host {
    type Error = ProvisioningDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Host> for String {
    fn from(value: Host) -> Self {
        value.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Non-empty ordered set of hosts a task is executed on, one after another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSet(Vec<Host>);

impl HostSet {
    /// Creates a host set, dropping duplicate addresses while keeping order.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningDomainError::EmptyHostSet`] when no host is given.
    pub fn new(hosts: impl IntoIterator<Item = Host>) -> Result<Self, ProvisioningDomainError> {
        let mut unique: Vec<Host> = Vec::new();
        for host in hosts {
            if !unique.contains(&host) {
                unique.push(host);
            }
        }
        if unique.is_empty() {
            return Err(ProvisioningDomainError::EmptyHostSet);
        }
        Ok(Self(unique))
    }

    /// Creates a host set holding a single host.
    #[must_use]
    pub fn single(host: Host) -> Self {
        Self(vec![host])
    }

    /// Iterates hosts in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &Host> {
        self.0.iter()
    }

    /// Returns the number of hosts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; host sets are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a HostSet {
    type Item = &'a Host;
    type IntoIter = std::slice::Iter<'a, Host>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
