//! PostgreSQL server version and the PostGIS initialisation it implies.

use super::ProvisioningDomainError;
use std::fmt;

/// PostgreSQL version as reported by `psql --version`, kept as string
/// components (for example `["9", "3", "2"]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresVersion(Vec<String>);

/// How PostGIS must be installed into a database for a server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostgisInstallMethod {
    /// 9.1 servers load `postgis.sql` and `spatial_ref_sys.sql` script files.
    LegacyScripts,
    /// 9.3 servers run `CREATE EXTENSION IF NOT EXISTS postgis`.
    Extension,
}

impl PostgresVersion {
    /// Creates a version from its components.
    #[must_use]
    pub fn from_components(components: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(components.into_iter().map(Into::into).collect())
    }

    /// Parses the first line of `psql --version` output, for example
    /// `psql (PostgreSQL) 9.3.2`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningDomainError::UnparseableVersion`] when no
    /// whitespace-separated token on the first line starts with a digit.
    pub fn parse_psql_output(output: &str) -> Result<Self, ProvisioningDomainError> {
        let first_line = output.lines().next().unwrap_or_default();
        let version_token = first_line
            .split_whitespace()
            .find(|token| token.starts_with(|character: char| character.is_ascii_digit()))
            .ok_or_else(|| ProvisioningDomainError::UnparseableVersion(output.trim().to_owned()))?;

        Ok(Self::from_components(version_token.split('.')))
    }

    /// Returns the version components.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// Returns the major and minor components when both are present.
    #[must_use]
    pub fn major_minor(&self) -> Option<(&str, &str)> {
        match self.0.as_slice() {
            [major, minor, ..] => Some((major.as_str(), minor.as_str())),
            _ => None,
        }
    }

    /// Selects the PostGIS initialisation method for this version.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningDomainError::UnsupportedPostgresVersion`] for
    /// anything other than 9.1 and 9.3.
    pub fn postgis_install_method(&self) -> Result<PostgisInstallMethod, ProvisioningDomainError> {
        match self.major_minor() {
            Some(("9", "1")) => Ok(PostgisInstallMethod::LegacyScripts),
            Some(("9", "3")) => Ok(PostgisInstallMethod::Extension),
            _ => Err(ProvisioningDomainError::UnsupportedPostgresVersion(
                self.to_string(),
            )),
        }
    }
}

impl fmt::Display for PostgresVersion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0.join("."))
    }
}
