//! Layered configuration for provisioning tasks.
//!
//! Values are merged from serialized defaults, an optional TOML file, and
//! `PGPROVISION_`-prefixed environment variables (nested keys separated by
//! `__`, for example `PGPROVISION_POSTGRES__TARGET_DATABASE`).

use crate::provisioning::domain::{
    AdminToken, DatabaseName, Host, HostSet, ProvisioningDomainError, RoleName,
};
use camino::{Utf8Path, Utf8PathBuf};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "PGPROVISION_";

/// Errors returned while loading configuration or resolving host roles.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Extraction from the merged providers failed.
    #[error("invalid configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// No hosts are configured for a role.
    #[error("no hosts configured for role '{0}'")]
    UnknownRole(String),

    /// A configured host list is invalid.
    #[error("invalid hosts for role '{role}': {source}")]
    InvalidHosts {
        /// Role being resolved.
        role: String,
        /// Validation failure.
        source: ProvisioningDomainError,
    },
}

/// Settings for the database host tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresSettings {
    /// OS account and PostgreSQL superuser commands are run as.
    pub superuser: RoleName,
    /// Remote directory for single-use SQL scripts.
    pub script_dir: Utf8PathBuf,
    /// Remote directory holding `postgis.sql` and `spatial_ref_sys.sql` for
    /// 9.1 servers.
    pub postgis_dir: Option<Utf8PathBuf>,
    /// Application database holding instance and key records.
    pub target_database: DatabaseName,
}

impl PostgresSettings {
    /// Creates settings with the default superuser and script directory.
    #[must_use]
    pub fn new(target_database: DatabaseName) -> Self {
        Self {
            superuser: default_superuser(),
            script_dir: default_script_dir(),
            postgis_dir: None,
            target_database,
        }
    }

    /// Sets the PostGIS script directory.
    #[must_use]
    pub fn with_postgis_dir(mut self, postgis_dir: impl Into<Utf8PathBuf>) -> Self {
        self.postgis_dir = Some(postgis_dir.into());
        self
    }

    /// Returns the remote path of the script for `entity`.
    #[must_use]
    pub fn script_path(&self, entity: &str) -> Utf8PathBuf {
        self.script_dir.join(format!("postgres_{entity}.sql"))
    }

    /// Returns the PostGIS directory when configured.
    #[must_use]
    pub fn postgis_dir(&self) -> Option<&Utf8Path> {
        self.postgis_dir.as_deref()
    }
}

/// Settings for the authorization bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationSettings {
    /// Token whose owning user is granted access to new instances.
    pub admin_token: AdminToken,
    /// Value of the `Host` header sent to the authorization service.
    pub host_header: String,
    /// Base URL of the authorization service as seen from the application
    /// host.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API the grant applies to.
    #[serde(default = "default_api_id")]
    pub api_id: u32,
}

impl AuthorizationSettings {
    /// Creates settings with the default endpoint and API id.
    #[must_use]
    pub fn new(admin_token: AdminToken, host_header: impl Into<String>) -> Self {
        Self {
            admin_token,
            host_header: host_header.into(),
            endpoint: default_endpoint(),
            api_id: default_api_id(),
        }
    }
}

/// Names of the host roles tasks are dispatched to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSettings {
    /// Role of the PostgreSQL hosts.
    pub database: String,
    /// Role of the application hosts that reach the authorization service.
    pub application: String,
}

impl Default for RoleSettings {
    fn default() -> Self {
        Self {
            database: "db".to_owned(),
            application: "app".to_owned(),
        }
    }
}

/// `ssh` connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshSettings {
    /// Remote login user.
    pub user: Option<String>,
    /// Remote port.
    pub port: Option<u16>,
    /// Extra `-o` options.
    #[serde(default)]
    pub options: Vec<String>,
}

/// Complete provisioning configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// Database host settings.
    pub postgres: PostgresSettings,
    /// Authorization bridge settings.
    pub authorization: AuthorizationSettings,
    /// Role names.
    #[serde(default)]
    pub roles: RoleSettings,
    /// Hosts per role.
    #[serde(default)]
    pub hosts: BTreeMap<String, Vec<String>>,
    /// Connection settings.
    #[serde(default)]
    pub ssh: SshSettings,
}

/// Defaults for the keys that have one; required keys are left out so that
/// extraction reports them as missing.
#[derive(Debug, Serialize)]
struct Defaults {
    postgres: PostgresDefaults,
    roles: RoleSettings,
}

#[derive(Debug, Serialize)]
struct PostgresDefaults {
    superuser: RoleName,
    script_dir: Utf8PathBuf,
}

impl ProvisioningConfig {
    /// Loads configuration from defaults, `path` (when given), and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Extract`] when a required key is missing or a
    /// value fails validation.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(path))
    }

    /// Builds the layered provider stack without extracting it.
    #[must_use]
    pub fn figment(path: Option<&Utf8Path>) -> Figment {
        let defaults = Defaults {
            postgres: PostgresDefaults {
                superuser: default_superuser(),
                script_dir: default_script_dir(),
            },
            roles: RoleSettings::default(),
        };
        let mut figment = Figment::from(Serialized::defaults(defaults));
        if let Some(file) = path {
            figment = figment.merge(Toml::file(file.as_std_path()));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extracts configuration from an arbitrary provider stack.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Extract`] when extraction fails.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .extract()
            .map_err(|error| ConfigError::Extract(Box::new(error)))
    }

    /// Resolves the hosts configured for `role`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownRole`] when the role has no hosts and
    /// [`ConfigError::InvalidHosts`] when an address is invalid.
    pub fn hosts_for(&self, role: &str) -> Result<HostSet, ConfigError> {
        let addresses = self
            .hosts
            .get(role)
            .filter(|addresses| !addresses.is_empty())
            .ok_or_else(|| ConfigError::UnknownRole(role.to_owned()))?;
        let invalid = |source| ConfigError::InvalidHosts {
            role: role.to_owned(),
            source,
        };
        let hosts = addresses
            .iter()
            .map(|address| Host::new(address.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;
        HostSet::new(hosts).map_err(invalid)
    }

    /// Resolves the database role's hosts.
    ///
    /// # Errors
    ///
    /// See [`Self::hosts_for`].
    pub fn database_hosts(&self) -> Result<HostSet, ConfigError> {
        self.hosts_for(&self.roles.database)
    }

    /// Resolves the application role's hosts.
    ///
    /// # Errors
    ///
    /// See [`Self::hosts_for`].
    pub fn application_hosts(&self) -> Result<HostSet, ConfigError> {
        self.hosts_for(&self.roles.application)
    }
}

fn default_superuser() -> RoleName {
    RoleName::postgres()
}

fn default_script_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("/var/lib/postgresql")
}

fn default_endpoint() -> String {
    "http://localhost".to_owned()
}

const fn default_api_id() -> u32 {
    1
}
