//! PostGIS initialisation for an existing database.

use super::{PostgresProbe, ProvisioningServiceError, ProvisioningServiceResult, commands};
use crate::config::PostgresSettings;
use crate::provisioning::{
    domain::{DatabaseName, Host, HostSet, PostgisInstallMethod},
    ports::RemoteExecutor,
};
use std::sync::Arc;
use tracing::{debug, info};

/// What [`PostgisService::initdb`] did on one host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostgisOutcome {
    /// The `geography` type already existed; nothing was run.
    AlreadyInstalled,
    /// `postgis.sql` and `spatial_ref_sys.sql` were loaded (PostgreSQL 9.1).
    InstalledFromScripts,
    /// `CREATE EXTENSION postgis` was run (PostgreSQL 9.3).
    InstalledExtension,
}

/// Installs PostGIS into databases, choosing the method from the server
/// version.
#[derive(Clone)]
pub struct PostgisService<E>
where
    E: RemoteExecutor,
{
    executor: Arc<E>,
    probe: PostgresProbe<E>,
    settings: Arc<PostgresSettings>,
}

impl<E> PostgisService<E>
where
    E: RemoteExecutor,
{
    /// Creates a PostGIS service.
    #[must_use]
    pub fn new(executor: Arc<E>, settings: Arc<PostgresSettings>) -> Self {
        let probe = PostgresProbe::new(Arc::clone(&executor), settings.superuser.clone());
        Self {
            executor,
            probe,
            settings,
        }
    }

    /// Ensures PostGIS is installed in `database` on every host.
    ///
    /// # Errors
    ///
    /// Stops at the first host that fails. Unsupported server versions fail
    /// with [`ProvisioningDomainError::UnsupportedPostgresVersion`] wrapped in
    /// [`ProvisioningServiceError::Domain`], and a 9.1 server without a
    /// configured script directory fails with
    /// [`ProvisioningServiceError::MissingPostgisDir`].
    ///
    /// [`ProvisioningDomainError::UnsupportedPostgresVersion`]:
    /// crate::provisioning::domain::ProvisioningDomainError::UnsupportedPostgresVersion
    pub async fn initdb(
        &self,
        hosts: &HostSet,
        database: &DatabaseName,
    ) -> ProvisioningServiceResult<Vec<PostgisOutcome>> {
        let mut outcomes = Vec::with_capacity(hosts.len());
        for host in hosts {
            outcomes.push(self.initdb_on(host, database).await?);
        }
        Ok(outcomes)
    }

    async fn initdb_on(
        &self,
        host: &Host,
        database: &DatabaseName,
    ) -> ProvisioningServiceResult<PostgisOutcome> {
        if self.probe.has_postgis(host, database).await? {
            info!(host = %host, database = %database, "postgis already installed");
            return Ok(PostgisOutcome::AlreadyInstalled);
        }

        let version = self.probe.server_version(host).await?;
        match version.postgis_install_method()? {
            PostgisInstallMethod::LegacyScripts => {
                let postgis_dir = self
                    .settings
                    .postgis_dir()
                    .ok_or(ProvisioningServiceError::MissingPostgisDir)?;
                for script in ["postgis.sql", "spatial_ref_sys.sql"] {
                    self.as_superuser(
                        host,
                        &commands::load_postgis_file(database, &postgis_dir.join(script)),
                    )
                    .await?;
                }
                info!(host = %host, database = %database, version = %version, "postgis loaded from scripts");
                Ok(PostgisOutcome::InstalledFromScripts)
            }
            PostgisInstallMethod::Extension => {
                self.as_superuser(host, &commands::create_postgis_extension(database))
                    .await?;
                info!(host = %host, database = %database, version = %version, "postgis extension created");
                Ok(PostgisOutcome::InstalledExtension)
            }
        }
    }

    async fn as_superuser(&self, host: &Host, command: &str) -> ProvisioningServiceResult<()> {
        debug!(host = %host, command, "running");
        self.executor
            .run_as(host, self.settings.superuser.as_str(), command)
            .await?;
        Ok(())
    }
}
