//! Read-only state checks guarding the imperative provisioning steps.

use super::{ProvisioningServiceResult, commands};
use crate::provisioning::{
    domain::{DatabaseName, Host, PostgresVersion, RoleName},
    ports::RemoteExecutor,
};
use std::sync::Arc;
use tracing::debug;

/// Queries remote PostgreSQL state before anything is changed.
///
/// Boolean checks compare the trimmed `psql -A -t` output literally with
/// `t`, PostgreSQL's textual `true`. Any other output reads as `false`.
#[derive(Clone)]
pub struct PostgresProbe<E>
where
    E: RemoteExecutor,
{
    executor: Arc<E>,
    superuser: RoleName,
}

impl<E> PostgresProbe<E>
where
    E: RemoteExecutor,
{
    /// Creates a probe running queries as `superuser`.
    #[must_use]
    pub const fn new(executor: Arc<E>, superuser: RoleName) -> Self {
        Self {
            executor,
            superuser,
        }
    }

    /// Returns whether `role` exists on the server behind `host`.
    ///
    /// # Errors
    ///
    /// Returns remote execution errors.
    pub async fn user_exists(&self, host: &Host, role: &RoleName) -> ProvisioningServiceResult<bool> {
        self.query_flag(host, &commands::user_exists(role)).await
    }

    /// Returns whether `database` exists on the server behind `host`.
    ///
    /// # Errors
    ///
    /// Returns remote execution errors.
    pub async fn database_exists(
        &self,
        host: &Host,
        database: &DatabaseName,
    ) -> ProvisioningServiceResult<bool> {
        self.query_flag(host, &commands::database_exists(database))
            .await
    }

    /// Returns whether the PostGIS `geography` type exists in `database`.
    ///
    /// # Errors
    ///
    /// Returns remote execution errors.
    pub async fn has_postgis(
        &self,
        host: &Host,
        database: &DatabaseName,
    ) -> ProvisioningServiceResult<bool> {
        self.query_flag(host, &commands::has_postgis(database)).await
    }

    /// Returns the PostgreSQL version reported by `psql --version`.
    ///
    /// # Errors
    ///
    /// Returns remote execution errors, or a domain error when the output
    /// holds no version number.
    pub async fn server_version(&self, host: &Host) -> ProvisioningServiceResult<PostgresVersion> {
        let output = self.executor.run(host, commands::PSQL_VERSION).await?;
        Ok(PostgresVersion::parse_psql_output(&output)?)
    }

    async fn query_flag(&self, host: &Host, command: &str) -> ProvisioningServiceResult<bool> {
        let output = self
            .executor
            .run_as(host, self.superuser.as_str(), command)
            .await?;
        let flag = output.trim() == "t";
        debug!(host = %host, command, flag, "state check");
        Ok(flag)
    }
}
