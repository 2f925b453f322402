//! Declarative "this must exist" checks for roles and databases.

use super::{PostgresProbe, ProvisioningServiceResult, commands};
use crate::provisioning::{
    domain::{DatabaseName, Host, Password, RoleName},
    ports::RemoteExecutor,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Creates roles and databases only when they are absent.
#[derive(Clone)]
pub struct PostgresRequirements<E>
where
    E: RemoteExecutor,
{
    executor: Arc<E>,
    probe: PostgresProbe<E>,
    superuser: RoleName,
}

impl<E> PostgresRequirements<E>
where
    E: RemoteExecutor,
{
    /// Creates the requirement checker running as `superuser`.
    #[must_use]
    pub fn new(executor: Arc<E>, superuser: RoleName) -> Self {
        let probe = PostgresProbe::new(Arc::clone(&executor), superuser.clone());
        Self {
            executor,
            probe,
            superuser,
        }
    }

    /// Ensures a login role named `role` exists. An existing role keeps its
    /// current password.
    ///
    /// Returns `true` when the role was created.
    ///
    /// # Errors
    ///
    /// Returns remote execution errors.
    pub async fn ensure_user(
        &self,
        host: &Host,
        role: &RoleName,
        password: &Password,
    ) -> ProvisioningServiceResult<bool> {
        if self.probe.user_exists(host, role).await? {
            debug!(host = %host, role = %role, "user present");
            return Ok(false);
        }
        self.executor
            .run_as(host, self.superuser.as_str(), &commands::ensure_user(role, password))
            .await?;
        info!(host = %host, role = %role, "user created");
        Ok(true)
    }

    /// Ensures `database` exists, owned by `owner` when it has to be created.
    ///
    /// Returns `true` when the database was created.
    ///
    /// # Errors
    ///
    /// Returns remote execution errors.
    pub async fn ensure_database(
        &self,
        host: &Host,
        database: &DatabaseName,
        owner: &RoleName,
    ) -> ProvisioningServiceResult<bool> {
        if self.probe.database_exists(host, database).await? {
            debug!(host = %host, database = %database, "database present");
            return Ok(false);
        }
        self.executor
            .run_as(
                host,
                self.superuser.as_str(),
                &commands::ensure_database(database, owner),
            )
            .await?;
        info!(host = %host, database = %database, owner = %owner, "database created");
        Ok(true)
    }
}
