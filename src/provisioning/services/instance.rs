//! Provisioning entry point for a deployment instance's database.

use super::{PostgresRequirements, ProvisioningServiceResult};
use crate::provisioning::{
    domain::{Host, HostSet, InstanceDescriptor, RoleName},
    ports::RemoteExecutor,
};
use std::sync::Arc;

/// What [`InstanceProvisioningService::create_instance_db`] changed on one
/// host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceProvisioningReport {
    /// Host the requirements were applied on.
    pub host: Host,
    /// Whether the instance's role was created.
    pub user_created: bool,
    /// Whether the instance's database was created.
    pub database_created: bool,
}

/// Provisions instance databases through [`PostgresRequirements`].
#[derive(Clone)]
pub struct InstanceProvisioningService<E>
where
    E: RemoteExecutor,
{
    requirements: PostgresRequirements<E>,
}

impl<E> InstanceProvisioningService<E>
where
    E: RemoteExecutor,
{
    /// Creates the service running as `superuser`.
    #[must_use]
    pub fn new(executor: Arc<E>, superuser: RoleName) -> Self {
        Self {
            requirements: PostgresRequirements::new(executor, superuser),
        }
    }

    /// Ensures the instance's role and database exist on every host.
    /// Repeated calls change nothing.
    ///
    /// # Errors
    ///
    /// Returns the first remote execution error.
    pub async fn create_instance_db(
        &self,
        hosts: &HostSet,
        instance: &InstanceDescriptor,
    ) -> ProvisioningServiceResult<Vec<InstanceProvisioningReport>> {
        let mut reports = Vec::with_capacity(hosts.len());
        for host in hosts {
            let user_created = self
                .requirements
                .ensure_user(host, instance.db_user(), instance.db_password())
                .await?;
            let database_created = self
                .requirements
                .ensure_database(host, instance.db_name(), instance.db_user())
                .await?;
            reports.push(InstanceProvisioningReport {
                host: host.clone(),
                user_created,
                database_created,
            });
        }
        Ok(reports)
    }
}
