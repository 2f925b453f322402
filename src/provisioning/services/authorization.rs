//! Grants the administration user access to a newly provisioned instance.

use super::{ProvisioningServiceResult, commands};
use crate::config::{AuthorizationSettings, PostgresSettings};
use crate::provisioning::{
    domain::{AuthorizationGrant, Host, HostSet, InstanceName, NumericId},
    ports::RemoteExecutor,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of [`AuthorizationService::set_instance_authorization`] for one
/// database host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    /// Both ids were found and the grant was sent.
    Granted(AuthorizationGrant),
    /// At least one id was missing or not numeric; nothing was sent.
    Skipped {
        /// Raw `instance` id query output, trimmed.
        instance_id: String,
        /// Raw `key` user id query output, trimmed.
        user_id: String,
    },
}

/// Bridges instance records to the HTTP authorization service.
#[derive(Clone)]
pub struct AuthorizationService<E>
where
    E: RemoteExecutor,
{
    executor: Arc<E>,
    postgres: Arc<PostgresSettings>,
    authorization: Arc<AuthorizationSettings>,
}

impl<E> AuthorizationService<E>
where
    E: RemoteExecutor,
{
    /// Creates an authorization service.
    #[must_use]
    pub const fn new(
        executor: Arc<E>,
        postgres: Arc<PostgresSettings>,
        authorization: Arc<AuthorizationSettings>,
    ) -> Self {
        Self {
            executor,
            postgres,
            authorization,
        }
    }

    /// Looks up the ids of `instance` and of the admin token's user on each
    /// database host and, when both are numeric, grants access through the
    /// application hosts.
    ///
    /// Missing or non-numeric ids are logged and skipped, never an error.
    ///
    /// # Errors
    ///
    /// Returns the first failing remote command.
    pub async fn set_instance_authorization(
        &self,
        db_hosts: &HostSet,
        http_hosts: &HostSet,
        instance: &InstanceName,
    ) -> ProvisioningServiceResult<Vec<AuthorizationOutcome>> {
        let mut outcomes = Vec::with_capacity(db_hosts.len());
        for host in db_hosts {
            let outcome = self.authorize_from(host, http_hosts, instance).await?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Posts `grant` to the authorization service from every host in
    /// `http_hosts`.
    ///
    /// # Errors
    ///
    /// Returns the first failing `curl` invocation.
    pub async fn call_http_authorization(
        &self,
        http_hosts: &HostSet,
        grant: &AuthorizationGrant,
    ) -> ProvisioningServiceResult<()> {
        let command = commands::authorization_request(
            grant,
            &self.authorization.host_header,
            &self.authorization.endpoint,
        );
        for host in http_hosts {
            debug!(host = %host, command = %command, "posting authorization");
            self.executor.run(host, &command).await?;
        }
        Ok(())
    }

    async fn authorize_from(
        &self,
        host: &Host,
        http_hosts: &HostSet,
        instance: &InstanceName,
    ) -> ProvisioningServiceResult<AuthorizationOutcome> {
        let target = &self.postgres.target_database;
        let instance_output = self
            .query(host, &commands::instance_id(target, instance))
            .await?;
        let user_output = self
            .query(
                host,
                &commands::admin_user_id(target, &self.authorization.admin_token),
            )
            .await?;

        match (NumericId::parse(&instance_output), NumericId::parse(&user_output)) {
            (Some(instance_id), Some(user_id)) => {
                let grant =
                    AuthorizationGrant::new(user_id, instance_id, self.authorization.api_id);
                self.call_http_authorization(http_hosts, &grant).await?;
                info!(
                    instance = %instance,
                    user_id = %grant.user_id(),
                    instance_id = %grant.instance_id(),
                    "authorization granted"
                );
                Ok(AuthorizationOutcome::Granted(grant))
            }
            _ => {
                let instance_id = instance_output.trim().to_owned();
                let user_id = user_output.trim().to_owned();
                warn!(
                    host = %host,
                    instance = %instance,
                    instance_id = %instance_id,
                    user_id = %user_id,
                    "cannot set authorization: instance or admin user id is not numeric"
                );
                Ok(AuthorizationOutcome::Skipped {
                    instance_id,
                    user_id,
                })
            }
        }
    }

    async fn query(&self, host: &Host, command: &str) -> ProvisioningServiceResult<String> {
        Ok(self
            .executor
            .run_as(host, self.postgres.superuser.as_str(), command)
            .await?)
    }
}
