//! Imperative user, database, and instance record lifecycle tasks.

use super::{ProvisioningServiceResult, ScopedScriptRunner, ScriptRequest, commands};
use crate::config::PostgresSettings;
use crate::provisioning::{
    domain::{
        DatabaseName, Host, HostSet, InstanceName, Password, RoleName, ScriptContext, SqlTemplate,
    },
    ports::{RemoteExecutor, TemplateRenderer},
};
use std::sync::Arc;
use tracing::{debug, info};

/// Creates, renames, and removes users, databases, and instance records.
///
/// Every operation runs its full command sequence on each host in order and
/// stops at the first failure. Nothing is checked beforehand: creating an
/// existing user fails like `createuser` does.
#[derive(Clone)]
pub struct DatabaseLifecycleService<E, T>
where
    E: RemoteExecutor,
    T: TemplateRenderer,
{
    executor: Arc<E>,
    scripts: ScopedScriptRunner<E, T>,
    settings: Arc<PostgresSettings>,
}

impl<E, T> DatabaseLifecycleService<E, T>
where
    E: RemoteExecutor,
    T: TemplateRenderer,
{
    /// Creates a lifecycle service.
    #[must_use]
    pub fn new(executor: Arc<E>, templates: Arc<T>, settings: Arc<PostgresSettings>) -> Self {
        let scripts =
            ScopedScriptRunner::new(Arc::clone(&executor), templates, Arc::clone(&settings));
        Self {
            executor,
            scripts,
            settings,
        }
    }

    /// Creates `role` with `password`, then checks it can log in locally.
    ///
    /// # Errors
    ///
    /// Returns the first remote or template failure.
    pub async fn create_user(
        &self,
        hosts: &HostSet,
        role: &RoleName,
        password: &Password,
    ) -> ProvisioningServiceResult<()> {
        let context = ScriptContext::new()
            .with("username", role.as_str())
            .with("password", password.expose());
        let request = ScriptRequest::new(
            SqlTemplate::SetUserPassword,
            context,
            role.as_str(),
            DatabaseName::postgres(),
        );

        for host in hosts {
            self.as_superuser(host, &commands::create_user(role)).await?;
            self.scripts.execute(host, &request).await?;
            self.executor
                .run(host, &commands::verify_user_access(role, password))
                .await?;
            info!(host = %host, role = %role, "user created");
        }
        Ok(())
    }

    /// Creates `database` owned by `owner`, or by the role of the same name.
    ///
    /// # Errors
    ///
    /// Returns the first remote failure.
    pub async fn create_database(
        &self,
        hosts: &HostSet,
        database: &DatabaseName,
        owner: Option<&RoleName>,
    ) -> ProvisioningServiceResult<()> {
        let database_owner = owner.cloned().unwrap_or_else(|| RoleName::from(database));
        let command = commands::create_database(database, &database_owner);
        for host in hosts {
            self.as_superuser(host, &command).await?;
            info!(host = %host, database = %database, owner = %database_owner, "database created");
        }
        Ok(())
    }

    /// Renames `current` to `new`, together with the role of the same name.
    ///
    /// # Errors
    ///
    /// Returns the first remote or template failure.
    pub async fn rename_database(
        &self,
        hosts: &HostSet,
        current: &DatabaseName,
        new: &DatabaseName,
    ) -> ProvisioningServiceResult<()> {
        let context = ScriptContext::new()
            .with("current_database", current.as_str())
            .with("new_database", new.as_str());
        let request = ScriptRequest::new(
            SqlTemplate::RenameDatabaseAndOwner,
            context,
            current.as_str(),
            DatabaseName::postgres(),
        );
        for host in hosts {
            self.scripts.execute(host, &request).await?;
            info!(host = %host, from = %current, to = %new, "database renamed");
        }
        Ok(())
    }

    /// Drops `database`.
    ///
    /// # Errors
    ///
    /// Returns the first remote failure.
    pub async fn remove_database(
        &self,
        hosts: &HostSet,
        database: &DatabaseName,
    ) -> ProvisioningServiceResult<()> {
        for host in hosts {
            self.as_superuser(host, &commands::drop_database(database))
                .await?;
            info!(host = %host, database = %database, "database removed");
        }
        Ok(())
    }

    /// Drops `role`.
    ///
    /// # Errors
    ///
    /// Returns the first remote failure.
    pub async fn remove_user(&self, hosts: &HostSet, role: &RoleName) -> ProvisioningServiceResult<()> {
        for host in hosts {
            self.as_superuser(host, &commands::drop_user(role)).await?;
            info!(host = %host, role = %role, "user removed");
        }
        Ok(())
    }

    /// Deletes the `instance` record and its authorizations from the target
    /// database.
    ///
    /// # Errors
    ///
    /// Returns the first remote or template failure.
    pub async fn remove_instance(
        &self,
        hosts: &HostSet,
        instance: &InstanceName,
    ) -> ProvisioningServiceResult<()> {
        let request = ScriptRequest::new(
            SqlTemplate::RemoveInstance,
            ScriptContext::new().with("instance", instance.as_str()),
            instance.as_str(),
            self.settings.target_database.clone(),
        );
        for host in hosts {
            self.scripts.execute(host, &request).await?;
            info!(host = %host, instance = %instance, "instance removed");
        }
        Ok(())
    }

    /// Renames the `current` instance record to `new` in the target database.
    ///
    /// # Errors
    ///
    /// Returns the first remote or template failure.
    pub async fn rename_instance(
        &self,
        hosts: &HostSet,
        current: &InstanceName,
        new: &InstanceName,
    ) -> ProvisioningServiceResult<()> {
        let context = ScriptContext::new()
            .with("current_instance", current.as_str())
            .with("new_instance", new.as_str());
        let request = ScriptRequest::new(
            SqlTemplate::RenameInstance,
            context,
            current.as_str(),
            self.settings.target_database.clone(),
        );
        for host in hosts {
            self.scripts.execute(host, &request).await?;
            info!(host = %host, from = %current, to = %new, "instance renamed");
        }
        Ok(())
    }

    /// Returns whether `role` exists, looked up through a scoped script.
    ///
    /// # Errors
    ///
    /// Returns remote or template failures.
    pub async fn check_user_exists(
        &self,
        host: &Host,
        role: &RoleName,
    ) -> ProvisioningServiceResult<bool> {
        let request = ScriptRequest::new(
            SqlTemplate::CheckUserExists,
            ScriptContext::new().with("username", role.as_str()),
            role.as_str(),
            DatabaseName::postgres(),
        )
        .tuples_only();
        let output = self.scripts.execute(host, &request).await?;
        Ok(output.trim() == role.as_str())
    }

    async fn as_superuser(&self, host: &Host, command: &str) -> ProvisioningServiceResult<String> {
        debug!(host = %host, command, "running");
        Ok(self
            .executor
            .run_as(host, self.settings.superuser.as_str(), command)
            .await?)
    }
}
