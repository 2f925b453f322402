//! Single-use SQL scripts: render, upload, execute, and always delete.

use super::{ProvisioningServiceResult, commands};
use crate::config::PostgresSettings;
use crate::provisioning::{
    domain::{DatabaseName, Host, ScriptContext, SqlTemplate},
    ports::{RemoteExecutor, TemplateRenderer},
};
use std::sync::Arc;
use tracing::{debug, warn};

/// A script execution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    template: SqlTemplate,
    context: ScriptContext,
    entity: String,
    database: DatabaseName,
    tuples_only: bool,
}

impl ScriptRequest {
    /// Creates a request executing `template` against `database`. The remote
    /// file is named after `entity`.
    #[must_use]
    pub fn new(
        template: SqlTemplate,
        context: ScriptContext,
        entity: impl Into<String>,
        database: DatabaseName,
    ) -> Self {
        Self {
            template,
            context,
            entity: entity.into(),
            database,
            tuples_only: false,
        }
    }

    /// Prints rows without headers or footers.
    #[must_use]
    pub const fn tuples_only(mut self) -> Self {
        self.tuples_only = true;
        self
    }
}

/// Runs SQL templates as scoped remote scripts.
///
/// The remote file exists only for the duration of [`Self::execute`]: once
/// uploaded it is removed on every exit path, including failed execution.
#[derive(Clone)]
pub struct ScopedScriptRunner<E, T>
where
    E: RemoteExecutor,
    T: TemplateRenderer,
{
    executor: Arc<E>,
    templates: Arc<T>,
    settings: Arc<PostgresSettings>,
}

impl<E, T> ScopedScriptRunner<E, T>
where
    E: RemoteExecutor,
    T: TemplateRenderer,
{
    /// Creates a script runner.
    #[must_use]
    pub const fn new(executor: Arc<E>, templates: Arc<T>, settings: Arc<PostgresSettings>) -> Self {
        Self {
            executor,
            templates,
            settings,
        }
    }

    /// Renders, uploads, and executes the script as the superuser, then
    /// deletes it.
    ///
    /// # Errors
    ///
    /// Returns template errors before anything is uploaded, the upload or
    /// execution error when those fail, and otherwise the cleanup error.
    pub async fn execute(
        &self,
        host: &Host,
        request: &ScriptRequest,
    ) -> ProvisioningServiceResult<String> {
        let sql = self.templates.render(request.template, &request.context)?;
        let path = self.settings.script_path(&request.entity);
        let superuser = self.settings.superuser.as_str();

        debug!(host = %host, template = %request.template, path = %path, "uploading script");
        self.executor
            .upload(host, path.as_str(), &sql, superuser)
            .await?;

        let outcome = self
            .executor
            .run_as(
                host,
                superuser,
                &commands::run_script(&request.database, &path, request.tuples_only),
            )
            .await;
        let cleanup = self
            .executor
            .run(host, &commands::remove_file(&path))
            .await;

        match (outcome, cleanup) {
            (Ok(output), Ok(_)) => Ok(output),
            (Ok(_), Err(cleanup_error)) => Err(cleanup_error.into()),
            (Err(error), Ok(_)) => Err(error.into()),
            (Err(error), Err(cleanup_error)) => {
                warn!(host = %host, path = %path, error = %cleanup_error, "failed to remove script");
                Err(error.into())
            }
        }
    }
}
