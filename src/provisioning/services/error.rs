//! Service-level errors shared by the provisioning tasks.

use crate::provisioning::{
    domain::ProvisioningDomainError,
    ports::{RemoteExecutorError, TemplateRenderError},
};
use thiserror::Error;

/// Errors returned by provisioning task services.
#[derive(Debug, Error)]
pub enum ProvisioningServiceError {
    /// Domain validation or parsing failed.
    #[error(transparent)]
    Domain(#[from] ProvisioningDomainError),
    /// A remote command failed or could not be run.
    #[error(transparent)]
    Remote(#[from] RemoteExecutorError),
    /// A SQL script template could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateRenderError),
    /// PostGIS scripts are needed but no script directory is configured.
    #[error("postgis_dir must be configured to initialise PostGIS on PostgreSQL 9.1")]
    MissingPostgisDir,
}

/// Result type for provisioning task services.
pub type ProvisioningServiceResult<T> = Result<T, ProvisioningServiceError>;
