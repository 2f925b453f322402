//! Provisioning task services.
//!
//! Each service receives its target hosts explicitly and drives the
//! [`RemoteExecutor`](crate::provisioning::ports::RemoteExecutor) port one
//! command at a time.

mod authorization;
pub(crate) mod commands;
mod database;
mod error;
mod instance;
mod postgis;
mod probe;
mod requirements;
mod script;

pub use authorization::{AuthorizationOutcome, AuthorizationService};
pub use database::DatabaseLifecycleService;
pub use error::{ProvisioningServiceError, ProvisioningServiceResult};
pub use instance::{InstanceProvisioningReport, InstanceProvisioningService};
pub use postgis::{PostgisOutcome, PostgisService};
pub use probe::PostgresProbe;
pub use requirements::PostgresRequirements;
pub use script::{ScopedScriptRunner, ScriptRequest};
