//! Domain model for PostgreSQL provisioning.
//!
//! The provisioning domain models validated identifiers, secrets, target
//! hosts, server versions, authorization grants, and SQL script templates.
//! Transport and rendering concerns remain outside this boundary.

mod authorization;
mod credentials;
mod error;
mod hosts;
mod instance;
mod names;
mod script;
mod version;

pub use authorization::{AuthorizationGrant, NumericId};
pub use credentials::{AdminToken, Password};
pub use error::ProvisioningDomainError;
pub use hosts::{Host, HostSet};
pub use instance::InstanceDescriptor;
pub use names::{DatabaseName, InstanceName, RoleName};
pub use script::{ScriptContext, SqlTemplate};
pub use version::{PostgisInstallMethod, PostgresVersion};
