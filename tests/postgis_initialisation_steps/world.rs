//! Shared world state for PostGIS initialisation BDD scenarios.

use std::sync::Arc;

use pgprovision::{
    config::PostgresSettings,
    provisioning::{
        adapters::{MiniJinjaTemplates, memory::InMemoryPostgresCluster},
        domain::{DatabaseName, Host, HostSet},
        services::{
            DatabaseLifecycleService, PostgisOutcome, PostgisService, ProvisioningServiceResult,
        },
    },
};
use rstest::fixture;

/// Scenario world for PostGIS initialisation behaviour tests.
pub struct PostgisWorld {
    pub cluster: InMemoryPostgresCluster,
    pub hosts: HostSet,
    pub settings: PostgresSettings,
    pub last_result: Option<ProvisioningServiceResult<Vec<PostgisOutcome>>>,
}

impl PostgisWorld {
    /// Creates a world with a PostgreSQL 9.3.2 cluster and one database host.
    ///
    /// # Panics
    ///
    /// Panics if the fixed host or database names are rejected.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cluster: InMemoryPostgresCluster::new(),
            hosts: HostSet::single(Host::new("db1").expect("valid host")),
            settings: PostgresSettings::new(
                DatabaseName::new("jormungandr").expect("valid database"),
            ),
            last_result: None,
        }
    }

    /// Builds a PostGIS service over the current cluster and settings.
    #[must_use]
    pub fn postgis(&self) -> PostgisService<InMemoryPostgresCluster> {
        PostgisService::new(
            Arc::new(self.cluster.clone()),
            Arc::new(self.settings.clone()),
        )
    }

    /// Builds a lifecycle service over the current cluster and settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded templates fail to compile.
    pub fn lifecycle(
        &self,
    ) -> Result<DatabaseLifecycleService<InMemoryPostgresCluster, MiniJinjaTemplates>, eyre::Report>
    {
        Ok(DatabaseLifecycleService::new(
            Arc::new(self.cluster.clone()),
            Arc::new(MiniJinjaTemplates::new()?),
            Arc::new(self.settings.clone()),
        ))
    }
}

impl Default for PostgisWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> PostgisWorld {
    PostgisWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
