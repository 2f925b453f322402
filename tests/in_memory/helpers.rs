//! Shared fixtures for in-memory provisioning integration tests.

use pgprovision::{
    config::{AuthorizationSettings, PostgresSettings},
    provisioning::{
        adapters::{MiniJinjaTemplates, memory::InMemoryPostgresCluster},
        domain::{AdminToken, DatabaseName, Host, HostSet, Password, RoleName},
        services::{
            AuthorizationService, DatabaseLifecycleService, InstanceProvisioningService,
            PostgisService, PostgresProbe,
        },
    },
};
use rstest::fixture;
use std::sync::Arc;

/// Application database holding instance and key records.
pub const TARGET_DATABASE: &str = "jormungandr";

/// Admin token seeded in the `key` table by authorization tests.
pub const ADMIN_TOKEN: &str = "admin-token";

/// Lifecycle service backed by the in-memory cluster.
pub type TestLifecycle = DatabaseLifecycleService<InMemoryPostgresCluster, MiniJinjaTemplates>;

/// Provides a fresh PostgreSQL 9.3.2 cluster.
#[fixture]
pub fn cluster() -> InMemoryPostgresCluster {
    InMemoryPostgresCluster::new()
}

/// Provides a single database host.
#[fixture]
pub fn db_hosts() -> HostSet {
    hosts(&["db1"])
}

/// Builds a host set from addresses.
///
/// # Panics
///
/// Panics when an address is invalid or the list is empty.
#[must_use]
pub fn hosts(addresses: &[&str]) -> HostSet {
    HostSet::new(
        addresses
            .iter()
            .map(|address| Host::new(*address).expect("valid host")),
    )
    .expect("non-empty host set")
}

/// Returns the first host of `hosts`.
#[must_use]
pub fn first(hosts: &HostSet) -> &Host {
    hosts.iter().next().expect("host sets are non-empty")
}

/// Default settings targeting [`TARGET_DATABASE`].
#[must_use]
pub fn settings() -> PostgresSettings {
    PostgresSettings::new(database(TARGET_DATABASE))
}

/// Parses a database name.
#[must_use]
pub fn database(name: &str) -> DatabaseName {
    DatabaseName::new(name).expect("valid database name")
}

/// Parses a role name.
#[must_use]
pub fn role(name: &str) -> RoleName {
    RoleName::new(name).expect("valid role name")
}

/// Wraps a password.
#[must_use]
pub fn password(value: &str) -> Password {
    Password::new(value).expect("valid password")
}

/// Builds a lifecycle service over `cluster`.
#[must_use]
pub fn lifecycle(cluster: &InMemoryPostgresCluster) -> TestLifecycle {
    DatabaseLifecycleService::new(
        Arc::new(cluster.clone()),
        Arc::new(MiniJinjaTemplates::new().expect("templates compile")),
        Arc::new(settings()),
    )
}

/// Builds a probe over `cluster`.
#[must_use]
pub fn probe(cluster: &InMemoryPostgresCluster) -> PostgresProbe<InMemoryPostgresCluster> {
    PostgresProbe::new(Arc::new(cluster.clone()), RoleName::postgres())
}

/// Builds a PostGIS service over `cluster` with `settings`.
#[must_use]
pub fn postgis(
    cluster: &InMemoryPostgresCluster,
    settings: PostgresSettings,
) -> PostgisService<InMemoryPostgresCluster> {
    PostgisService::new(Arc::new(cluster.clone()), Arc::new(settings))
}

/// Builds an authorization service over `cluster`.
#[must_use]
pub fn authorization(
    cluster: &InMemoryPostgresCluster,
) -> AuthorizationService<InMemoryPostgresCluster> {
    AuthorizationService::new(
        Arc::new(cluster.clone()),
        Arc::new(settings()),
        Arc::new(AuthorizationSettings::new(
            AdminToken::new(ADMIN_TOKEN).expect("valid token"),
            "tyr.example.org",
        )),
    )
}

/// Builds an instance provisioning service over `cluster`.
#[must_use]
pub fn provisioning(
    cluster: &InMemoryPostgresCluster,
) -> InstanceProvisioningService<InMemoryPostgresCluster> {
    InstanceProvisioningService::new(Arc::new(cluster.clone()), RoleName::postgres())
}

/// Creates `name` as both a role and a database it owns.
pub async fn create_user_and_database(
    cluster: &InMemoryPostgresCluster,
    hosts: &HostSet,
    name: &str,
) {
    let service = lifecycle(cluster);
    service
        .create_user(hosts, &role(name), &password("secret"))
        .await
        .expect("create_user should succeed");
    service
        .create_database(hosts, &database(name), None)
        .await
        .expect("create_database should succeed");
}
