//! In-memory integration tests for PostGIS initialisation.

use super::helpers::{
    cluster, create_user_and_database, database, db_hosts, first, postgis, probe, settings,
};
use pgprovision::provisioning::{
    adapters::memory::InMemoryPostgresCluster,
    domain::{HostSet, ProvisioningDomainError},
    services::{PostgisOutcome, ProvisioningServiceError},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn extension_is_created_once_on_9_3(cluster: InMemoryPostgresCluster, db_hosts: HostSet) {
    create_user_and_database(&cluster, &db_hosts, "ed_fr").await;
    let service = postgis(&cluster, settings());

    let first_run = service
        .initdb(&db_hosts, &database("ed_fr"))
        .await
        .expect("first initdb should succeed");
    let second_run = service
        .initdb(&db_hosts, &database("ed_fr"))
        .await
        .expect("second initdb should succeed");

    assert_eq!(first_run, vec![PostgisOutcome::InstalledExtension]);
    assert_eq!(second_run, vec![PostgisOutcome::AlreadyInstalled]);
    assert_eq!(cluster.count_commands_containing("CREATE EXTENSION"), 1);
    assert_eq!(cluster.count_commands_containing("--file"), 0);

    let installed = probe(&cluster)
        .has_postgis(first(&db_hosts), &database("ed_fr"))
        .await
        .expect("has_postgis should succeed");
    assert!(installed);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn legacy_scripts_are_loaded_once_on_9_1(db_hosts: HostSet) {
    let cluster = InMemoryPostgresCluster::new().with_version("9.1.24");
    create_user_and_database(&cluster, &db_hosts, "ed_fr").await;
    let service = postgis(
        &cluster,
        settings().with_postgis_dir("/usr/share/postgresql/9.1/contrib/postgis-1.5"),
    );

    let first_run = service
        .initdb(&db_hosts, &database("ed_fr"))
        .await
        .expect("first initdb should succeed");
    let second_run = service
        .initdb(&db_hosts, &database("ed_fr"))
        .await
        .expect("second initdb should succeed");

    assert_eq!(first_run, vec![PostgisOutcome::InstalledFromScripts]);
    assert_eq!(second_run, vec![PostgisOutcome::AlreadyInstalled]);
    assert_eq!(cluster.count_commands_containing("--file"), 2);
    assert_eq!(cluster.count_commands_containing("CREATE EXTENSION"), 0);
    let snapshot = cluster.database("ed_fr").expect("database exists");
    assert!(snapshot.postgis);
    assert!(snapshot.spatial_ref_sys);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn legacy_install_requires_postgis_dir(db_hosts: HostSet) {
    let cluster = InMemoryPostgresCluster::new().with_version("9.1.24");
    create_user_and_database(&cluster, &db_hosts, "ed_fr").await;

    let result = postgis(&cluster, settings())
        .initdb(&db_hosts, &database("ed_fr"))
        .await;

    assert!(matches!(
        result,
        Err(ProvisioningServiceError::MissingPostgisDir)
    ));
    assert_eq!(cluster.count_commands_containing("--file"), 0);
}

#[rstest]
#[case("9.4.26")]
#[case("9.0.23")]
#[case("10.23")]
#[case("16.4")]
#[tokio::test(flavor = "multi_thread")]
async fn other_versions_fail_without_changes(db_hosts: HostSet, #[case] version: &str) {
    let cluster = InMemoryPostgresCluster::new().with_version(version);
    create_user_and_database(&cluster, &db_hosts, "ed_fr").await;

    let result = postgis(&cluster, settings().with_postgis_dir("/usr/share/postgis"))
        .initdb(&db_hosts, &database("ed_fr"))
        .await;

    assert!(matches!(
        result,
        Err(ProvisioningServiceError::Domain(
            ProvisioningDomainError::UnsupportedPostgresVersion(_)
        ))
    ));
    assert_eq!(cluster.count_commands_containing("CREATE EXTENSION"), 0);
    assert_eq!(cluster.count_commands_containing("--file"), 0);
    assert!(cluster.database("ed_fr").is_some_and(|snapshot| !snapshot.postgis));
}
