//! In-memory integration tests for declarative instance provisioning.

use super::helpers::{cluster, db_hosts, first, lifecycle, password, provisioning, role};
use pgprovision::provisioning::{
    adapters::memory::InMemoryPostgresCluster,
    domain::{HostSet, InstanceDescriptor, InstanceName},
    services::InstanceProvisioningReport,
};
use rstest::rstest;

fn descriptor() -> InstanceDescriptor {
    InstanceDescriptor::new(
        InstanceName::new("fr").expect("valid instance"),
        password("s3cret"),
    )
    .expect("identifier-safe instance name")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creates_role_and_owned_database(cluster: InMemoryPostgresCluster, db_hosts: HostSet) {
    let reports = provisioning(&cluster)
        .create_instance_db(&db_hosts, &descriptor())
        .await
        .expect("create_instance_db should succeed");

    assert_eq!(
        reports,
        vec![InstanceProvisioningReport {
            host: first(&db_hosts).clone(),
            user_created: true,
            database_created: true,
        }]
    );
    assert_eq!(cluster.role_password("fr").as_deref(), Some("s3cret"));
    let snapshot = cluster.database("fr").expect("database exists");
    assert_eq!(snapshot.owner, "fr");
    assert_eq!(snapshot.encoding, "UTF8");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_run_changes_nothing(cluster: InMemoryPostgresCluster, db_hosts: HostSet) {
    let service = provisioning(&cluster);
    service
        .create_instance_db(&db_hosts, &descriptor())
        .await
        .expect("first run should succeed");

    let reports = service
        .create_instance_db(&db_hosts, &descriptor())
        .await
        .expect("second run should succeed");

    assert!(
        reports
            .iter()
            .all(|report| !report.user_created && !report.database_created)
    );
    assert_eq!(cluster.count_commands_containing("CREATE USER"), 1);
    assert_eq!(cluster.count_commands_containing("createdb"), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn existing_role_keeps_its_password(cluster: InMemoryPostgresCluster, db_hosts: HostSet) {
    lifecycle(&cluster)
        .create_user(&db_hosts, &role("fr"), &password("original"))
        .await
        .expect("create_user should succeed");

    let reports = provisioning(&cluster)
        .create_instance_db(&db_hosts, &descriptor())
        .await
        .expect("create_instance_db should succeed");

    assert!(reports.iter().all(|report| !report.user_created && report.database_created));
    assert_eq!(cluster.role_password("fr").as_deref(), Some("original"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn custom_role_and_database_names(cluster: InMemoryPostgresCluster, db_hosts: HostSet) {
    let custom = descriptor()
        .with_db_user(role("fr_owner"))
        .with_db_name(super::helpers::database("fr_data"));

    provisioning(&cluster)
        .create_instance_db(&db_hosts, &custom)
        .await
        .expect("create_instance_db should succeed");

    assert!(cluster.has_role("fr_owner"));
    assert_eq!(
        cluster.database("fr_data").map(|snapshot| snapshot.owner),
        Some("fr_owner".to_owned())
    );
    assert!(cluster.database("fr").is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn hyphenated_instance_uses_explicit_names(
    cluster: InMemoryPostgresCluster,
    db_hosts: HostSet,
) {
    let instance = InstanceName::new("fr-idf").expect("valid instance");
    assert!(InstanceDescriptor::new(instance.clone(), password("s3cret")).is_err());
    let explicit = InstanceDescriptor::with_names(
        instance,
        role("fr_idf"),
        super::helpers::database("fr_idf"),
        password("s3cret"),
    );

    provisioning(&cluster)
        .create_instance_db(&db_hosts, &explicit)
        .await
        .expect("create_instance_db should succeed");

    assert_eq!(
        cluster.database("fr_idf").map(|snapshot| snapshot.owner),
        Some("fr_idf".to_owned())
    );
}
