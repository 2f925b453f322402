//! In-memory integration tests for the authorization bridge.

use super::helpers::{ADMIN_TOKEN, TARGET_DATABASE, authorization, cluster, db_hosts, hosts};
use pgprovision::provisioning::{
    adapters::memory::InMemoryPostgresCluster,
    domain::{HostSet, InstanceName},
    services::AuthorizationOutcome,
};
use rstest::rstest;

fn instance() -> InstanceName {
    InstanceName::new("fr").expect("valid instance")
}

fn curl_commands(cluster: &InMemoryPostgresCluster) -> Vec<(String, Option<String>, String)> {
    cluster
        .commands()
        .into_iter()
        .filter(|recorded| recorded.command.starts_with("curl "))
        .map(|recorded| (recorded.host.to_string(), recorded.user, recorded.command))
        .collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn numeric_ids_grant_through_application_host(
    cluster: InMemoryPostgresCluster,
    db_hosts: HostSet,
) {
    cluster.add_instance_record(TARGET_DATABASE, "fr", "42");
    cluster.add_api_key(TARGET_DATABASE, ADMIN_TOKEN, "7");

    let outcomes = authorization(&cluster)
        .set_instance_authorization(&db_hosts, &hosts(&["app1"]), &instance())
        .await
        .expect("authorization should succeed");

    assert!(matches!(outcomes.as_slice(), [AuthorizationOutcome::Granted(_)]));
    assert_eq!(
        curl_commands(&cluster),
        vec![(
            "app1".to_owned(),
            None,
            "curl --header 'Host: tyr.example.org' 'http://localhost/v0/users/7/authorizations/' --data \"api_id=1&instance_id=42\"".to_owned(),
        )]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn every_application_host_is_called(cluster: InMemoryPostgresCluster, db_hosts: HostSet) {
    cluster.add_instance_record(TARGET_DATABASE, "fr", "42");
    cluster.add_api_key(TARGET_DATABASE, ADMIN_TOKEN, "7");

    authorization(&cluster)
        .set_instance_authorization(&db_hosts, &hosts(&["app1", "app2"]), &instance())
        .await
        .expect("authorization should succeed");

    let called: Vec<String> = curl_commands(&cluster)
        .into_iter()
        .map(|(host, _, _)| host)
        .collect();
    assert_eq!(called, vec!["app1", "app2"]);
}

#[rstest]
#[case(false, true)]
#[case(true, false)]
#[case(false, false)]
#[tokio::test(flavor = "multi_thread")]
async fn missing_ids_skip_the_http_call(
    cluster: InMemoryPostgresCluster,
    db_hosts: HostSet,
    #[case] seed_instance: bool,
    #[case] seed_key: bool,
) {
    cluster.add_instance_record(TARGET_DATABASE, "de", "43");
    if seed_instance {
        cluster.add_instance_record(TARGET_DATABASE, "fr", "42");
    }
    if seed_key {
        cluster.add_api_key(TARGET_DATABASE, ADMIN_TOKEN, "7");
    }

    let outcomes = authorization(&cluster)
        .set_instance_authorization(&db_hosts, &hosts(&["app1"]), &instance())
        .await
        .expect("skipping is not an error");

    assert!(matches!(
        outcomes.as_slice(),
        [AuthorizationOutcome::Skipped { .. }]
    ));
    assert!(curl_commands(&cluster).is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn non_numeric_ids_skip_the_http_call(cluster: InMemoryPostgresCluster, db_hosts: HostSet) {
    cluster.add_instance_record(TARGET_DATABASE, "fr", "42");
    cluster.add_api_key(TARGET_DATABASE, ADMIN_TOKEN, "admin");

    let outcomes = authorization(&cluster)
        .set_instance_authorization(&db_hosts, &hosts(&["app1"]), &instance())
        .await
        .expect("skipping is not an error");

    assert_eq!(
        outcomes,
        vec![AuthorizationOutcome::Skipped {
            instance_id: "42".to_owned(),
            user_id: "admin".to_owned(),
        }]
    );
    assert_eq!(cluster.count_commands_containing("curl"), 0);
}

#[rstest]
#[case("fr-idf")]
#[case("FR")]
#[tokio::test(flavor = "multi_thread")]
async fn stored_instance_names_match_verbatim(
    cluster: InMemoryPostgresCluster,
    db_hosts: HostSet,
    #[case] stored: &str,
) {
    cluster.add_instance_record(TARGET_DATABASE, stored, "42");
    cluster.add_api_key(TARGET_DATABASE, ADMIN_TOKEN, "7");

    let outcomes = authorization(&cluster)
        .set_instance_authorization(
            &db_hosts,
            &hosts(&["app1"]),
            &InstanceName::new(stored).expect("valid instance"),
        )
        .await
        .expect("authorization should succeed");

    assert!(matches!(
        outcomes.as_slice(),
        [AuthorizationOutcome::Granted(grant)] if grant.instance_id().as_str() == "42"
    ));
    assert_eq!(curl_commands(&cluster).len(), 1);
}
