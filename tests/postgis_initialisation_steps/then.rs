//! Then steps for PostGIS initialisation BDD scenarios.

use super::world::PostgisWorld;
use pgprovision::provisioning::{
    domain::ProvisioningDomainError,
    services::{PostgisOutcome, ProvisioningServiceError},
};
use rstest_bdd_macros::then;

#[then(r#"PostGIS is reported as "{outcome}""#)]
fn postgis_reported_as(world: &PostgisWorld, outcome: String) -> Result<(), eyre::Report> {
    let expected = match outcome.as_str() {
        "already installed" => PostgisOutcome::AlreadyInstalled,
        "installed from scripts" => PostgisOutcome::InstalledFromScripts,
        "installed extension" => PostgisOutcome::InstalledExtension,
        other => return Err(eyre::eyre!("unknown outcome in scenario: {other}")),
    };
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing initialisation result"))?;

    match result {
        Ok(outcomes) if outcomes.as_slice() == [expected] => Ok(()),
        other => Err(eyre::eyre!("expected {expected:?}, got {other:?}")),
    }
}

#[then("initialisation fails because the version is unsupported")]
fn fails_as_unsupported(world: &PostgisWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing initialisation result"))?;

    if !matches!(
        result,
        Err(ProvisioningServiceError::Domain(
            ProvisioningDomainError::UnsupportedPostgresVersion(_)
        ))
    ) {
        return Err(eyre::eyre!(
            "expected UnsupportedPostgresVersion error, got {result:?}"
        ));
    }

    Ok(())
}

#[then(r#"exactly {count:usize} commands contained "{fragment}""#)]
fn commands_contained(
    world: &PostgisWorld,
    count: usize,
    fragment: String,
) -> Result<(), eyre::Report> {
    let sent = world.cluster.count_commands_containing(&fragment);
    eyre::ensure!(
        sent == count,
        "expected {count} commands containing {fragment:?}, found {sent}"
    );
    Ok(())
}
