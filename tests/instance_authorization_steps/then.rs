//! Then steps for instance authorization BDD scenarios.

use super::world::AuthorizationWorld;
use pgprovision::provisioning::services::AuthorizationOutcome;
use rstest_bdd_macros::then;

fn outcomes(world: &AuthorizationWorld) -> Result<&[AuthorizationOutcome], eyre::Report> {
    match world.last_result.as_ref() {
        Some(Ok(outcomes)) => Ok(outcomes),
        Some(Err(err)) => Err(eyre::eyre!("authorization failed: {err}")),
        None => Err(eyre::eyre!("missing authorization result")),
    }
}

#[then(r#"the authorization service received "{path}" with "{body}""#)]
fn service_received(
    world: &AuthorizationWorld,
    path: String,
    body: String,
) -> Result<(), eyre::Report> {
    eyre::ensure!(
        matches!(outcomes(world)?, [AuthorizationOutcome::Granted(_)]),
        "expected a granted authorization"
    );
    let calls: Vec<_> = world
        .cluster
        .commands()
        .into_iter()
        .filter(|recorded| recorded.command.starts_with("curl "))
        .collect();
    let [call] = calls.as_slice() else {
        return Err(eyre::eyre!("expected one curl call, found {}", calls.len()));
    };
    eyre::ensure!(call.host.as_str() == "app1", "curl ran on {}", call.host);
    eyre::ensure!(
        call.command.contains(&format!("{path}'")) && call.command.contains(&format!("\"{body}\"")),
        "unexpected curl command: {}",
        call.command
    );
    Ok(())
}

#[then("the authorization is skipped")]
fn authorization_skipped(world: &AuthorizationWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(
        matches!(outcomes(world)?, [AuthorizationOutcome::Skipped { .. }]),
        "expected a skipped authorization"
    );
    Ok(())
}

#[then("the authorization service was not called")]
fn service_not_called(world: &AuthorizationWorld) -> Result<(), eyre::Report> {
    let calls = world.cluster.count_commands_containing("curl");
    eyre::ensure!(calls == 0, "expected no curl calls, found {calls}");
    Ok(())
}
