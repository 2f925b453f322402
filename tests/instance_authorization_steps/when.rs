//! When steps for instance authorization BDD scenarios.

use super::world::{AuthorizationWorld, run_async};
use pgprovision::provisioning::domain::InstanceName;
use rstest_bdd_macros::when;

#[when(r#"authorization is set for instance "{name}""#)]
fn set_authorization(world: &mut AuthorizationWorld, name: String) -> Result<(), eyre::Report> {
    let instance = InstanceName::new(name)?;
    let result = run_async(world.service.set_instance_authorization(
        &world.db_hosts,
        &world.app_hosts,
        &instance,
    ));
    world.last_result = Some(result);
    Ok(())
}
