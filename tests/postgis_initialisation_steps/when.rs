//! When steps for PostGIS initialisation BDD scenarios.

use super::world::{PostgisWorld, run_async};
use pgprovision::provisioning::domain::DatabaseName;
use rstest_bdd_macros::when;

#[when(r#"PostGIS is initialised in "{name}""#)]
fn initialise_postgis(world: &mut PostgisWorld, name: String) -> Result<(), eyre::Report> {
    let database = DatabaseName::new(name)?;
    let result = run_async(world.postgis().initdb(&world.hosts, &database));
    world.last_result = Some(result);
    Ok(())
}
