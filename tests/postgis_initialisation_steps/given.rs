//! Given steps for PostGIS initialisation BDD scenarios.

use super::world::{PostgisWorld, run_async};
use eyre::WrapErr;
use pgprovision::provisioning::{
    adapters::memory::InMemoryPostgresCluster,
    domain::{DatabaseName, Password, RoleName},
};
use rstest_bdd_macros::given;

#[given(r#"a database server running PostgreSQL "{version}""#)]
fn database_server(world: &mut PostgisWorld, version: String) {
    world.cluster = InMemoryPostgresCluster::new().with_version(version);
}

#[given(r#"PostGIS scripts installed in "{directory}""#)]
fn postgis_scripts(world: &mut PostgisWorld, directory: String) {
    world.settings = world.settings.clone().with_postgis_dir(directory);
}

#[given(r#"a database "{name}" owned by a role of the same name"#)]
fn database_with_owner(world: &mut PostgisWorld, name: String) -> Result<(), eyre::Report> {
    let role = RoleName::new(name.as_str())?;
    let database = DatabaseName::new(name)?;
    let lifecycle = world.lifecycle()?;
    run_async(lifecycle.create_user(&world.hosts, &role, &Password::new("secret")?))
        .wrap_err("create owner role")?;
    run_async(lifecycle.create_database(&world.hosts, &database, None))
        .wrap_err("create database")?;
    Ok(())
}

#[given(r#"PostGIS has already been initialised in "{name}""#)]
fn postgis_already_initialised(world: &mut PostgisWorld, name: String) -> Result<(), eyre::Report> {
    let database = DatabaseName::new(name)?;
    run_async(world.postgis().initdb(&world.hosts, &database))
        .wrap_err("initialise PostGIS in scenario setup")?;
    Ok(())
}
