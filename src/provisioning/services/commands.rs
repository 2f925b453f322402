//! Command lines sent to the remote hosts.
//!
//! Identifiers are validated newtypes and are spliced verbatim; secrets are
//! escaped with [`shell_escape`] and [`sql_literal`].

use crate::provisioning::domain::{
    AdminToken, AuthorizationGrant, DatabaseName, InstanceName, Password, RoleName,
};
use crate::shell::{shell_escape, sql_literal};
use camino::Utf8Path;

pub(crate) const PSQL_VERSION: &str = "psql --version";

pub(crate) fn user_exists(role: &RoleName) -> String {
    format!("psql -A -t -c \"select exists (SELECT * FROM pg_user WHERE usename='{role}');\"")
}

pub(crate) fn database_exists(database: &DatabaseName) -> String {
    format!(
        "psql -A -t -c \"select exists (SELECT * FROM pg_database WHERE datname='{database}');\""
    )
}

pub(crate) fn has_postgis(database: &DatabaseName) -> String {
    format!(
        "psql -A -t -c \"select exists (select 1 from pg_type where typname = 'geography');\" {database}"
    )
}

pub(crate) fn load_postgis_file(database: &DatabaseName, file: &Utf8Path) -> String {
    format!("psql --set ON_ERROR_STOP=1 --dbname={database} --file {file}")
}

pub(crate) fn create_postgis_extension(database: &DatabaseName) -> String {
    format!("psql -c \"CREATE EXTENSION IF NOT EXISTS postgis;\" --dbname={database}")
}

pub(crate) fn create_user(role: &RoleName) -> String {
    format!("createuser {role} --no-createdb --no-createrole --no-superuser")
}

pub(crate) fn verify_user_access(role: &RoleName, password: &Password) -> String {
    format!(
        "PGPASSWORD={} psql --tuples-only --host localhost --username {role} postgres --command=\"SELECT * FROM pg_catalog.pg_database;\"",
        shell_escape(password.expose())
    )
}

pub(crate) fn create_database(database: &DatabaseName, owner: &RoleName) -> String {
    format!("createdb {database} --owner={owner} --encoding=UTF8")
}

pub(crate) fn drop_database(database: &DatabaseName) -> String {
    format!("dropdb {database}")
}

pub(crate) fn drop_user(role: &RoleName) -> String {
    format!("dropuser {role}")
}

pub(crate) fn run_script(database: &DatabaseName, path: &Utf8Path, tuples_only: bool) -> String {
    let tuples_flag = if tuples_only { " --tuples-only" } else { "" };
    format!("psql --set ON_ERROR_STOP=1{tuples_flag} {database} < {path}")
}

pub(crate) fn remove_file(path: &Utf8Path) -> String {
    format!("rm -f {path}")
}

pub(crate) fn instance_id(target: &DatabaseName, instance: &InstanceName) -> String {
    format!(
        "psql -A -t --dbname={target} -c \"select id from instance where name = '{instance}';\""
    )
}

pub(crate) fn admin_user_id(target: &DatabaseName, token: &AdminToken) -> String {
    format!(
        "psql -A -t --dbname={target} -c \"select user_id from key where token = '{}';\"",
        token.expose()
    )
}

pub(crate) fn authorization_request(
    grant: &AuthorizationGrant,
    host_header: &str,
    endpoint: &str,
) -> String {
    let url = format!("{}{}", endpoint.trim_end_matches('/'), grant.endpoint_path());
    format!(
        "curl --header {} {} --data \"{}\"",
        shell_escape(&format!("Host: {host_header}")),
        shell_escape(&url),
        grant.form_body()
    )
}

pub(crate) fn ensure_user(role: &RoleName, password: &Password) -> String {
    let statement = format!(
        "CREATE USER {role} NOSUPERUSER NOCREATEDB NOCREATEROLE INHERIT LOGIN ENCRYPTED PASSWORD {};",
        sql_literal(password.expose())
    );
    format!("psql -c {}", shell_escape(&statement))
}

pub(crate) fn ensure_database(database: &DatabaseName, owner: &RoleName) -> String {
    format!("createdb --owner={owner} --template=template0 --encoding=UTF8 {database}")
}
