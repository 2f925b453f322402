//! Runs one provisioning task against the configured hosts.
//!
//! Usage:
//!
//! ```text
//! pgprovision [--config <path>] [--log-level <filter>] <task> [arguments]
//! ```
//!
//! Database tasks run on the hosts of the configured database role. The
//! authorization bridge additionally dispatches its HTTP call through the
//! application role. Predicates print `true` or `false` per database host.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use pgprovision::{
    config::ProvisioningConfig,
    provisioning::{
        adapters::{MiniJinjaTemplates, SshExecutor, SshOptions},
        domain::{
            AuthorizationGrant, DatabaseName, InstanceDescriptor, InstanceName, NumericId,
            Password, RoleName,
        },
        services::{
            AuthorizationService, DatabaseLifecycleService, InstanceProvisioningService,
            PostgisService, PostgresProbe,
        },
    },
    telemetry,
};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{error, info};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// PostgreSQL and PostGIS provisioning over SSH.
#[derive(Debug, Parser)]
#[command(name = "pgprovision", version)]
struct Cli {
    /// TOML configuration file; `PGPROVISION_*` variables override it.
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    task: Task,
}

#[derive(Debug, Subcommand)]
enum Task {
    /// Installs PostGIS into a database unless it is already present.
    PostgisInitdb {
        /// Database to initialise.
        database: String,
    },
    /// Prints whether a role exists.
    UserExists {
        /// Role to look up.
        user: String,
    },
    /// Prints whether a database exists.
    DatabaseExists {
        /// Database to look up.
        database: String,
    },
    /// Prints whether a role exists, checked through a scoped SQL script.
    CheckUser {
        /// Role to look up.
        user: String,
    },
    /// Creates a login role and sets its password.
    CreateUser {
        /// Role to create.
        user: String,
        /// Password for the new role.
        #[arg(long)]
        password: String,
    },
    /// Creates a UTF-8 database.
    CreateDatabase {
        /// Database to create.
        database: String,
        /// Owning role; defaults to the database name.
        #[arg(long)]
        owner: Option<String>,
    },
    /// Renames a database and the role of the same name.
    RenameDatabase {
        /// Current name.
        current: String,
        /// New name.
        new: String,
    },
    /// Drops a database.
    RemoveDatabase {
        /// Database to drop.
        database: String,
    },
    /// Drops a role.
    RemoveUser {
        /// Role to drop.
        user: String,
    },
    /// Deletes an instance record and its authorizations.
    RemoveInstance {
        /// Instance to delete.
        instance: String,
    },
    /// Renames an instance record.
    RenameInstance {
        /// Current name.
        current: String,
        /// New name.
        new: String,
    },
    /// Grants the administration user access to an instance.
    SetInstanceAuthorization {
        /// Instance to authorize.
        instance: String,
    },
    /// Posts an authorization grant from every application host.
    CallHttpAuthorization {
        /// Numeric id of the user being granted access.
        user_id: String,
        /// Numeric id of the instance.
        instance_id: String,
    },
    /// Ensures an instance's role and database exist.
    CreateInstanceDb {
        /// Instance to provision.
        instance: String,
        /// Password for the instance role.
        #[arg(long)]
        password: String,
        /// Role name; defaults to the instance name.
        #[arg(long)]
        db_user: Option<String>,
        /// Database name; defaults to the instance name.
        #[arg(long)]
        db_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level)?;

    let config = ProvisioningConfig::load(cli.config.as_deref())?;
    run(&config, cli.task).await.inspect_err(|err| {
        error!(error = %err, "task failed");
    })
}

async fn run(config: &ProvisioningConfig, task: Task) -> Result<(), BoxError> {
    let db_hosts = config.database_hosts()?;
    let executor = Arc::new(SshExecutor::new(
        SshOptions::new()
            .with_user(config.ssh.user.clone())
            .with_port(config.ssh.port)
            .with_extra_options(config.ssh.options.clone()),
    ));
    let postgres = Arc::new(config.postgres.clone());
    let lifecycle = DatabaseLifecycleService::new(
        Arc::clone(&executor),
        Arc::new(MiniJinjaTemplates::new()?),
        Arc::clone(&postgres),
    );
    let probe = PostgresProbe::new(Arc::clone(&executor), postgres.superuser.clone());

    match task {
        Task::PostgisInitdb { database } => {
            let outcomes = PostgisService::new(executor, postgres)
                .initdb(&db_hosts, &DatabaseName::new(database)?)
                .await?;
            info!(?outcomes, "postgis initialisation finished");
        }
        Task::UserExists { user } => {
            let role = RoleName::new(user)?;
            for host in &db_hosts {
                print_flag(probe.user_exists(host, &role).await?)?;
            }
        }
        Task::DatabaseExists { database } => {
            let name = DatabaseName::new(database)?;
            for host in &db_hosts {
                print_flag(probe.database_exists(host, &name).await?)?;
            }
        }
        Task::CheckUser { user } => {
            let role = RoleName::new(user)?;
            for host in &db_hosts {
                print_flag(lifecycle.check_user_exists(host, &role).await?)?;
            }
        }
        Task::CreateUser { user, password } => {
            lifecycle
                .create_user(&db_hosts, &RoleName::new(user)?, &Password::new(password)?)
                .await?;
        }
        Task::CreateDatabase { database, owner } => {
            let owner_role = owner.map(RoleName::new).transpose()?;
            lifecycle
                .create_database(&db_hosts, &DatabaseName::new(database)?, owner_role.as_ref())
                .await?;
        }
        Task::RenameDatabase { current, new } => {
            lifecycle
                .rename_database(
                    &db_hosts,
                    &DatabaseName::new(current)?,
                    &DatabaseName::new(new)?,
                )
                .await?;
        }
        Task::RemoveDatabase { database } => {
            lifecycle
                .remove_database(&db_hosts, &DatabaseName::new(database)?)
                .await?;
        }
        Task::RemoveUser { user } => {
            lifecycle.remove_user(&db_hosts, &RoleName::new(user)?).await?;
        }
        Task::RemoveInstance { instance } => {
            lifecycle
                .remove_instance(&db_hosts, &InstanceName::new(instance)?)
                .await?;
        }
        Task::RenameInstance { current, new } => {
            lifecycle
                .rename_instance(
                    &db_hosts,
                    &InstanceName::new(current)?,
                    &InstanceName::new(new)?,
                )
                .await?;
        }
        Task::SetInstanceAuthorization { instance } => {
            let app_hosts = config.application_hosts()?;
            let outcomes = AuthorizationService::new(
                executor,
                postgres,
                Arc::new(config.authorization.clone()),
            )
            .set_instance_authorization(&db_hosts, &app_hosts, &InstanceName::new(instance)?)
            .await?;
            info!(?outcomes, "instance authorization finished");
        }
        Task::CallHttpAuthorization {
            user_id,
            instance_id,
        } => {
            let grant = AuthorizationGrant::new(
                NumericId::new(&user_id)?,
                NumericId::new(&instance_id)?,
                config.authorization.api_id,
            );
            AuthorizationService::new(executor, postgres, Arc::new(config.authorization.clone()))
                .call_http_authorization(&config.application_hosts()?, &grant)
                .await?;
            info!(
                user_id = %grant.user_id(),
                instance_id = %grant.instance_id(),
                "authorization posted"
            );
        }
        Task::CreateInstanceDb {
            instance,
            password,
            db_user,
            db_name,
        } => {
            let descriptor = instance_descriptor(instance, password, db_user, db_name)?;
            let reports = InstanceProvisioningService::new(executor, postgres.superuser.clone())
                .create_instance_db(&db_hosts, &descriptor)
                .await?;
            info!(?reports, "instance database provisioned");
        }
    }
    Ok(())
}

fn instance_descriptor(
    instance: String,
    password: String,
    db_user: Option<String>,
    db_name: Option<String>,
) -> Result<InstanceDescriptor, BoxError> {
    let name = InstanceName::new(instance)?;
    let role = db_user.map_or_else(|| RoleName::try_from(&name), RoleName::new)?;
    let database = db_name.map_or_else(|| DatabaseName::try_from(&name), DatabaseName::new)?;
    Ok(InstanceDescriptor::with_names(
        name,
        role,
        database,
        Password::new(password)?,
    ))
}

fn print_flag(flag: bool) -> io::Result<()> {
    writeln!(io::stdout().lock(), "{flag}")
}
