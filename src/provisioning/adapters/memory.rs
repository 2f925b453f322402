//! In-memory PostgreSQL cluster simulator for provisioning tests.
//!
//! The simulator implements [`RemoteExecutor`] by interpreting the command
//! lines the provisioning services emit (`psql`, `createuser`, `createdb`,
//! `dropdb`, `dropuser`, `rm`, `curl`) against an in-memory model of roles,
//! databases, PostGIS state, and application records. It records every
//! command so tests can assert on what was sent to which host.

use crate::provisioning::{
    domain::Host,
    ports::{RemoteExecutor, RemoteExecutorError, RemoteExecutorResult},
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

const DEFAULT_VERSION: &str = "9.3.2";
const DEFAULT_SUPERUSER: &str = "postgres";
const DEFAULT_DATABASE: &str = "postgres";

/// A command received by the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    /// Host the command was sent to.
    pub host: Host,
    /// Privileged user for `run_as`, `None` for the login user.
    pub user: Option<String>,
    /// Command line as submitted.
    pub command: String,
}

/// Snapshot of a simulated database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatedDatabase {
    /// Owning role.
    pub owner: String,
    /// Character encoding.
    pub encoding: String,
    /// Whether the PostGIS `geography` type exists.
    pub postgis: bool,
    /// Whether `spatial_ref_sys.sql` has been loaded.
    pub spatial_ref_sys: bool,
    /// Rows of the application `instance` table, name to id.
    pub instances: BTreeMap<String, String>,
    /// Rows of the application `key` table, token to user id.
    pub api_keys: BTreeMap<String, String>,
    /// Rows of the application `"authorization"` table as
    /// `(user_id, instance_id)`.
    pub authorizations: BTreeSet<(String, String)>,
}

#[derive(Debug)]
struct ClusterState {
    version: String,
    superuser: String,
    roles: BTreeMap<String, Option<String>>,
    databases: BTreeMap<String, SimulatedDatabase>,
    files: BTreeMap<(Host, String), String>,
    commands: Vec<RecordedCommand>,
    uploads: Vec<(Host, String)>,
    failures: Vec<String>,
}

impl Default for ClusterState {
    fn default() -> Self {
        let superuser = DEFAULT_SUPERUSER.to_owned();
        let databases = ["postgres", "template0", "template1"]
            .into_iter()
            .map(|name| {
                (
                    name.to_owned(),
                    SimulatedDatabase {
                        owner: superuser.clone(),
                        encoding: "UTF8".to_owned(),
                        ..SimulatedDatabase::default()
                    },
                )
            })
            .collect();
        Self {
            version: DEFAULT_VERSION.to_owned(),
            roles: BTreeMap::from([(superuser.clone(), None)]),
            superuser,
            databases,
            files: BTreeMap::new(),
            commands: Vec::new(),
            uploads: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// In-memory PostgreSQL cluster reachable from any host.
///
/// Files are stored per host; roles and databases are shared, as if every
/// host talked to the same server.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPostgresCluster {
    state: Arc<RwLock<ClusterState>>,
}

impl InMemoryPostgresCluster {
    /// Creates a cluster running PostgreSQL 9.3.2 with the default
    /// `postgres`, `template0`, and `template1` databases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the version reported by `psql --version`.
    #[must_use]
    pub fn with_version(self, version: impl Into<String>) -> Self {
        self.write().version = version.into();
        self
    }

    /// Seeds a row in the `instance` table of `database`, creating the
    /// database if needed.
    pub fn add_instance_record(&self, database: &str, name: &str, id: &str) {
        self.write()
            .database_entry(database)
            .instances
            .insert(name.to_owned(), id.to_owned());
    }

    /// Seeds a row in the `key` table of `database`, creating the database if
    /// needed.
    pub fn add_api_key(&self, database: &str, token: &str, user_id: &str) {
        self.write()
            .database_entry(database)
            .api_keys
            .insert(token.to_owned(), user_id.to_owned());
    }

    /// Seeds a row in the `"authorization"` table of `database`, creating the
    /// database if needed.
    pub fn add_authorization(&self, database: &str, user_id: &str, instance_id: &str) {
        self.write()
            .database_entry(database)
            .authorizations
            .insert((user_id.to_owned(), instance_id.to_owned()));
    }

    /// Makes every later command containing `fragment` fail.
    pub fn fail_commands_containing(&self, fragment: impl Into<String>) {
        self.write().failures.push(fragment.into());
    }

    /// Returns every command received so far, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.read().commands.clone()
    }

    /// Counts received commands containing `fragment`.
    #[must_use]
    pub fn count_commands_containing(&self, fragment: &str) -> usize {
        self.read()
            .commands
            .iter()
            .filter(|recorded| recorded.command.contains(fragment))
            .count()
    }

    /// Returns `(host, path)` for every upload received so far.
    #[must_use]
    pub fn uploads(&self) -> Vec<(Host, String)> {
        self.read().uploads.clone()
    }

    /// Returns whether `path` currently exists on `host`.
    #[must_use]
    pub fn has_file(&self, host: &Host, path: &str) -> bool {
        self.read()
            .files
            .contains_key(&(host.clone(), path.to_owned()))
    }

    /// Returns whether a role exists.
    #[must_use]
    pub fn has_role(&self, name: &str) -> bool {
        self.read().roles.contains_key(name)
    }

    /// Returns a role's password, `None` when the role is missing or has no
    /// password.
    #[must_use]
    pub fn role_password(&self, name: &str) -> Option<String> {
        self.read().roles.get(name).cloned().flatten()
    }

    /// Returns a snapshot of a database.
    #[must_use]
    pub fn database(&self, name: &str) -> Option<SimulatedDatabase> {
        self.read().databases.get(name).cloned()
    }

    fn read(&self) -> RwLockReadGuard<'_, ClusterState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ClusterState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn execute(&self, host: &Host, user: Option<&str>, command: &str) -> RemoteExecutorResult<String> {
        let mut state = self.write();
        state.commands.push(RecordedCommand {
            host: host.clone(),
            user: user.map(ToOwned::to_owned),
            command: command.to_owned(),
        });

        let failure = |message: String, status: i32| RemoteExecutorError::CommandFailed {
            host: host.clone(),
            command: command.to_owned(),
            status: Some(status),
            stderr: message,
        };

        if state
            .failures
            .iter()
            .any(|fragment| command.contains(fragment.as_str()))
        {
            return Err(failure("injected failure".to_owned(), 1));
        }

        let privileged = user.is_some_and(|name| name == state.superuser);
        let invocation = Invocation::parse(command).map_err(|message| failure(message, 2))?;
        state
            .interpret(host, privileged, &invocation)
            .map_err(|message| failure(message, 1))
    }
}

#[async_trait]
impl RemoteExecutor for InMemoryPostgresCluster {
    async fn run(&self, host: &Host, command: &str) -> RemoteExecutorResult<String> {
        self.execute(host, None, command)
    }

    async fn run_as(&self, host: &Host, user: &str, command: &str) -> RemoteExecutorResult<String> {
        self.execute(host, Some(user), command)
    }

    async fn upload(
        &self,
        host: &Host,
        path: &str,
        contents: &str,
        _owner: &str,
    ) -> RemoteExecutorResult<()> {
        let mut state = self.write();
        if state.failures.iter().any(|fragment| path.contains(fragment.as_str())) {
            return Err(RemoteExecutorError::CommandFailed {
                host: host.clone(),
                command: format!("upload {path}"),
                status: Some(1),
                stderr: "injected failure".to_owned(),
            });
        }
        state.uploads.push((host.clone(), path.to_owned()));
        state
            .files
            .insert((host.clone(), path.to_owned()), contents.to_owned());
        Ok(())
    }
}

/// A tokenized command line with leading environment assignments split off.
#[derive(Debug)]
struct Invocation {
    environment: BTreeMap<String, String>,
    program: String,
    arguments: Vec<String>,
}

impl Invocation {
    fn parse(command: &str) -> Result<Self, String> {
        let mut tokens = tokenize(command)?.into_iter().peekable();
        let mut environment = BTreeMap::new();
        while let Some((key, value)) = tokens.peek().and_then(|token| {
            token
                .split_once('=')
                .filter(|(key, _)| is_variable_name(key))
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
        }) {
            environment.insert(key, value);
            tokens.next();
        }
        let program = tokens.next().ok_or_else(|| "empty command".to_owned())?;
        Ok(Self {
            environment,
            program,
            arguments: tokens.collect(),
        })
    }

    fn positional(&self) -> Option<&str> {
        self.arguments
            .iter()
            .find(|argument| !argument.starts_with('-'))
            .map(String::as_str)
    }

    fn option(&self, prefix: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find_map(|argument| argument.strip_prefix(prefix))
    }
}

fn is_variable_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|character| character.is_ascii_uppercase() || character == '_')
}

/// Splits a POSIX shell command line into words, honouring single quotes,
/// double quotes, and backslash escapes.
fn tokenize(command: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut characters = command.chars();

    while let Some(character) = characters.next() {
        match character {
            '\'' => {
                in_token = true;
                loop {
                    match characters.next() {
                        Some('\'') => break,
                        Some(quoted) => current.push(quoted),
                        None => return Err("unterminated single quote".to_owned()),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match characters.next() {
                        Some('"') => break,
                        Some('\\') => match characters.next() {
                            Some(escaped @ ('"' | '\\' | '$' | '`')) => current.push(escaped),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return Err("unterminated double quote".to_owned()),
                        },
                        Some(quoted) => current.push(quoted),
                        None => return Err("unterminated double quote".to_owned()),
                    }
                }
            }
            '\\' => {
                in_token = true;
                if let Some(escaped) = characters.next() {
                    current.push(escaped);
                }
            }
            whitespace if whitespace.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            other => {
                in_token = true;
                current.push(other);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Parsed `psql` command-line options.
#[derive(Debug, Default)]
struct PsqlOptions {
    version: bool,
    unaligned: bool,
    on_error_stop: bool,
    command: Option<String>,
    database: Option<String>,
    file: Option<String>,
    input: Option<String>,
    username: Option<String>,
}

impl PsqlOptions {
    fn parse(arguments: &[String]) -> Self {
        let mut options = Self::default();
        let mut iter = arguments.iter();
        while let Some(argument) = iter.next() {
            match argument.as_str() {
                "--version" => options.version = true,
                "-A" => options.unaligned = true,
                "-t" | "--tuples-only" => {}
                "-c" => options.command = iter.next().cloned(),
                "--file" => options.file = iter.next().cloned(),
                "--username" => options.username = iter.next().cloned(),
                "--host" => {
                    iter.next();
                }
                "--set" => {
                    if iter.next().is_some_and(|value| value == "ON_ERROR_STOP=1") {
                        options.on_error_stop = true;
                    }
                }
                "<" => options.input = iter.next().cloned(),
                other => {
                    if let Some(command) = other.strip_prefix("--command=") {
                        options.command = Some(command.to_owned());
                    } else if let Some(database) = other.strip_prefix("--dbname=") {
                        options.database = Some(database.to_owned());
                    } else if !other.starts_with('-') {
                        options.database = Some(other.to_owned());
                    }
                }
            }
        }
        options
    }
}

impl ClusterState {
    fn database_entry(&mut self, name: &str) -> &mut SimulatedDatabase {
        let owner = self.superuser.clone();
        self.databases
            .entry(name.to_owned())
            .or_insert_with(|| SimulatedDatabase {
                owner,
                encoding: "UTF8".to_owned(),
                ..SimulatedDatabase::default()
            })
    }

    fn interpret(
        &mut self,
        host: &Host,
        privileged: bool,
        invocation: &Invocation,
    ) -> Result<String, String> {
        match invocation.program.as_str() {
            "psql" => self.psql(host, privileged, invocation),
            "createuser" => {
                require_privilege(privileged)?;
                let name = invocation
                    .positional()
                    .ok_or_else(|| "createuser: missing role name".to_owned())?;
                self.create_role(name, None)?;
                Ok(String::new())
            }
            "createdb" => {
                require_privilege(privileged)?;
                self.createdb(invocation)?;
                Ok(String::new())
            }
            "dropdb" => {
                require_privilege(privileged)?;
                let name = invocation
                    .positional()
                    .ok_or_else(|| "dropdb: missing database name".to_owned())?;
                self.databases
                    .remove(name)
                    .map(|_| String::new())
                    .ok_or_else(|| format!("database \"{name}\" does not exist"))
            }
            "dropuser" => {
                require_privilege(privileged)?;
                let name = invocation
                    .positional()
                    .ok_or_else(|| "dropuser: missing role name".to_owned())?;
                self.drop_role(name)?;
                Ok(String::new())
            }
            "rm" => {
                if let Some(path) = invocation.positional() {
                    self.files.remove(&(host.clone(), path.to_owned()));
                }
                Ok(String::new())
            }
            "curl" => Ok("{}".to_owned()),
            other => Err(format!("{other}: command not found")),
        }
    }

    fn createdb(&mut self, invocation: &Invocation) -> Result<(), String> {
        let name = invocation
            .positional()
            .ok_or_else(|| "createdb: missing database name".to_owned())?;
        let owner = invocation
            .option("--owner=")
            .unwrap_or(self.superuser.as_str())
            .to_owned();
        let encoding = invocation.option("--encoding=").unwrap_or("SQL_ASCII");
        if !self.roles.contains_key(&owner) {
            return Err(format!("role \"{owner}\" does not exist"));
        }
        if self.databases.contains_key(name) {
            return Err(format!("database \"{name}\" already exists"));
        }
        self.databases.insert(
            name.to_owned(),
            SimulatedDatabase {
                owner,
                encoding: encoding.to_owned(),
                ..SimulatedDatabase::default()
            },
        );
        Ok(())
    }

    fn create_role(&mut self, name: &str, password: Option<String>) -> Result<(), String> {
        if self.roles.contains_key(name) {
            return Err(format!("role \"{name}\" already exists"));
        }
        self.roles.insert(name.to_owned(), password);
        Ok(())
    }

    fn drop_role(&mut self, name: &str) -> Result<(), String> {
        if !self.roles.contains_key(name) {
            return Err(format!("role \"{name}\" does not exist"));
        }
        if self.databases.values().any(|database| database.owner == name) {
            return Err(format!(
                "role \"{name}\" cannot be dropped because some objects depend on it"
            ));
        }
        self.roles.remove(name);
        Ok(())
    }

    fn psql(
        &mut self,
        host: &Host,
        privileged: bool,
        invocation: &Invocation,
    ) -> Result<String, String> {
        let options = PsqlOptions::parse(&invocation.arguments);
        if options.version {
            return Ok(format!("psql (PostgreSQL) {}\n", self.version));
        }

        match &options.username {
            Some(username) => {
                let supplied = invocation.environment.get("PGPASSWORD");
                let stored = self.roles.get(username).cloned().flatten();
                if stored.is_none() || supplied != stored.as_ref() {
                    return Err(format!(
                        "FATAL:  password authentication failed for user \"{username}\""
                    ));
                }
            }
            None => require_privilege(privileged)?,
        }

        let database = options
            .database
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE.to_owned());
        if !self.databases.contains_key(&database) {
            return Err(format!("FATAL:  database \"{database}\" does not exist"));
        }

        if let Some(file) = &options.file {
            self.load_postgis_file(&database, file)?;
            return Ok(String::new());
        }

        let (sql, from_script) = match (&options.command, &options.input) {
            (Some(command), _) => (command.clone(), false),
            (None, Some(path)) => (
                self.files
                    .get(&(host.clone(), path.clone()))
                    .cloned()
                    .ok_or_else(|| format!("{path}: No such file or directory"))?,
                true,
            ),
            (None, None) => return Err("psql: no input".to_owned()),
        };

        let mut rows = Vec::new();
        for statement in split_statements(&sql) {
            match self.statement(&database, &statement) {
                Ok(result) => rows.extend(result),
                Err(message) if from_script && !options.on_error_stop => {
                    tracing::debug!(error = %message, "ignoring script error");
                }
                Err(message) => return Err(format!("ERROR:  {message}")),
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                if options.unaligned {
                    format!("{row}\n")
                } else {
                    format!(" {row}\n")
                }
            })
            .collect())
    }

    fn load_postgis_file(&mut self, database: &str, file: &str) -> Result<(), String> {
        let entry = self.database_entry(database);
        match file.rsplit('/').next() {
            Some("postgis.sql") => {
                if entry.postgis {
                    return Err("ERROR:  type \"geography\" already exists".to_owned());
                }
                entry.postgis = true;
                Ok(())
            }
            Some("spatial_ref_sys.sql") => {
                entry.spatial_ref_sys = true;
                Ok(())
            }
            _ => Err(format!("{file}: No such file or directory")),
        }
    }

    fn statement(&mut self, database: &str, statement: &str) -> Result<Vec<String>, String> {
        let normalized = statement
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();
        let words: Vec<&str> = normalized.split(' ').collect();
        let literals = string_literals(statement);
        let first_literal = || {
            literals
                .first()
                .cloned()
                .ok_or_else(|| format!("syntax error in \"{statement}\""))
        };

        if normalized.starts_with("select exists (select * from pg_user where usename=") {
            return Ok(vec![boolean(self.roles.contains_key(&first_literal()?))]);
        }
        if normalized.starts_with("select exists (select * from pg_database where datname=") {
            return Ok(vec![boolean(self.databases.contains_key(&first_literal()?))]);
        }
        if normalized == "select exists (select 1 from pg_type where typname = 'geography')" {
            let postgis = self
                .databases
                .get(database)
                .is_some_and(|entry| entry.postgis);
            return Ok(vec![boolean(postgis)]);
        }
        if normalized.starts_with("select usename from pg_catalog.pg_user where usename =") {
            let name = first_literal()?;
            return Ok(self
                .roles
                .contains_key(&name)
                .then_some(name)
                .into_iter()
                .collect());
        }
        if normalized == "select * from pg_catalog.pg_database" {
            return Ok(self.databases.keys().cloned().collect());
        }
        if normalized.starts_with("select id from instance where name =") {
            let name = first_literal()?;
            return Ok(self
                .database_entry(database)
                .instances
                .get(&name)
                .cloned()
                .into_iter()
                .collect());
        }
        if normalized.starts_with("select user_id from key where token =") {
            let token = first_literal()?;
            return Ok(self
                .database_entry(database)
                .api_keys
                .get(&token)
                .cloned()
                .into_iter()
                .collect());
        }
        if normalized == "create extension if not exists postgis" {
            self.database_entry(database).postgis = true;
            return Ok(Vec::new());
        }

        match words.as_slice() {
            ["alter", "user", name, "with", "encrypted", "password", ..] => {
                let password = first_literal()?;
                let role = self
                    .roles
                    .get_mut(*name)
                    .ok_or_else(|| format!("role \"{name}\" does not exist"))?;
                *role = Some(password);
                Ok(Vec::new())
            }
            ["alter", "database", current, "rename", "to", new] => {
                if *current == database {
                    return Err("current database cannot be renamed".to_owned());
                }
                if self.databases.contains_key(*new) {
                    return Err(format!("database \"{new}\" already exists"));
                }
                let entry = self
                    .databases
                    .remove(*current)
                    .ok_or_else(|| format!("database \"{current}\" does not exist"))?;
                self.databases.insert((*new).to_owned(), entry);
                Ok(Vec::new())
            }
            ["alter", "user", current, "rename", "to", new] => {
                if self.roles.contains_key(*new) {
                    return Err(format!("role \"{new}\" already exists"));
                }
                let password = self
                    .roles
                    .remove(*current)
                    .ok_or_else(|| format!("role \"{current}\" does not exist"))?;
                self.roles.insert((*new).to_owned(), password);
                for entry in self.databases.values_mut() {
                    if entry.owner == *current {
                        entry.owner = (*new).to_owned();
                    }
                }
                Ok(Vec::new())
            }
            ["create", "user", name, ..] if normalized.contains(" password ") => {
                let password = first_literal()?;
                self.create_role(name, Some(password))?;
                Ok(Vec::new())
            }
            ["delete", "from", "authorization", ..] => {
                Err("syntax error at or near \"authorization\"".to_owned())
            }
            ["delete", "from", "\"authorization\"", "where", "instance_id", "in", ..] => {
                let name = first_literal()?;
                let entry = self.database_entry(database);
                if let Some(id) = entry.instances.get(&name).cloned() {
                    entry
                        .authorizations
                        .retain(|(_, instance_id)| *instance_id != id);
                }
                Ok(Vec::new())
            }
            ["delete", "from", "instance", "where", "name", "=", ..] => {
                let name = first_literal()?;
                self.database_entry(database).instances.remove(&name);
                Ok(Vec::new())
            }
            ["update", "instance", "set", "name", "=", ..] => {
                let (new, current) = match literals.as_slice() {
                    [new, current] => (new.clone(), current.clone()),
                    _ => return Err(format!("syntax error in \"{statement}\"")),
                };
                let instances = &mut self.database_entry(database).instances;
                if let Some(id) = instances.remove(&current) {
                    instances.insert(new, id);
                }
                Ok(Vec::new())
            }
            _ => Err(format!("syntax error in \"{statement}\"")),
        }
    }
}

fn require_privilege(privileged: bool) -> Result<(), String> {
    if privileged {
        Ok(())
    } else {
        Err("FATAL:  role \"root\" does not exist".to_owned())
    }
}

fn boolean(value: bool) -> String {
    if value { "t" } else { "f" }.to_owned()
}

/// Splits SQL text on semicolons outside string literals.
fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_literal = false;
    for character in sql.chars() {
        match character {
            '\'' => {
                in_literal = !in_literal;
                current.push(character);
            }
            ';' if !in_literal => {
                statements.push(std::mem::take(&mut current));
            }
            _ => current.push(character),
        }
    }
    statements.push(current);
    statements
        .into_iter()
        .map(|statement| statement.trim().to_owned())
        .filter(|statement| !statement.is_empty())
        .collect()
}

/// Extracts single-quoted SQL literals, undoubling embedded quotes.
fn string_literals(statement: &str) -> Vec<String> {
    let mut literals = Vec::new();
    let mut characters = statement.chars().peekable();
    while let Some(character) = characters.next() {
        if character != '\'' {
            continue;
        }
        let mut literal = String::new();
        while let Some(inner) = characters.next() {
            if inner == '\'' {
                if characters.peek() == Some(&'\'') {
                    characters.next();
                    literal.push('\'');
                } else {
                    break;
                }
            } else {
                literal.push(inner);
            }
        }
        literals.push(literal);
    }
    literals
}
