//! SQL script templates and their rendering context.

use std::collections::BTreeMap;
use std::fmt;

/// SQL templates rendered and executed as single-use remote scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlTemplate {
    /// Selects the role name if the role exists.
    CheckUserExists,
    /// Sets a role's password.
    SetUserPassword,
    /// Renames a database and the role of the same name.
    RenameDatabaseAndOwner,
    /// Deletes an instance and its authorizations from the target database.
    RemoveInstance,
    /// Renames an instance in the target database.
    RenameInstance,
}

impl SqlTemplate {
    /// All templates, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::CheckUserExists,
        Self::SetUserPassword,
        Self::RenameDatabaseAndOwner,
        Self::RemoveInstance,
        Self::RenameInstance,
    ];

    /// Returns the template file name.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::CheckUserExists => "check_user_exists.sql.jinja",
            Self::SetUserPassword => "set_user_password.sql.jinja",
            Self::RenameDatabaseAndOwner => "rename_database_and_owner.sql.jinja",
            Self::RemoveInstance => "remove_instance.sql.jinja",
            Self::RenameInstance => "rename_instance.sql.jinja",
        }
    }
}

impl fmt::Display for SqlTemplate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.file_name())
    }
}

/// Key/value context handed to the template renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptContext(BTreeMap<String, String>);

impl ScriptContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable, replacing any previous value for `key`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns a variable's value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterates variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}
