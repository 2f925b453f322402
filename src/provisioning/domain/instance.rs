//! Deployment instance descriptor used to provision its database.

use super::{DatabaseName, InstanceName, Password, ProvisioningDomainError, RoleName};

/// Database credentials and names belonging to one deployment instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDescriptor {
    name: InstanceName,
    db_user: RoleName,
    db_name: DatabaseName,
    db_password: Password,
}

impl InstanceDescriptor {
    /// Creates a descriptor whose database and owning role are the lowercased
    /// instance name.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningDomainError`] when the instance name is not a
    /// valid database identifier (for example `fr-idf`); use
    /// [`Self::with_names`] for those instances.
    pub fn new(name: InstanceName, db_password: Password) -> Result<Self, ProvisioningDomainError> {
        Ok(Self {
            db_user: RoleName::try_from(&name)?,
            db_name: DatabaseName::try_from(&name)?,
            name,
            db_password,
        })
    }

    /// Creates a descriptor with explicit role and database names.
    #[must_use]
    pub const fn with_names(
        name: InstanceName,
        db_user: RoleName,
        db_name: DatabaseName,
        db_password: Password,
    ) -> Self {
        Self {
            name,
            db_user,
            db_name,
            db_password,
        }
    }

    /// Overrides the owning role.
    #[must_use]
    pub fn with_db_user(mut self, db_user: RoleName) -> Self {
        self.db_user = db_user;
        self
    }

    /// Overrides the database name.
    #[must_use]
    pub fn with_db_name(mut self, db_name: DatabaseName) -> Self {
        self.db_name = db_name;
        self
    }

    /// Returns the instance name.
    #[must_use]
    pub const fn name(&self) -> &InstanceName {
        &self.name
    }

    /// Returns the role owning the instance database.
    #[must_use]
    pub const fn db_user(&self) -> &RoleName {
        &self.db_user
    }

    /// Returns the instance database name.
    #[must_use]
    pub const fn db_name(&self) -> &DatabaseName {
        &self.db_name
    }

    /// Returns the owning role's password.
    #[must_use]
    pub const fn db_password(&self) -> &Password {
        &self.db_password
    }
}
