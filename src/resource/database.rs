use crate::db::{DbConnection, SqlProvider};
use anyhow::Result;
use converge::{ApplyContext, ApplyResult, Resource, ResourceState};
use std::sync::Arc;

/// A database that must exist on the configured SQL server
#[derive(Debug)]
pub struct Database {
    name: String,
    provider: Arc<dyn SqlProvider>,
    conn: DbConnection,
}

impl Database {
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn SqlProvider>,
        conn: DbConnection,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            conn,
        }
    }
}

impl Resource for Database {
    fn kind(&self) -> &'static str {
        "database"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!("create {} database {}", self.provider.engine(), self.name)
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.provider.database_exists(&self.conn, &self.name)? {
            Ok(ResourceState::Present { details: None })
        } else {
            Ok(ResourceState::Absent)
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        self.provider.create_database(&self.conn, &self.name)?;
        Ok(ApplyResult::Created)
    }
}

/// A database account that must exist
#[derive(Debug)]
pub struct DatabaseUser {
    user: String,
    password: String,
    provider: Arc<dyn SqlProvider>,
    conn: DbConnection,
}

impl DatabaseUser {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        provider: Arc<dyn SqlProvider>,
        conn: DbConnection,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            provider,
            conn,
        }
    }
}

impl Resource for DatabaseUser {
    fn kind(&self) -> &'static str {
        "database_user"
    }

    fn name(&self) -> String {
        self.user.clone()
    }

    fn description(&self) -> String {
        format!("create {} user {}", self.provider.engine(), self.user)
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.provider.user_exists(&self.conn, &self.user)? {
            Ok(ResourceState::Present { details: None })
        } else {
            Ok(ResourceState::Absent)
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        self.provider
            .create_user(&self.conn, &self.user, &self.password)?;
        Ok(ApplyResult::Created)
    }
}

/// Privileges for a user on a database
///
/// Checked before applying, so a converged grant is not re-issued on later
/// runs.
#[derive(Debug)]
pub struct DatabaseGrant {
    user: String,
    database: String,
    provider: Arc<dyn SqlProvider>,
    conn: DbConnection,
}

impl DatabaseGrant {
    pub fn new(
        user: impl Into<String>,
        database: impl Into<String>,
        provider: Arc<dyn SqlProvider>,
        conn: DbConnection,
    ) -> Self {
        Self {
            user: user.into(),
            database: database.into(),
            provider,
            conn,
        }
    }
}

impl Resource for DatabaseGrant {
    fn kind(&self) -> &'static str {
        "database_grant"
    }

    fn name(&self) -> String {
        format!("{}@{}", self.user, self.database)
    }

    fn description(&self) -> String {
        format!(
            "grant {} to {} on {}",
            self.provider.privileges().join(", "),
            self.user,
            self.database
        )
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.provider.has_grant(&self.conn, &self.user, &self.database)? {
            Ok(ResourceState::Present { details: None })
        } else {
            Ok(ResourceState::Absent)
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        self.provider.grant(&self.conn, &self.user, &self.database)?;
        Ok(ApplyResult::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::test_support::MockSql;

    fn conn() -> DbConnection {
        DbConnection {
            host: "db1".into(),
            username: "db_maker".into(),
            password: String::new(),
        }
    }

    #[test]
    fn test_database_created_once() {
        let sql = Arc::new(MockSql::default());
        let db = Database::new("identity", sql.clone(), conn());

        assert!(db.needs_apply().unwrap());
        db.apply(&mut ApplyContext::default()).unwrap();
        // Second inspection sees the created database.
        assert!(!db.needs_apply().unwrap());
        assert_eq!(sql.journal(), ["create_database identity on db1"]);
    }

    #[test]
    fn test_grant_not_reissued_when_present() {
        let sql = Arc::new(MockSql::default());
        let grant = DatabaseGrant::new("identity", "identity", sql.clone(), conn());
        assert_eq!(grant.name(), "identity@identity");

        assert!(grant.needs_apply().unwrap());
        grant.apply(&mut ApplyContext::default()).unwrap();
        assert!(!grant.needs_apply().unwrap());
    }

    #[test]
    fn test_user_creation_passes_password() {
        let sql = Arc::new(MockSql::default());
        let user = DatabaseUser::new("identity", "sekrit", sql.clone(), conn());
        user.apply(&mut ApplyContext::default()).unwrap();
        assert_eq!(sql.journal(), ["create_user identity on db1"]);
    }
}
