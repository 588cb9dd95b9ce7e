//! SQL backends behind a provider trait.
//!
//! The engine name in the node configuration selects a provider from the
//! registry. Each provider knows how to inspect and mutate its server
//! through the stock client tools, and how to build the connection URL the
//! rendered configuration file carries. The sqlite backend is deliberately
//! not a provider: it is a local file with no server to converge.

use crate::config::PlatformFamily;
use crate::system::run_capture;
use anyhow::Result;
use converge::ProviderRegistry;
use std::fmt;
use std::sync::Arc;

/// Connection parameters for the administrative account
#[derive(Debug, Clone)]
pub struct DbConnection {
    pub host: String,
    pub username: String,
    pub password: String,
}

/// Capability contract for a SQL server backend
pub trait SqlProvider: Send + Sync + fmt::Debug {
    /// Engine name, matches the configured `sql.engine`
    fn engine(&self) -> &'static str;

    /// Client library package for the configured platform
    fn client_package(&self, platform: PlatformFamily) -> &'static str;

    /// Privileges granted to the service account on its database
    fn privileges(&self) -> &'static [&'static str];

    fn database_exists(&self, conn: &DbConnection, database: &str) -> Result<bool>;

    fn create_database(&self, conn: &DbConnection, database: &str) -> Result<()>;

    fn user_exists(&self, conn: &DbConnection, user: &str) -> Result<bool>;

    fn create_user(&self, conn: &DbConnection, user: &str, password: &str) -> Result<()>;

    fn has_grant(&self, conn: &DbConnection, user: &str, database: &str) -> Result<bool>;

    fn grant(&self, conn: &DbConnection, user: &str, database: &str) -> Result<()>;

    /// Connection URL for the service account
    fn connection_url(&self, user: &str, password: &str, host: &str, database: &str) -> String;
}

const MYSQL_PRIVILEGES: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "INDEX", "ALTER",
];

const POSTGRESQL_PRIVILEGES: &[&str] = &["CREATE", "CONNECT", "TEMP"];

/// MySQL backend, driven through the `mysql` CLI
#[derive(Debug, Default)]
pub struct MysqlProvider;

impl MysqlProvider {
    fn query(&self, conn: &DbConnection, sql: &str) -> Result<String> {
        let mut args = vec!["-h", conn.host.as_str(), "-u", conn.username.as_str()];
        let password_arg;
        if !conn.password.is_empty() {
            password_arg = format!("-p{}", conn.password);
            args.push(password_arg.as_str());
        }
        args.extend(["-N", "-B", "-e", sql]);
        run_capture("mysql", &args, &[])
    }
}

impl SqlProvider for MysqlProvider {
    fn engine(&self) -> &'static str {
        "mysql"
    }

    fn client_package(&self, platform: PlatformFamily) -> &'static str {
        match platform {
            PlatformFamily::Debian => "python-mysqldb",
            PlatformFamily::Suse => "python-mysql",
        }
    }

    fn privileges(&self) -> &'static [&'static str] {
        MYSQL_PRIVILEGES
    }

    fn database_exists(&self, conn: &DbConnection, database: &str) -> Result<bool> {
        let out = self.query(conn, &format!("SHOW DATABASES LIKE '{database}'"))?;
        Ok(!out.is_empty())
    }

    fn create_database(&self, conn: &DbConnection, database: &str) -> Result<()> {
        log::info!("creating mysql database {database}");
        self.query(conn, &format!("CREATE DATABASE `{database}`"))?;
        Ok(())
    }

    fn user_exists(&self, conn: &DbConnection, user: &str) -> Result<bool> {
        let out = self.query(
            conn,
            &format!("SELECT COUNT(*) FROM mysql.user WHERE user = '{user}'"),
        )?;
        Ok(out.trim() != "0")
    }

    fn create_user(&self, conn: &DbConnection, user: &str, password: &str) -> Result<()> {
        log::info!("creating mysql user {user}");
        self.query(
            conn,
            &format!("CREATE USER '{user}'@'%' IDENTIFIED BY '{password}'"),
        )?;
        Ok(())
    }

    fn has_grant(&self, conn: &DbConnection, user: &str, database: &str) -> Result<bool> {
        let out = self.query(
            conn,
            &format!(
                "SELECT COUNT(*) FROM information_schema.SCHEMA_PRIVILEGES \
                 WHERE GRANTEE = \"'{user}'@'%'\" AND TABLE_SCHEMA = '{database}'"
            ),
        )?;
        Ok(out.trim() != "0")
    }

    fn grant(&self, conn: &DbConnection, user: &str, database: &str) -> Result<()> {
        log::info!("granting mysql privileges on {database} to {user}");
        let privs = self.privileges().join(", ");
        self.query(
            conn,
            &format!("GRANT {privs} ON `{database}`.* TO '{user}'@'%'"),
        )?;
        Ok(())
    }

    fn connection_url(&self, user: &str, password: &str, host: &str, database: &str) -> String {
        format!("mysql://{user}:{password}@{host}/{database}")
    }
}

/// PostgreSQL backend, driven through `psql`
#[derive(Debug, Default)]
pub struct PostgresqlProvider;

impl PostgresqlProvider {
    fn query(&self, conn: &DbConnection, sql: &str) -> Result<String> {
        run_capture(
            "psql",
            &[
                "-h",
                conn.host.as_str(),
                "-U",
                conn.username.as_str(),
                "-d",
                "postgres",
                "-t",
                "-A",
                "-c",
                sql,
            ],
            &[("PGPASSWORD", conn.password.as_str())],
        )
    }
}

impl SqlProvider for PostgresqlProvider {
    fn engine(&self) -> &'static str {
        "postgresql"
    }

    fn client_package(&self, _platform: PlatformFamily) -> &'static str {
        "python-psycopg2"
    }

    fn privileges(&self) -> &'static [&'static str] {
        POSTGRESQL_PRIVILEGES
    }

    fn database_exists(&self, conn: &DbConnection, database: &str) -> Result<bool> {
        let out = self.query(
            conn,
            &format!("SELECT 1 FROM pg_database WHERE datname = '{database}'"),
        )?;
        Ok(!out.is_empty())
    }

    fn create_database(&self, conn: &DbConnection, database: &str) -> Result<()> {
        log::info!("creating postgresql database {database}");
        self.query(conn, &format!("CREATE DATABASE \"{database}\""))?;
        Ok(())
    }

    fn user_exists(&self, conn: &DbConnection, user: &str) -> Result<bool> {
        let out = self.query(
            conn,
            &format!("SELECT 1 FROM pg_roles WHERE rolname = '{user}'"),
        )?;
        Ok(!out.is_empty())
    }

    fn create_user(&self, conn: &DbConnection, user: &str, password: &str) -> Result<()> {
        log::info!("creating postgresql role {user}");
        self.query(
            conn,
            &format!("CREATE ROLE \"{user}\" LOGIN PASSWORD '{password}'"),
        )?;
        Ok(())
    }

    fn has_grant(&self, conn: &DbConnection, user: &str, database: &str) -> Result<bool> {
        let out = self.query(
            conn,
            &format!("SELECT has_database_privilege('{user}', '{database}', 'CONNECT')"),
        )?;
        Ok(out.trim() == "t")
    }

    fn grant(&self, conn: &DbConnection, user: &str, database: &str) -> Result<()> {
        log::info!("granting postgresql privileges on {database} to {user}");
        let privs = self.privileges().join(", ");
        self.query(
            conn,
            &format!("GRANT {privs} ON DATABASE \"{database}\" TO \"{user}\""),
        )?;
        Ok(())
    }

    fn connection_url(&self, user: &str, password: &str, host: &str, database: &str) -> String {
        format!("postgresql://{user}:{password}@{host}/{database}")
    }
}

/// Registry of the server-backed SQL engines
pub fn registry() -> ProviderRegistry<dyn SqlProvider> {
    let mut registry: ProviderRegistry<dyn SqlProvider> = ProviderRegistry::new("sql engine");
    registry.register("mysql", Arc::new(MysqlProvider));
    registry.register("postgresql", Arc::new(PostgresqlProvider));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_connection_url() {
        let url = MysqlProvider.connection_url("identity", "pw", "192.168.124.82", "identity");
        assert_eq!(url, "mysql://identity:pw@192.168.124.82/identity");
    }

    #[test]
    fn test_postgresql_connection_url() {
        let url = PostgresqlProvider.connection_url("identity", "pw", "db1", "identity");
        assert_eq!(url, "postgresql://identity:pw@db1/identity");
    }

    #[test]
    fn test_privilege_sets() {
        assert_eq!(MysqlProvider.privileges().len(), 8);
        assert!(MysqlProvider.privileges().contains(&"INDEX"));
        assert_eq!(
            PostgresqlProvider.privileges(),
            &["CREATE", "CONNECT", "TEMP"]
        );
    }

    #[test]
    fn test_registry_resolves_known_engines() {
        let registry = registry();
        assert_eq!(registry.resolve("mysql").unwrap().engine(), "mysql");
        assert_eq!(
            registry.resolve("postgresql").unwrap().engine(),
            "postgresql"
        );
    }

    #[test]
    fn test_registry_rejects_unknown_engine() {
        let err = registry().resolve("oracle").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("sql engine"));
        assert!(message.contains("oracle"));
    }

    #[test]
    fn test_client_packages_by_platform() {
        assert_eq!(
            MysqlProvider.client_package(PlatformFamily::Debian),
            "python-mysqldb"
        );
        assert_eq!(
            MysqlProvider.client_package(PlatformFamily::Suse),
            "python-mysql"
        );
        assert_eq!(
            PostgresqlProvider.client_package(PlatformFamily::Suse),
            "python-psycopg2"
        );
    }
}
