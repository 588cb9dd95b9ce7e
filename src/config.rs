//! Node configuration for the identity service.
//!
//! The declared state of a node lives in a TOML file; every field has a
//! default so a minimal file only needs to override what differs (typically
//! the SQL engine, the admin token and the account passwords).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// OS platform family, used to resolve package and service names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    #[default]
    Debian,
    Suse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub platform: PlatformFamily,
    pub debug: bool,
    pub verbose: bool,
    pub use_syslog: bool,
    pub sql: SqlConfig,
    pub db: DbConfig,
    pub api: ApiConfig,
    pub admin: AccountConfig,
    #[serde(rename = "default")]
    pub default_account: AccountConfig,
    pub service: ServiceConfig,
    /// Roles registered on every run
    pub roles: Vec<String>,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    /// SQL backend: mysql, postgresql or sqlite
    pub engine: String,
    /// Database cluster instance, scopes the inventory search
    pub instance: String,
    pub idle_timeout: u32,
    pub min_pool_size: u32,
    pub max_pool_size: u32,
    pub pool_timeout: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub database: String,
    pub user: String,
    /// Administrative account used to create the database and grants
    pub maker_user: String,
    pub maker_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub service_port: u16,
    pub service_host: String,
    pub admin_port: u16,
    pub admin_host: String,
    pub public_port: u16,
    pub public_host: String,
}

/// A seeded account: tenant plus the user created inside it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub tenant: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Tenant reserved for service accounts
    pub tenant: String,
    /// Admin bearer token for the registration API
    pub token: String,
    /// Catalog entry name
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub description: String,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Rendered configuration file
    pub config_file: PathBuf,
    /// Local database file for the sqlite backend
    pub sqlite_file: PathBuf,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            platform: PlatformFamily::Debian,
            debug: false,
            verbose: false,
            use_syslog: false,
            sql: SqlConfig::default(),
            db: DbConfig::default(),
            api: ApiConfig::default(),
            admin: AccountConfig {
                tenant: "admin".into(),
                username: "admin".into(),
                password: "changeme".into(),
            },
            default_account: AccountConfig::default(),
            service: ServiceConfig::default(),
            roles: [
                "admin",
                "member",
                "identity-admin",
                "identity-service-admin",
                "sysadmin",
                "netadmin",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            engine: "sqlite".into(),
            instance: "default".into(),
            idle_timeout: 30,
            min_pool_size: 5,
            max_pool_size: 10,
            pool_timeout: 200,
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database: "identity".into(),
            user: "identity".into(),
            maker_user: "db_maker".into(),
            maker_password: String::new(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            service_port: 5000,
            service_host: "0.0.0.0".into(),
            admin_port: 35357,
            admin_host: "0.0.0.0".into(),
            public_port: 5000,
            public_host: "0.0.0.0".into(),
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            tenant: "default".into(),
            username: "demo".into(),
            password: "changeme".into(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            tenant: "service".into(),
            token: String::new(),
            name: "identity".into(),
            service_type: "identity".into(),
            description: "Identity Service".into(),
            region: "RegionOne".into(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("/etc/identity/identity.conf"),
            sqlite_file: PathBuf::from("/var/lib/identity/identity.db"),
        }
    }
}

impl NodeConfig {
    /// Load node configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Server package name for the configured platform
    pub fn server_package(&self) -> &'static str {
        match self.platform {
            PlatformFamily::Debian => "identity-server",
            PlatformFamily::Suse => "openstack-identity-server",
        }
    }

    /// Service unit name for the configured platform
    pub fn server_service(&self) -> &'static str {
        match self.platform {
            PlatformFamily::Debian => "identity",
            PlatformFamily::Suse => "openstack-identity",
        }
    }

    /// Tenants seeded on every run
    pub fn seed_tenants(&self) -> Vec<String> {
        vec![
            self.admin.tenant.clone(),
            self.service.tenant.clone(),
            self.default_account.tenant.clone(),
        ]
    }

    /// Users seeded on every run: (name, password, tenant)
    pub fn seed_users(&self) -> Vec<(String, String, String)> {
        vec![
            (
                self.admin.username.clone(),
                self.admin.password.clone(),
                self.admin.tenant.clone(),
            ),
            (
                self.default_account.username.clone(),
                self.default_account.password.clone(),
                self.default_account.tenant.clone(),
            ),
        ]
    }

    /// Role assignments seeded on every run: (user, role, tenant)
    ///
    /// The admin user administers both its own tenant and the default
    /// tenant; the default user gets the operator roles in its tenant.
    pub fn seed_access(&self) -> Vec<(String, String, String)> {
        let admin = &self.admin;
        let user = &self.default_account;
        vec![
            (admin.username.clone(), "admin".into(), admin.tenant.clone()),
            (
                admin.username.clone(),
                "identity-admin".into(),
                admin.tenant.clone(),
            ),
            (
                admin.username.clone(),
                "identity-service-admin".into(),
                admin.tenant.clone(),
            ),
            (admin.username.clone(), "admin".into(), user.tenant.clone()),
            (user.username.clone(), "member".into(), user.tenant.clone()),
            (user.username.clone(), "sysadmin".into(), user.tenant.clone()),
            (user.username.clone(), "netadmin".into(), user.tenant.clone()),
        ]
    }

    /// EC2 credential pairs seeded on every run: (user, tenant)
    pub fn seed_ec2(&self) -> Vec<(String, String)> {
        vec![
            (self.admin.username.clone(), self.admin.tenant.clone()),
            (
                self.admin.username.clone(),
                self.default_account.tenant.clone(),
            ),
            (
                self.default_account.username.clone(),
                self.default_account.tenant.clone(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_config() {
        let config: NodeConfig = toml::from_str("").unwrap();
        assert_eq!(config.sql.engine, "sqlite");
        assert_eq!(config.api.admin_port, 35357);
        assert_eq!(config.service.region, "RegionOne");
        assert_eq!(config.platform, PlatformFamily::Debian);
    }

    #[test]
    fn test_partial_override() {
        let config: NodeConfig = toml::from_str(
            r#"
            platform = "suse"

            [sql]
            engine = "mysql"

            [service]
            token = "sekrit"
            "#,
        )
        .unwrap();
        assert_eq!(config.sql.engine, "mysql");
        assert_eq!(config.service.token, "sekrit");
        // Platform renames both the package and the service unit.
        assert_eq!(config.server_package(), "openstack-identity-server");
        assert_eq!(config.server_service(), "openstack-identity");
        // Untouched sections keep their defaults.
        assert_eq!(config.db.database, "identity");
    }

    #[test]
    fn test_seed_access_covers_both_accounts() {
        let config = NodeConfig::default();
        let access = config.seed_access();
        assert_eq!(access.len(), 7);
        assert_eq!(access[0].0, config.admin.username);
        assert!(
            access
                .iter()
                .any(|(u, r, t)| u == &config.default_account.username
                    && r == "member"
                    && t == &config.default_account.tenant)
        );
    }
}
