//! Recording mocks shared across resource and recipe tests.

use crate::config::PlatformFamily;
use crate::db::{DbConnection, SqlProvider};
use crate::system::SystemProvider;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Mutex;

/// A [`SystemProvider`] that records every mutating call
#[derive(Debug, Default)]
pub struct MockSystem {
    installed: Mutex<HashSet<String>>,
    enabled: Mutex<HashSet<String>>,
    journal: Mutex<Vec<String>>,
}

impl MockSystem {
    pub fn preinstall(&self, package: &str) {
        self.installed.lock().unwrap().insert(package.to_string());
    }

    pub fn preenable(&self, service: &str) {
        self.enabled.lock().unwrap().insert(service.to_string());
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    fn record(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }
}

impl SystemProvider for MockSystem {
    fn package_installed(&self, package: &str) -> Result<bool> {
        Ok(self.installed.lock().unwrap().contains(package))
    }

    fn install_package(&self, package: &str) -> Result<()> {
        self.record(format!("install_package {package}"));
        self.installed.lock().unwrap().insert(package.to_string());
        Ok(())
    }

    fn service_enabled(&self, service: &str) -> Result<bool> {
        Ok(self.enabled.lock().unwrap().contains(service))
    }

    fn enable_service(&self, service: &str) -> Result<()> {
        self.record(format!("enable_service {service}"));
        self.enabled.lock().unwrap().insert(service.to_string());
        Ok(())
    }

    fn restart_service(&self, service: &str) -> Result<()> {
        self.record(format!("restart_service {service}"));
        Ok(())
    }

    fn run(&self, cmd: &str, args: &[&str]) -> Result<()> {
        self.record(format!("run {cmd} {}", args.join(" ")));
        Ok(())
    }
}

/// A [`SqlProvider`] backed by in-memory sets
#[derive(Debug, Default)]
pub struct MockSql {
    databases: Mutex<HashSet<String>>,
    users: Mutex<HashSet<String>>,
    grants: Mutex<HashSet<String>>,
    journal: Mutex<Vec<String>>,
}

impl MockSql {
    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    fn record(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }
}

impl SqlProvider for MockSql {
    fn engine(&self) -> &'static str {
        "mock"
    }

    fn client_package(&self, _platform: PlatformFamily) -> &'static str {
        "mock-client"
    }

    fn privileges(&self) -> &'static [&'static str] {
        &["SELECT", "INSERT"]
    }

    fn database_exists(&self, _conn: &DbConnection, database: &str) -> Result<bool> {
        Ok(self.databases.lock().unwrap().contains(database))
    }

    fn create_database(&self, conn: &DbConnection, database: &str) -> Result<()> {
        self.record(format!("create_database {database} on {}", conn.host));
        self.databases.lock().unwrap().insert(database.to_string());
        Ok(())
    }

    fn user_exists(&self, _conn: &DbConnection, user: &str) -> Result<bool> {
        Ok(self.users.lock().unwrap().contains(user))
    }

    fn create_user(&self, conn: &DbConnection, user: &str, _password: &str) -> Result<()> {
        self.record(format!("create_user {user} on {}", conn.host));
        self.users.lock().unwrap().insert(user.to_string());
        Ok(())
    }

    fn has_grant(&self, _conn: &DbConnection, user: &str, database: &str) -> Result<bool> {
        Ok(self.grants.lock().unwrap().contains(&format!("{user}@{database}")))
    }

    fn grant(&self, conn: &DbConnection, user: &str, database: &str) -> Result<()> {
        self.record(format!("grant {user}@{database} on {}", conn.host));
        self.grants
            .lock()
            .unwrap()
            .insert(format!("{user}@{database}"));
        Ok(())
    }

    fn connection_url(&self, user: &str, password: &str, host: &str, database: &str) -> String {
        format!("mock://{user}:{password}@{host}/{database}")
    }
}
