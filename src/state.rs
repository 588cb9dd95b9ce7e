//! Persisted cluster state for this node.
//!
//! Two things survive across runs: the generated database password (created
//! once, never regenerated) and the monitoring registry listing which
//! services this node announces. Stored as TOML next to the other run
//! artifacts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const PASSWORD_LEN: usize = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterState {
    /// Database password for the service account, generated on first use
    #[serde(default)]
    pub db_password: Option<String>,

    /// Services this node has registered with monitoring
    #[serde(default)]
    pub monitor_services: Vec<String>,

    /// Last time the state was written
    pub last_updated: DateTime<Utc>,
}

impl Default for ClusterState {
    fn default() -> Self {
        Self {
            db_password: None,
            monitor_services: Vec::new(),
            last_updated: Utc::now(),
        }
    }
}

impl ClusterState {
    /// Load state from disk, or return default if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid state in {}", path.display()))
    }

    /// Save state to disk
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }
        self.last_updated = Utc::now();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))?;
        Ok(())
    }

    /// The service database password, generated once and then reused
    pub fn db_password_or_generate(&mut self) -> String {
        if self.db_password.is_none() {
            log::info!("generating database password");
            self.db_password = Some(generate_password());
        }
        self.db_password.clone().unwrap_or_default()
    }

    /// Add a service to the monitoring registry, append-if-absent
    ///
    /// Returns true when the entry was added.
    pub fn register_monitor(&mut self, service: &str) -> bool {
        if self.monitor_services.iter().any(|s| s == service) {
            return false;
        }
        self.monitor_services.push(service.to_string());
        true
    }

    /// Whether a service is already in the monitoring registry
    pub fn monitors(&self, service: &str) -> bool {
        self.monitor_services.iter().any(|s| s == service)
    }
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let state = ClusterState::load(&dir.path().join("state.toml")).unwrap();
        assert!(state.db_password.is_none());
        assert!(state.monitor_services.is_empty());
    }

    #[test]
    fn test_password_generated_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.toml");

        let mut state = ClusterState::load(&path).unwrap();
        let first = state.db_password_or_generate();
        assert_eq!(first.len(), PASSWORD_LEN);
        state.save(&path).unwrap();

        // A fresh load keeps the same password.
        let mut state = ClusterState::load(&path).unwrap();
        assert_eq!(state.db_password_or_generate(), first);
    }

    #[test]
    fn test_monitor_registry_append_if_absent() {
        let mut state = ClusterState::default();
        assert!(state.register_monitor("identity"));
        assert!(!state.register_monitor("identity"));
        assert_eq!(state.monitor_services, ["identity"]);
        assert!(state.monitors("identity"));
    }

    #[test]
    fn test_state_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.toml");

        let mut state = ClusterState::default();
        state.register_monitor("identity");
        state.save(&path).unwrap();

        let loaded = ClusterState::load(&path).unwrap();
        assert_eq!(loaded.monitor_services, ["identity"]);
    }
}
