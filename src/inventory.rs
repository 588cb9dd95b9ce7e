//! Cluster inventory - which node hosts what, on which network.
//!
//! The inventory file lists every node with its roles, its configuration
//! environment and its per-network addresses. Lookups either resolve to a
//! node elsewhere in the cluster or fall back to this node itself, the way
//! a single-node deployment expects.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A node known to the cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Configuration environment, e.g. `mysql-config-default`
    #[serde(default)]
    pub environment: Option<String>,
    /// Addresses by network type, e.g. `admin`, `public`
    #[serde(default)]
    pub networks: HashMap<String, String>,
}

/// The cluster inventory, including which entry is this node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub self_node: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Inventory {
    /// Load the inventory from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid inventory in {}", path.display()))
    }

    /// The node this run executes on
    pub fn local_node(&self) -> Result<&Node> {
        self.nodes
            .iter()
            .find(|n| n.name == self.self_node)
            .with_context(|| format!("node '{}' is not in the inventory", self.self_node))
    }

    /// Find the node serving a role within a configuration environment
    ///
    /// Falls back to this node when the environment-scoped search finds
    /// nothing, or when it finds this node itself.
    pub fn find_server(&self, role: &str, environment: &str) -> Result<&Node> {
        let found = self.nodes.iter().find(|n| {
            n.roles.iter().any(|r| r == role) && n.environment.as_deref() == Some(environment)
        });
        match found {
            Some(node) if node.name != self.self_node => Ok(node),
            _ => self.local_node(),
        }
    }

    /// Address of a node on a network type
    pub fn address_of(&self, node: &Node, network: &str) -> Result<String> {
        node.networks
            .get(network)
            .cloned()
            .with_context(|| format!("node '{}' has no '{network}' network address", node.name))
    }

    /// This node's admin-network address
    pub fn admin_address(&self) -> Result<String> {
        let node = self.local_node()?;
        self.address_of(node, "admin")
    }

    /// This node's public address, falling back to the admin address
    ///
    /// Not every deployment has a public network; the fallback is explicit
    /// rather than an error swallowed along the way.
    pub fn public_address(&self) -> Result<String> {
        let node = self.local_node()?;
        match node.networks.get("public") {
            Some(address) => Ok(address.clone()),
            None => {
                log::debug!(
                    "node '{}' has no public network, using admin address",
                    node.name
                );
                self.address_of(node, "admin")
            }
        }
    }
}
