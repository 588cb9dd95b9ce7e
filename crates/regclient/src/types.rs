//! Wire types for the v2-style admin API.
//!
//! Entities are looked up by natural key (name, or a name tuple); the
//! surrogate `id` fields only exist to address related entities in follow-up
//! calls within the same run.

use serde::{Deserialize, Serialize};

/// A tenant (project) on the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "enabled")]
    pub enabled: bool,
}

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "tenantId")]
    pub tenant_id: Option<String>,
    #[serde(default = "enabled")]
    pub enabled: bool,
}

/// A role grantable to a user within a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
}

/// An entry in the service catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A registered endpoint for a catalog service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,
    pub service_id: String,
    pub region: String,
    pub publicurl: String,
    pub adminurl: String,
    pub internalurl: String,
}

/// An EC2-style credential pair issued for a (user, tenant) combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ec2Credential {
    pub access: String,
    pub secret: String,
    pub tenant_id: String,
    pub user_id: String,
}

/// Declared attributes of an endpoint template, keyed by (service, region).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate {
    pub service: String,
    pub region: String,
    pub public_url: String,
    pub admin_url: String,
    pub internal_url: String,
}

fn enabled() -> bool {
    true
}

// ============================================================================
// Response envelopes
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct TenantList {
    pub tenants: Vec<Tenant>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TenantWrapper {
    #[allow(dead_code)]
    pub tenant: Tenant,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserList {
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserWrapper {
    #[allow(dead_code)]
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleList {
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleWrapper {
    #[allow(dead_code)]
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceList {
    pub services: Vec<ServiceEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceWrapper {
    #[allow(dead_code)]
    pub service: ServiceEntry,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EndpointList {
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CredentialList {
    pub credentials: Vec<Ec2Credential>,
}
