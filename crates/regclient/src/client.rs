//! Admin API client.
//!
//! This module provides the [`AdminClient`] implementation for the identity
//! service's administrative HTTP API: a bearer-token-authenticated v2-style
//! API exposing list and create endpoints for tenants, users, roles, role
//! assignments, EC2 credentials, services and endpoint templates.
//!
//! Existence is always re-queried remotely before a mutation; nothing about
//! the remote service is cached between operations.

use crate::error::{Error, Result};
use crate::retry::{RetryConfig, with_retry};
use crate::types::{
    CredentialList, Endpoint, EndpointList, EndpointTemplate, Role, RoleList, RoleWrapper,
    ServiceEntry, ServiceList, ServiceWrapper, Tenant, TenantList, TenantWrapper, User, UserList,
    UserWrapper,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Connection descriptor for the admin API, resolved once per run.
///
/// Read-only after construction; every registration call in a run reuses the
/// same endpoint.
#[derive(Debug, Clone)]
pub struct AdminEndpoint {
    pub host: String,
    pub port: u16,
    pub token: String,
}

impl AdminEndpoint {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Outcome of a create-if-absent operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensured {
    /// The entity was created by this call
    Created,
    /// The entity already existed; nothing was sent
    AlreadyPresent,
}

impl Ensured {
    pub fn created(self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Per-request timeout; the wakeup barrier owns the longer-scale retrying.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the identity service admin API.
pub struct AdminClient {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// API base URL, e.g. `http://192.168.124.81:35357`.
    base_url: String,
    /// Admin bearer token, sent as `X-Auth-Token`.
    token: String,
}

impl std::fmt::Debug for AdminClient {
    /// The bearer token is never printed.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AdminClient {
    /// Create a client for the given endpoint.
    #[must_use]
    pub fn new(endpoint: &AdminEndpoint) -> Self {
        Self::with_base_url(endpoint.base_url(), endpoint.token.clone())
    }

    /// Create a client with an explicit base URL (for testing).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        // Redirects stay disabled: the version document answers 3xx, and the
        // wakeup barrier must treat that as a live service, not follow it.
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .http_status_as_error(false)
            .max_redirects(0)
            .build();
        Self {
            agent: config.into(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    // ------------------------------------------------------------------
    // Wakeup barrier
    // ------------------------------------------------------------------

    /// Block until the admin API answers, within the retry bound.
    ///
    /// Used as a startup barrier after the service process is (re)started:
    /// any HTTP answer from the version document counts as ready. Exhausting
    /// the bound is a fatal [`Error::WakeupTimeout`], not an infinite hang.
    pub fn wait_ready(&self, retry: &RetryConfig) -> Result<()> {
        log::info!("waiting for admin API at {}", self.base_url);
        with_retry(retry, || {
            self.agent.get(self.url("/v2.0")).call()?;
            Ok(())
        })
        .map_err(|e| match e {
            Error::Network { .. } => Error::WakeupTimeout {
                attempts: retry.max_attempts,
            },
            other => other,
        })
    }

    // ------------------------------------------------------------------
    // Tenants
    // ------------------------------------------------------------------

    pub fn find_tenant(&self, name: &str) -> Result<Option<Tenant>> {
        let list: TenantList = self.get_json("/v2.0/tenants")?;
        Ok(list.tenants.into_iter().find(|t| t.name == name))
    }

    pub fn tenant_exists(&self, name: &str) -> Result<bool> {
        Ok(self.find_tenant(name)?.is_some())
    }

    /// Ensure a tenant with the given name exists.
    pub fn ensure_tenant(&self, name: &str) -> Result<Ensured> {
        if self.tenant_exists(name)? {
            log::debug!("tenant '{name}' already registered");
            return Ok(Ensured::AlreadyPresent);
        }
        let body = serde_json::json!({ "tenant": { "name": name, "enabled": true } });
        let _: TenantWrapper = self.post_json("/v2.0/tenants", &body)?;
        log::info!("registered tenant '{name}'");
        Ok(Ensured::Created)
    }

    fn require_tenant(&self, name: &str) -> Result<Tenant> {
        self.find_tenant(name)?.ok_or_else(|| Error::MissingDependency {
            what: format!("tenant '{name}'"),
        })
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub fn find_user(&self, name: &str) -> Result<Option<User>> {
        let list: UserList = self.get_json("/v2.0/users")?;
        Ok(list.users.into_iter().find(|u| u.name == name))
    }

    pub fn user_exists(&self, name: &str) -> Result<bool> {
        Ok(self.find_user(name)?.is_some())
    }

    /// Ensure a user exists, created inside the named tenant.
    ///
    /// The tenant must already be registered; it is not auto-created.
    pub fn ensure_user(&self, name: &str, password: &str, tenant: &str) -> Result<Ensured> {
        if self.user_exists(name)? {
            log::debug!("user '{name}' already registered");
            return Ok(Ensured::AlreadyPresent);
        }
        let tenant = self.require_tenant(tenant)?;
        let body = serde_json::json!({
            "user": {
                "name": name,
                "password": password,
                "tenantId": tenant.id,
                "enabled": true,
            }
        });
        let _: UserWrapper = self.post_json("/v2.0/users", &body)?;
        log::info!("registered user '{name}'");
        Ok(Ensured::Created)
    }

    fn require_user(&self, name: &str) -> Result<User> {
        self.find_user(name)?.ok_or_else(|| Error::MissingDependency {
            what: format!("user '{name}'"),
        })
    }

    // ------------------------------------------------------------------
    // Roles
    // ------------------------------------------------------------------

    pub fn find_role(&self, name: &str) -> Result<Option<Role>> {
        let list: RoleList = self.get_json("/v2.0/OS-KSADM/roles")?;
        Ok(list.roles.into_iter().find(|r| r.name == name))
    }

    pub fn role_exists(&self, name: &str) -> Result<bool> {
        Ok(self.find_role(name)?.is_some())
    }

    /// Ensure a role with the given name exists.
    pub fn ensure_role(&self, name: &str) -> Result<Ensured> {
        if self.role_exists(name)? {
            log::debug!("role '{name}' already registered");
            return Ok(Ensured::AlreadyPresent);
        }
        let body = serde_json::json!({ "role": { "name": name } });
        let _: RoleWrapper = self.post_json("/v2.0/OS-KSADM/roles", &body)?;
        log::info!("registered role '{name}'");
        Ok(Ensured::Created)
    }

    fn require_role(&self, name: &str) -> Result<Role> {
        self.find_role(name)?.ok_or_else(|| Error::MissingDependency {
            what: format!("role '{name}'"),
        })
    }

    // ------------------------------------------------------------------
    // Role assignments (user x role x tenant)
    // ------------------------------------------------------------------

    fn roles_on_tenant(&self, tenant: &Tenant, user: &User) -> Result<Vec<Role>> {
        let list: RoleList =
            self.get_json(&format!("/v2.0/tenants/{}/users/{}/roles", tenant.id, user.id))?;
        Ok(list.roles)
    }

    /// Check whether the user holds the role within the tenant.
    ///
    /// All three referenced entities must already exist.
    pub fn role_assignment_exists(&self, user: &str, role: &str, tenant: &str) -> Result<bool> {
        let tenant = self.require_tenant(tenant)?;
        let user = self.require_user(user)?;
        Ok(self
            .roles_on_tenant(&tenant, &user)?
            .iter()
            .any(|r| r.name == role))
    }

    /// Ensure the user holds the role within the tenant.
    pub fn ensure_role_assignment(&self, user: &str, role: &str, tenant: &str) -> Result<Ensured> {
        let tenant_ref = self.require_tenant(tenant)?;
        let user_ref = self.require_user(user)?;
        if self
            .roles_on_tenant(&tenant_ref, &user_ref)?
            .iter()
            .any(|r| r.name == role)
        {
            log::debug!("{tenant}:{user} -> {role} already assigned");
            return Ok(Ensured::AlreadyPresent);
        }
        let role_ref = self.require_role(role)?;
        self.put_empty(&format!(
            "/v2.0/tenants/{}/users/{}/roles/OS-KSADM/{}",
            tenant_ref.id, user_ref.id, role_ref.id
        ))?;
        log::info!("assigned role '{role}' to '{user}' in tenant '{tenant}'");
        Ok(Ensured::Created)
    }

    // ------------------------------------------------------------------
    // EC2 credentials (user x tenant)
    // ------------------------------------------------------------------

    /// Check whether an EC2 credential pair exists for (user, tenant).
    pub fn ec2_credential_exists(&self, user: &str, tenant: &str) -> Result<bool> {
        let tenant = self.require_tenant(tenant)?;
        let user = self.require_user(user)?;
        let list: CredentialList =
            self.get_json(&format!("/v2.0/users/{}/credentials/OS-EC2", user.id))?;
        Ok(list.credentials.iter().any(|c| c.tenant_id == tenant.id))
    }

    /// Ensure an EC2 credential pair is issued for (user, tenant).
    ///
    /// The access/secret pair is generated by the service; the client never
    /// sees or stores it beyond the create response.
    pub fn ensure_ec2_credential(&self, user: &str, tenant: &str) -> Result<Ensured> {
        if self.ec2_credential_exists(user, tenant)? {
            log::debug!("ec2 credentials for {tenant}:{user} already issued");
            return Ok(Ensured::AlreadyPresent);
        }
        let tenant_ref = self.require_tenant(tenant)?;
        let user_ref = self.require_user(user)?;
        let body = serde_json::json!({ "tenant_id": tenant_ref.id });
        let _: serde_json::Value = self.post_json(
            &format!("/v2.0/users/{}/credentials/OS-EC2", user_ref.id),
            &body,
        )?;
        log::info!("issued ec2 credentials for '{user}' in tenant '{tenant}'");
        Ok(Ensured::Created)
    }

    // ------------------------------------------------------------------
    // Service catalog
    // ------------------------------------------------------------------

    pub fn find_service(&self, name: &str) -> Result<Option<ServiceEntry>> {
        let list: ServiceList = self.get_json("/v2.0/OS-KSADM/services")?;
        Ok(list.services.into_iter().find(|s| s.name == name))
    }

    pub fn service_exists(&self, name: &str) -> Result<bool> {
        Ok(self.find_service(name)?.is_some())
    }

    /// Ensure a service catalog entry exists.
    pub fn ensure_service(
        &self,
        name: &str,
        service_type: &str,
        description: &str,
    ) -> Result<Ensured> {
        if self.service_exists(name)? {
            log::debug!("service '{name}' already registered");
            return Ok(Ensured::AlreadyPresent);
        }
        let body = serde_json::json!({
            "service": {
                "name": name,
                "type": service_type,
                "description": description,
            }
        });
        let _: ServiceWrapper = self.post_json("/v2.0/OS-KSADM/services", &body)?;
        log::info!("registered service '{name}'");
        Ok(Ensured::Created)
    }

    fn require_service(&self, name: &str) -> Result<ServiceEntry> {
        self.find_service(name)?.ok_or_else(|| Error::MissingDependency {
            what: format!("service '{name}'"),
        })
    }

    // ------------------------------------------------------------------
    // Endpoint templates (service x region)
    // ------------------------------------------------------------------

    fn find_endpoint(&self, service: &ServiceEntry, region: &str) -> Result<Option<Endpoint>> {
        let list: EndpointList = self.get_json("/v2.0/endpoints")?;
        Ok(list
            .endpoints
            .into_iter()
            .find(|e| e.service_id == service.id && e.region == region))
    }

    /// Check whether an endpoint template exists for (service, region).
    pub fn endpoint_template_exists(&self, service: &str, region: &str) -> Result<bool> {
        let service = self.require_service(service)?;
        Ok(self.find_endpoint(&service, region)?.is_some())
    }

    /// Ensure an endpoint template is registered for its service and region.
    ///
    /// The service must already be in the catalog. URLs on an existing
    /// template are not reconciled.
    pub fn ensure_endpoint_template(&self, template: &EndpointTemplate) -> Result<Ensured> {
        let service = self.require_service(&template.service)?;
        if self.find_endpoint(&service, &template.region)?.is_some() {
            log::debug!(
                "endpoint for '{}' in region '{}' already registered",
                template.service,
                template.region
            );
            return Ok(Ensured::AlreadyPresent);
        }
        let body = serde_json::json!({
            "endpoint": {
                "service_id": service.id,
                "region": template.region,
                "publicurl": template.public_url,
                "adminurl": template.admin_url,
                "internalurl": template.internal_url,
            }
        });
        let _: serde_json::Value = self.post_json("/v2.0/endpoints", &body)?;
        log::info!(
            "registered endpoint for '{}' in region '{}'",
            template.service,
            template.region
        );
        Ok(Ensured::Created)
    }

    // ------------------------------------------------------------------
    // Request plumbing
    // ------------------------------------------------------------------

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .agent
            .get(self.url(path))
            .header("X-Auth-Token", &self.token)
            .call()?;
        Self::read_body(Self::check_status(resp)?)
    }

    fn post_json<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T> {
        let resp = self
            .agent
            .post(self.url(path))
            .header("X-Auth-Token", &self.token)
            .send_json(body)?;
        Self::read_body(Self::check_status(resp)?)
    }

    fn put_empty(&self, path: &str) -> Result<()> {
        let resp = self
            .agent
            .put(self.url(path))
            .header("X-Auth-Token", &self.token)
            .send_empty()?;
        Self::check_status(resp)?;
        Ok(())
    }

    fn check_status(
        mut resp: ureq::http::Response<ureq::Body>,
    ) -> Result<ureq::http::Response<ureq::Body>> {
        let status = resp.status().as_u16();
        match status {
            200..=299 => Ok(resp),
            401 | 403 => Err(Error::Unauthorized { status }),
            _ => {
                let message = resp
                    .body_mut()
                    .read_to_string()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                Err(Error::Api { status, message })
            }
        }
    }

    fn read_body<T: DeserializeOwned>(mut resp: ureq::http::Response<ureq::Body>) -> Result<T> {
        resp.body_mut()
            .read_json::<T>()
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    /// Serve `requests` HTTP requests, one per connection, answering from a
    /// "METHOD /path" -> (status, body) table. Unknown paths get a 404.
    fn spawn_server(requests: usize, routes: HashMap<String, (u16, String)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        thread::spawn(move || {
            for _ in 0..requests {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let header_end = loop {
                    let n = stream.read(&mut chunk).unwrap();
                    if n == 0 {
                        break None;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        break Some(pos + 4);
                    }
                };
                let Some(header_end) = header_end else {
                    continue;
                };

                let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
                let content_length = head
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                while buf.len() < header_end + content_length {
                    let n = stream.read(&mut chunk).unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }

                let request_line = head.lines().next().unwrap_or_default();
                let mut parts = request_line.split_whitespace();
                let key = format!(
                    "{} {}",
                    parts.next().unwrap_or_default(),
                    parts.next().unwrap_or_default()
                );
                let (status, body) = routes
                    .get(&key)
                    .cloned()
                    .unwrap_or((404, "{}".to_string()));
                let response = format!(
                    "HTTP/1.1 {status} STATUS\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).unwrap();
            }
        });

        base_url
    }

    fn routes(entries: &[(&str, u16, &str)]) -> HashMap<String, (u16, String)> {
        entries
            .iter()
            .map(|(key, status, body)| ((*key).to_string(), (*status, (*body).to_string())))
            .collect()
    }

    #[test]
    fn test_base_url_from_endpoint() {
        let endpoint = AdminEndpoint {
            host: "192.168.124.81".into(),
            port: 35357,
            token: "secret".into(),
        };
        let client = AdminClient::new(&endpoint);
        assert_eq!(client.base_url(), "http://192.168.124.81:35357");
    }

    #[test]
    fn test_ensure_tenant_existing_is_noop() {
        let base = spawn_server(
            1,
            routes(&[(
                "GET /v2.0/tenants",
                200,
                r#"{"tenants": [{"id": "t1", "name": "admin", "enabled": true}]}"#,
            )]),
        );
        let client = AdminClient::with_base_url(base, "secret");
        assert_eq!(client.ensure_tenant("admin").unwrap(), Ensured::AlreadyPresent);
    }

    #[test]
    fn test_ensure_tenant_absent_creates() {
        let base = spawn_server(
            2,
            routes(&[
                ("GET /v2.0/tenants", 200, r#"{"tenants": []}"#),
                (
                    "POST /v2.0/tenants",
                    200,
                    r#"{"tenant": {"id": "t9", "name": "service", "enabled": true}}"#,
                ),
            ]),
        );
        let client = AdminClient::with_base_url(base, "secret");
        assert_eq!(client.ensure_tenant("service").unwrap(), Ensured::Created);
    }

    #[test]
    fn test_ensure_user_missing_tenant_is_dependency_error() {
        let base = spawn_server(
            2,
            routes(&[
                ("GET /v2.0/users", 200, r#"{"users": []}"#),
                ("GET /v2.0/tenants", 200, r#"{"tenants": []}"#),
            ]),
        );
        let client = AdminClient::with_base_url(base, "secret");
        let err = client.ensure_user("crowbar", "pw", "admin").unwrap_err();
        assert!(matches!(err, Error::MissingDependency { .. }));
        assert!(err.to_string().contains("tenant 'admin'"));
    }

    #[test]
    fn test_role_assignment_keyed_on_triple() {
        let base = spawn_server(
            3,
            routes(&[
                (
                    "GET /v2.0/tenants",
                    200,
                    r#"{"tenants": [{"id": "t1", "name": "admin"}]}"#,
                ),
                (
                    "GET /v2.0/users",
                    200,
                    r#"{"users": [{"id": "u1", "name": "crowbar"}]}"#,
                ),
                (
                    "GET /v2.0/tenants/t1/users/u1/roles",
                    200,
                    r#"{"roles": [{"id": "r1", "name": "admin"}]}"#,
                ),
            ]),
        );
        let client = AdminClient::with_base_url(base, "secret");
        assert_eq!(
            client.ensure_role_assignment("crowbar", "admin", "admin").unwrap(),
            Ensured::AlreadyPresent
        );
    }

    #[test]
    fn test_rejected_token_is_unauthorized() {
        let base = spawn_server(1, routes(&[("GET /v2.0/tenants", 401, "{}")]));
        let client = AdminClient::with_base_url(base, "wrong");
        let err = client.tenant_exists("admin").unwrap_err();
        assert!(matches!(err, Error::Unauthorized { status: 401 }));
    }

    #[test]
    fn test_wait_ready_bounded_failure() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = AdminClient::with_base_url(format!("http://127.0.0.1:{port}"), "secret");
        let retry = RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(5),
        };
        let err = client.wait_ready(&retry).unwrap_err();
        assert!(matches!(err, Error::WakeupTimeout { attempts: 3 }));
    }

    #[test]
    fn test_wait_ready_succeeds_on_any_answer() {
        let base = spawn_server(1, routes(&[("GET /v2.0", 300, r#"{"versions": []}"#)]));
        let client = AdminClient::with_base_url(base, "secret");
        client.wait_ready(&RetryConfig::no_retry()).unwrap();
    }
}
