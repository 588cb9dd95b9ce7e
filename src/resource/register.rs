//! Resources that register entities with the identity service's admin API.
//!
//! Each wraps one create-if-absent client operation, mapping the client's
//! [`Ensured`] outcome onto the engine's apply results. Attribute drift on an
//! already-registered entity is never reconciled.

use anyhow::Result;
use converge::{ApplyContext, ApplyResult, Resource, ResourceState};
use regclient::{AdminClient, EndpointTemplate, Ensured, RetryConfig};
use std::sync::Arc;

fn applied(ensured: Ensured) -> ApplyResult {
    match ensured {
        Ensured::Created => ApplyResult::Created,
        Ensured::AlreadyPresent => ApplyResult::NoChange,
    }
}

fn state_of(exists: bool) -> ResourceState {
    if exists {
        ResourceState::Present { details: None }
    } else {
        ResourceState::Absent
    }
}

/// Startup barrier: blocks until the admin API answers
#[derive(Debug)]
pub struct Wakeup {
    client: Arc<AdminClient>,
    retry: RetryConfig,
}

impl Wakeup {
    pub fn new(client: Arc<AdminClient>, retry: RetryConfig) -> Self {
        Self { client, retry }
    }
}

impl Resource for Wakeup {
    fn kind(&self) -> &'static str {
        "register"
    }

    fn name(&self) -> String {
        "wakeup".into()
    }

    fn description(&self) -> String {
        format!("wait for admin API at {}", self.client.base_url())
    }

    fn current_state(&self) -> Result<ResourceState> {
        Ok(ResourceState::Unknown)
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Unknown
    }

    fn always_applies(&self) -> bool {
        true
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        self.client.wait_ready(&self.retry)?;
        Ok(ApplyResult::Executed)
    }
}

/// A tenant registered with the identity service
#[derive(Debug)]
pub struct RegisterTenant {
    client: Arc<AdminClient>,
    tenant: String,
}

impl RegisterTenant {
    pub fn new(client: Arc<AdminClient>, tenant: impl Into<String>) -> Self {
        Self {
            client,
            tenant: tenant.into(),
        }
    }
}

impl Resource for RegisterTenant {
    fn kind(&self) -> &'static str {
        "register"
    }

    fn name(&self) -> String {
        format!("tenant:{}", self.tenant)
    }

    fn description(&self) -> String {
        format!("register tenant {}", self.tenant)
    }

    fn current_state(&self) -> Result<ResourceState> {
        Ok(state_of(self.client.tenant_exists(&self.tenant)?))
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        Ok(applied(self.client.ensure_tenant(&self.tenant)?))
    }
}

/// A user registered inside a tenant
#[derive(Debug)]
pub struct RegisterUser {
    client: Arc<AdminClient>,
    user: String,
    password: String,
    tenant: String,
}

impl RegisterUser {
    pub fn new(
        client: Arc<AdminClient>,
        user: impl Into<String>,
        password: impl Into<String>,
        tenant: impl Into<String>,
    ) -> Self {
        Self {
            client,
            user: user.into(),
            password: password.into(),
            tenant: tenant.into(),
        }
    }
}

impl Resource for RegisterUser {
    fn kind(&self) -> &'static str {
        "register"
    }

    fn name(&self) -> String {
        format!("user:{}", self.user)
    }

    fn description(&self) -> String {
        format!("register user {} in tenant {}", self.user, self.tenant)
    }

    fn current_state(&self) -> Result<ResourceState> {
        Ok(state_of(self.client.user_exists(&self.user)?))
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        Ok(applied(self.client.ensure_user(
            &self.user,
            &self.password,
            &self.tenant,
        )?))
    }
}

/// A role registered with the identity service
#[derive(Debug)]
pub struct RegisterRole {
    client: Arc<AdminClient>,
    role: String,
}

impl RegisterRole {
    pub fn new(client: Arc<AdminClient>, role: impl Into<String>) -> Self {
        Self {
            client,
            role: role.into(),
        }
    }
}

impl Resource for RegisterRole {
    fn kind(&self) -> &'static str {
        "register"
    }

    fn name(&self) -> String {
        format!("role:{}", self.role)
    }

    fn description(&self) -> String {
        format!("register role {}", self.role)
    }

    fn current_state(&self) -> Result<ResourceState> {
        Ok(state_of(self.client.role_exists(&self.role)?))
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        Ok(applied(self.client.ensure_role(&self.role)?))
    }
}

/// A role held by a user within a tenant
#[derive(Debug)]
pub struct RegisterAccess {
    client: Arc<AdminClient>,
    user: String,
    role: String,
    tenant: String,
}

impl RegisterAccess {
    pub fn new(
        client: Arc<AdminClient>,
        user: impl Into<String>,
        role: impl Into<String>,
        tenant: impl Into<String>,
    ) -> Self {
        Self {
            client,
            user: user.into(),
            role: role.into(),
            tenant: tenant.into(),
        }
    }
}

impl Resource for RegisterAccess {
    fn kind(&self) -> &'static str {
        "register"
    }

    fn name(&self) -> String {
        format!("access:{}:{}:{}", self.tenant, self.user, self.role)
    }

    fn description(&self) -> String {
        format!(
            "assign role {} to {} in tenant {}",
            self.role, self.user, self.tenant
        )
    }

    fn current_state(&self) -> Result<ResourceState> {
        Ok(state_of(self.client.role_assignment_exists(
            &self.user,
            &self.role,
            &self.tenant,
        )?))
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        Ok(applied(self.client.ensure_role_assignment(
            &self.user,
            &self.role,
            &self.tenant,
        )?))
    }
}

/// An EC2 credential pair issued for (user, tenant)
#[derive(Debug)]
pub struct RegisterEc2 {
    client: Arc<AdminClient>,
    user: String,
    tenant: String,
}

impl RegisterEc2 {
    pub fn new(
        client: Arc<AdminClient>,
        user: impl Into<String>,
        tenant: impl Into<String>,
    ) -> Self {
        Self {
            client,
            user: user.into(),
            tenant: tenant.into(),
        }
    }
}

impl Resource for RegisterEc2 {
    fn kind(&self) -> &'static str {
        "register"
    }

    fn name(&self) -> String {
        format!("ec2:{}:{}", self.tenant, self.user)
    }

    fn description(&self) -> String {
        format!(
            "issue ec2 credentials for {} in tenant {}",
            self.user, self.tenant
        )
    }

    fn current_state(&self) -> Result<ResourceState> {
        Ok(state_of(
            self.client.ec2_credential_exists(&self.user, &self.tenant)?,
        ))
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        Ok(applied(
            self.client.ensure_ec2_credential(&self.user, &self.tenant)?,
        ))
    }
}

/// A service catalog entry
#[derive(Debug)]
pub struct RegisterService {
    client: Arc<AdminClient>,
    name: String,
    service_type: String,
    description: String,
}

impl RegisterService {
    pub fn new(
        client: Arc<AdminClient>,
        name: impl Into<String>,
        service_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            client,
            name: name.into(),
            service_type: service_type.into(),
            description: description.into(),
        }
    }
}

impl Resource for RegisterService {
    fn kind(&self) -> &'static str {
        "register"
    }

    fn name(&self) -> String {
        format!("service:{}", self.name)
    }

    fn description(&self) -> String {
        format!("register service {} ({})", self.name, self.service_type)
    }

    fn current_state(&self) -> Result<ResourceState> {
        Ok(state_of(self.client.service_exists(&self.name)?))
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        Ok(applied(self.client.ensure_service(
            &self.name,
            &self.service_type,
            &self.description,
        )?))
    }
}

/// An endpoint template for a service within a region
#[derive(Debug)]
pub struct RegisterEndpoint {
    client: Arc<AdminClient>,
    template: EndpointTemplate,
}

impl RegisterEndpoint {
    pub fn new(client: Arc<AdminClient>, template: EndpointTemplate) -> Self {
        Self { client, template }
    }
}

impl Resource for RegisterEndpoint {
    fn kind(&self) -> &'static str {
        "register"
    }

    fn name(&self) -> String {
        format!("endpoint:{}:{}", self.template.service, self.template.region)
    }

    fn description(&self) -> String {
        format!(
            "register endpoint for {} in region {}",
            self.template.service, self.template.region
        )
    }

    fn current_state(&self) -> Result<ResourceState> {
        Ok(state_of(self.client.endpoint_template_exists(
            &self.template.service,
            &self.template.region,
        )?))
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        Ok(applied(self.client.ensure_endpoint_template(&self.template)?))
    }
}
