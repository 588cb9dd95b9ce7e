//! Builds the convergence plan for an identity node.
//!
//! Resource order is load-bearing: install and enable the service, converge
//! the database backend, render the configuration (restarting the service on
//! change), migrate the schema, then wait for the API and register tenants,
//! users, roles, role assignments, EC2 credentials and the catalog entry.

use crate::config::NodeConfig;
use crate::db::{self, DbConnection, SqlProvider};
use crate::inventory::Inventory;
use crate::resource::{
    Database, DatabaseGrant, DatabaseUser, ExecuteCommand, FileResource, MonitorEntry, Package,
    RegisterAccess, RegisterEc2, RegisterEndpoint, RegisterRole, RegisterService, RegisterTenant,
    RegisterUser, Service, SubstitutionEngine, TemplateEngine, TemplateResource, Wakeup,
};
use crate::state::ClusterState;
use crate::system::{ShellSystem, SystemProvider};
use anyhow::{Context, Result};
use converge::{NotifyTiming, Plan, ProviderRegistry};
use regclient::{AdminClient, AdminEndpoint, EndpointTemplate, RetryConfig};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

const CONFIG_TEMPLATE: &str = include_str!("../templates/identity.conf.tpl");

/// Collaborators the plan builder needs, swappable for tests
pub struct Deps {
    pub system: Arc<dyn SystemProvider>,
    pub sql: ProviderRegistry<dyn SqlProvider>,
    pub template: Arc<dyn TemplateEngine>,
    pub wakeup_retry: RetryConfig,
}

impl Deps {
    pub fn production(config: &NodeConfig) -> Self {
        Self {
            system: Arc::new(ShellSystem::new(config.platform)),
            sql: db::registry(),
            template: Arc::new(SubstitutionEngine),
            wakeup_retry: RetryConfig::default(),
        }
    }
}

/// Build the full convergence plan for this node
pub fn build_plan(
    config: &NodeConfig,
    inventory: &Inventory,
    state_path: &Path,
    deps: Deps,
) -> Result<Plan> {
    let mut plan = Plan::new();

    plan.declare(Box::new(Package::new(
        config.server_package(),
        deps.system.clone(),
    )));
    let service_key = plan.declare(Box::new(Service::new(
        config.server_service(),
        deps.system.clone(),
    )));

    // Database backend. sqlite is local-only; anything else resolves a
    // provider and converges the remote server.
    let sql_connection = if config.sql.engine == "sqlite" {
        plan.declare(Box::new(
            FileResource::new(&config.paths.sqlite_file).with_mode(0o600),
        ));
        format!("sqlite://{}", config.paths.sqlite_file.display())
    } else {
        // Unknown engines fail here, before anything has been mutated.
        let provider = deps.sql.resolve(&config.sql.engine)?;

        plan.declare(Box::new(Package::new(
            provider.client_package(config.platform),
            deps.system.clone(),
        )));

        let mut state = ClusterState::load(state_path)?;
        let db_password = state.db_password_or_generate();
        state
            .save(state_path)
            .context("Could not persist cluster state")?;

        let environment = format!("{}-config-{}", config.sql.engine, config.sql.instance);
        let db_node = inventory.find_server(&format!("{}-server", config.sql.engine), &environment)?;
        let db_host = inventory.address_of(db_node, "admin")?;
        log::debug!("using {} server on {db_host}", config.sql.engine);

        let conn = DbConnection {
            host: db_host.clone(),
            username: config.db.maker_user.clone(),
            password: config.db.maker_password.clone(),
        };
        plan.declare(Box::new(Database::new(
            &config.db.database,
            provider.clone(),
            conn.clone(),
        )));
        plan.declare(Box::new(DatabaseUser::new(
            &config.db.user,
            &db_password,
            provider.clone(),
            conn.clone(),
        )));
        plan.declare(Box::new(DatabaseGrant::new(
            &config.db.user,
            &config.db.database,
            provider.clone(),
            conn,
        )));

        provider.connection_url(&config.db.user, &db_password, &db_host, &config.db.database)
    };

    let template_key = plan.declare(Box::new(
        TemplateResource::new(
            &config.paths.config_file,
            CONFIG_TEMPLATE,
            config_bindings(config, &sql_connection),
            deps.template.clone(),
        )
        .with_mode(0o640),
    ));
    plan.notify(
        template_key,
        service_key,
        "restart",
        NotifyTiming::Immediate,
    );

    plan.declare(Box::new(ExecuteCommand::new(
        "db-sync",
        "identity-manage",
        &["db_sync"],
        deps.system.clone(),
    )));

    // Registration: everything below talks to the admin API, behind the
    // wakeup barrier.
    let admin_host = inventory.admin_address()?;
    let endpoint = AdminEndpoint {
        host: admin_host.clone(),
        port: config.api.admin_port,
        token: config.service.token.clone(),
    };
    let client = Arc::new(AdminClient::new(&endpoint));

    plan.declare(Box::new(Wakeup::new(client.clone(), deps.wakeup_retry)));

    for tenant in config.seed_tenants() {
        plan.declare(Box::new(RegisterTenant::new(client.clone(), tenant)));
    }
    for (user, password, tenant) in config.seed_users() {
        plan.declare(Box::new(RegisterUser::new(
            client.clone(),
            user,
            password,
            tenant,
        )));
    }
    for role in &config.roles {
        plan.declare(Box::new(RegisterRole::new(client.clone(), role.clone())));
    }
    for (user, role, tenant) in config.seed_access() {
        plan.declare(Box::new(RegisterAccess::new(
            client.clone(),
            user,
            role,
            tenant,
        )));
    }
    for (user, tenant) in config.seed_ec2() {
        plan.declare(Box::new(RegisterEc2::new(client.clone(), user, tenant)));
    }

    plan.declare(Box::new(RegisterService::new(
        client.clone(),
        &config.service.name,
        &config.service.service_type,
        &config.service.description,
    )));

    let public_host = inventory.public_address()?;
    plan.declare(Box::new(RegisterEndpoint::new(
        client,
        EndpointTemplate {
            service: config.service.name.clone(),
            region: config.service.region.clone(),
            public_url: format!("http://{public_host}:{}/v2.0", config.api.service_port),
            admin_url: format!("http://{admin_host}:{}/v2.0", config.api.admin_port),
            internal_url: format!("http://{admin_host}:{}/v2.0", config.api.service_port),
        },
    )));

    plan.declare(Box::new(MonitorEntry::new(
        ClusterState::load(state_path)?,
        state_path,
        config.server_service(),
    )));

    Ok(plan)
}

fn config_bindings(config: &NodeConfig, sql_connection: &str) -> BTreeMap<String, String> {
    let mut bindings = BTreeMap::new();
    bindings.insert("sql_connection".into(), sql_connection.to_string());
    bindings.insert(
        "sql_idle_timeout".into(),
        config.sql.idle_timeout.to_string(),
    );
    bindings.insert(
        "sql_min_pool_size".into(),
        config.sql.min_pool_size.to_string(),
    );
    bindings.insert(
        "sql_max_pool_size".into(),
        config.sql.max_pool_size.to_string(),
    );
    bindings.insert(
        "sql_pool_timeout".into(),
        config.sql.pool_timeout.to_string(),
    );
    bindings.insert("debug".into(), config.debug.to_string());
    bindings.insert("verbose".into(), config.verbose.to_string());
    bindings.insert("use_syslog".into(), config.use_syslog.to_string());
    bindings.insert("admin_token".into(), config.service.token.clone());
    bindings.insert("service_host".into(), config.api.service_host.clone());
    bindings.insert("service_port".into(), config.api.service_port.to_string());
    bindings.insert("admin_host".into(), config.api.admin_host.clone());
    bindings.insert("admin_port".into(), config.api.admin_port.to_string());
    bindings.insert("public_host".into(), config.api.public_host.clone());
    bindings.insert("public_port".into(), config.api.public_port.to_string());
    bindings
}
