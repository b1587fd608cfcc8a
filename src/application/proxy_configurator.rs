//! Proxy Configurator
//!
//! Registers every discovered backend in the proxy's `mysql_servers` table
//! through the admin interface and activates the table.

use crate::application::TopologyResolver;
use crate::domain::entities::{Credentials, Endpoint, RoutingEntry};
use crate::domain::errors::HarnessError;
use crate::domain::ports::SqlClient;
use std::sync::Arc;

pub const LOAD_SERVERS_TO_RUNTIME: &str = "LOAD MYSQL SERVERS TO RUNTIME";

pub struct ProxyConfigurator {
    resolver: Arc<TopologyResolver>,
    sql: Arc<dyn SqlClient>,
    admin_endpoint: Endpoint,
    admin_credentials: Credentials,
}

impl ProxyConfigurator {
    pub fn new(
        resolver: Arc<TopologyResolver>,
        sql: Arc<dyn SqlClient>,
        admin_endpoint: Endpoint,
        admin_credentials: Credentials,
    ) -> Self {
        Self {
            resolver,
            sql,
            admin_endpoint,
            admin_credentials,
        }
    }

    /// Insert one ONLINE routing entry per backend, then load the table to
    /// runtime.
    ///
    /// An empty topology is an error rather than an empty configuration.
    /// Everything runs on one admin session. There is no rollback: if an
    /// insert fails, the rows before it stay staged and the load is not
    /// issued.
    pub async fn populate_backends(&self) -> Result<Vec<RoutingEntry>, HarnessError> {
        let backends = self.resolver.resolve_backends().await?;
        if backends.is_empty() {
            return Err(HarnessError::NoBackendsFound);
        }
        let entries: Vec<RoutingEntry> = backends.iter().map(RoutingEntry::from).collect();

        let mut statements: Vec<String> = entries.iter().map(render_insert).collect();
        statements.push(LOAD_SERVERS_TO_RUNTIME.to_string());

        self.sql
            .execute_batch(&self.admin_endpoint, &self.admin_credentials, &statements)
            .await?;

        tracing::info!(
            "registered {} backend(s) with proxy admin at {}",
            entries.len(),
            self.admin_endpoint
        );
        Ok(entries)
    }
}

/// `INSERT` statement for one routing entry.
pub fn render_insert(entry: &RoutingEntry) -> String {
    format!(
        "INSERT INTO mysql_servers(hostgroup_id, hostname, port, status) VALUES({}, '{}', {}, '{}')",
        entry.hostgroup_id,
        entry.hostname.replace('\'', "''"),
        entry.port,
        entry.status
    )
}
