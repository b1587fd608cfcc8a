//! Query Runner
//!
//! Runs test statements either through the proxy or straight against a
//! backend, so tests can compare what the proxy returns with what the
//! backends hold.

use crate::application::TopologyResolver;
use crate::domain::entities::{Credentials, Endpoint};
use crate::domain::errors::HarnessError;
use crate::domain::ports::SqlClient;
use crate::domain::services::BackendSelector;
use crate::domain::value_objects::Rows;
use std::sync::Arc;

pub struct QueryRunner {
    resolver: Arc<TopologyResolver>,
    sql: Arc<dyn SqlClient>,
    client_endpoint: Endpoint,
    client_credentials: Credentials,
    /// Host the backends' published ports are reachable on
    backend_host: String,
    backend_credentials: Credentials,
}

impl QueryRunner {
    pub fn new(
        resolver: Arc<TopologyResolver>,
        sql: Arc<dyn SqlClient>,
        client_endpoint: Endpoint,
        client_credentials: Credentials,
        backend_host: impl Into<String>,
        backend_credentials: Credentials,
    ) -> Self {
        Self {
            resolver,
            sql,
            client_endpoint,
            client_credentials,
            backend_host: backend_host.into(),
            backend_credentials,
        }
    }

    /// Run `query` on `database` through the proxy's client endpoint.
    ///
    /// Returns the rows when `want_result` is set, otherwise None.
    pub async fn run_via_proxy(
        &self,
        query: &str,
        database: &str,
        want_result: bool,
    ) -> Result<Option<Rows>, HarnessError> {
        tracing::debug!("proxy {} [{}]: {}", self.client_endpoint, database, query);
        self.sql
            .query(
                &self.client_endpoint,
                &self.client_credentials,
                Some(database),
                query,
                want_result,
            )
            .await
    }

    /// Run `query` on `database` directly against one backend of `hostgroup`.
    ///
    /// The backend is picked uniformly among those whose MySQL port is
    /// published on the host. Fails with
    /// [`HarnessError::NoBackendInHostgroup`] when there is none.
    pub async fn run_via_backend(
        &self,
        query: &str,
        database: &str,
        want_result: bool,
        hostgroup: u32,
    ) -> Result<Option<Rows>, HarnessError> {
        let candidates = self.resolver.direct_candidates(hostgroup).await?;
        let backend = BackendSelector::pick(&candidates)
            .ok_or(HarnessError::NoBackendInHostgroup { hostgroup })?;

        let endpoint = Endpoint::new(self.backend_host.clone(), backend.published_port);
        tracing::debug!(
            "backend {} (hostgroup {}, {}) [{}]: {}",
            backend.container_name,
            hostgroup,
            endpoint,
            database,
            query
        );

        self.sql
            .query(
                &endpoint,
                &self.backend_credentials,
                Some(database),
                query,
                want_result,
            )
            .await
    }
}
