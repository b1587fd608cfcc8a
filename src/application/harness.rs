//! Harness - the per-test-class entry point
//!
//! Wires the application services together from an immutable
//! [`HarnessConfig`] and the three outbound ports. A test suite builds one
//! harness, calls [`setup`](Harness::setup) once, runs its queries and
//! finishes with [`teardown`](Harness::teardown).

use crate::application::{
    EnvironmentInspector, LifecycleController, LifecycleSettings, LifecycleState,
    ProxyConfigurator, QueryRunner, TopologyResolver,
};
use crate::config::HarnessConfig;
use crate::domain::entities::{BackendDescriptor, RoutingEntry};
use crate::domain::errors::HarnessError;
use crate::domain::ports::{ComposeDriver, ContainerRuntime, SqlClient};
use crate::domain::services::NamingConvention;
use crate::domain::value_objects::Rows;
use crate::infrastructure::ReadinessConfig;
use std::sync::Arc;

pub struct Harness {
    resolver: Arc<TopologyResolver>,
    configurator: Arc<ProxyConfigurator>,
    runner: QueryRunner,
    lifecycle: LifecycleController,
}

impl Harness {
    pub fn new(
        config: &HarnessConfig,
        runtime: Arc<dyn ContainerRuntime>,
        sql: Arc<dyn SqlClient>,
        compose: Arc<dyn ComposeDriver>,
    ) -> Self {
        let inspector = Arc::new(EnvironmentInspector::new(
            runtime,
            NamingConvention::new(config.proxy_marker.clone()),
        ));
        let resolver = Arc::new(TopologyResolver::new(inspector.clone(), config.backend_port));

        let configurator = Arc::new(ProxyConfigurator::new(
            resolver.clone(),
            sql.clone(),
            config.admin_endpoint(),
            config.admin_credentials.clone(),
        ));

        let runner = QueryRunner::new(
            resolver.clone(),
            sql.clone(),
            config.client_endpoint(),
            config.client_credentials.clone(),
            config.host.clone(),
            config.backend_credentials.clone(),
        );

        let lifecycle = LifecycleController::new(
            compose,
            inspector,
            configurator.clone(),
            sql,
            LifecycleSettings {
                seed_command: config.seed_command(),
                ready_command: config.ready_command.clone(),
                readiness: ReadinessConfig {
                    timeout: config.ready_timeout,
                    initial_interval: config.ready_interval,
                    max_interval: config.ready_max_interval,
                },
                admin_endpoint: config.admin_endpoint(),
                admin_credentials: config.admin_credentials.clone(),
            },
        );

        Self {
            resolver,
            configurator,
            runner,
            lifecycle,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn inspector(&self) -> &EnvironmentInspector {
        self.resolver.inspector()
    }

    pub fn resolver(&self) -> &TopologyResolver {
        &self.resolver
    }

    pub fn runner(&self) -> &QueryRunner {
        &self.runner
    }

    /// Bring the environment up and register the backends with the proxy.
    pub async fn setup(&mut self) -> Result<Vec<RoutingEntry>, HarnessError> {
        self.lifecycle.setup().await
    }

    /// Stop and remove all containers.
    pub async fn teardown(&mut self) -> Result<(), HarnessError> {
        self.lifecycle.teardown().await
    }

    /// Tear down and release the harness.
    pub async fn shutdown(mut self) -> Result<(), HarnessError> {
        self.teardown().await
    }

    /// Register backends with an already running proxy.
    pub async fn populate_backends(&self) -> Result<Vec<RoutingEntry>, HarnessError> {
        self.configurator.populate_backends().await
    }

    pub async fn backends(&self) -> Result<Vec<BackendDescriptor>, HarnessError> {
        self.resolver.resolve_backends().await
    }

    pub async fn run_via_proxy(
        &self,
        query: &str,
        database: &str,
        want_result: bool,
    ) -> Result<Option<Rows>, HarnessError> {
        self.runner.run_via_proxy(query, database, want_result).await
    }

    pub async fn run_via_backend(
        &self,
        query: &str,
        database: &str,
        want_result: bool,
        hostgroup: u32,
    ) -> Result<Option<Rows>, HarnessError> {
        self.runner
            .run_via_backend(query, database, want_result, hostgroup)
            .await
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if self.lifecycle.state() != LifecycleState::Stopped {
            tracing::warn!(
                "harness dropped in state {:?} without teardown; containers are still running",
                self.lifecycle.state()
            );
        }
    }
}
