//! Lifecycle Controller
//!
//! Brings the compose environment up for a test run and down afterwards:
//!
//! ```text
//! Stopped -> Built -> Started -> Ready -> Seeded -> Configured -> Stopped
//! ```
//!
//! Every step checks its outcome. The first failing step aborts setup with
//! [`HarnessError::EnvironmentSetup`] naming that step, so a broken
//! environment never reaches the tests.

use crate::application::{EnvironmentInspector, ProxyConfigurator};
use crate::domain::entities::{Credentials, Endpoint, RoutingEntry};
use crate::domain::errors::{HarnessError, SetupStep};
use crate::domain::ports::{ComposeCommand, ComposeDriver, SqlClient};
use crate::infrastructure::{ReadinessConfig, ReadinessPoller};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Built,
    Started,
    Ready,
    Seeded,
    Configured,
}

/// Commands and endpoints the controller needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    /// Run in each backend to load its schema dump
    pub seed_command: Vec<String>,
    /// Run in each backend; exit code 0 means MySQL accepts connections
    pub ready_command: Vec<String>,
    pub readiness: ReadinessConfig,
    pub admin_endpoint: Endpoint,
    pub admin_credentials: Credentials,
}

pub struct LifecycleController {
    compose: Arc<dyn ComposeDriver>,
    inspector: Arc<EnvironmentInspector>,
    configurator: Arc<ProxyConfigurator>,
    sql: Arc<dyn SqlClient>,
    settings: LifecycleSettings,
    state: LifecycleState,
}

impl LifecycleController {
    pub fn new(
        compose: Arc<dyn ComposeDriver>,
        inspector: Arc<EnvironmentInspector>,
        configurator: Arc<ProxyConfigurator>,
        sql: Arc<dyn SqlClient>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            compose,
            inspector,
            configurator,
            sql,
            settings,
            state: LifecycleState::Stopped,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Tear down leftovers, then build, start, wait, seed and configure.
    ///
    /// Returns the routing entries registered with the proxy.
    pub async fn setup(&mut self) -> Result<Vec<RoutingEntry>, HarnessError> {
        self.teardown().await?;

        self.compose_step(ComposeCommand::Build, SetupStep::Build).await?;
        self.state = LifecycleState::Built;

        self.compose_step(ComposeCommand::Up, SetupStep::Start).await?;
        self.state = LifecycleState::Started;

        self.wait_ready().await?;
        self.state = LifecycleState::Ready;

        self.seed_backends().await?;
        self.state = LifecycleState::Seeded;

        let entries = self
            .configurator
            .populate_backends()
            .await
            .map_err(|e| HarnessError::setup(SetupStep::Configure, e.to_string()))?;
        self.state = LifecycleState::Configured;

        tracing::info!("environment configured with {} backend(s)", entries.len());
        Ok(entries)
    }

    /// Stop and force-remove all containers.
    ///
    /// Safe to call when nothing is running.
    pub async fn teardown(&mut self) -> Result<(), HarnessError> {
        self.compose_step(ComposeCommand::Stop, SetupStep::Stop).await?;
        self.compose_step(ComposeCommand::Remove, SetupStep::Remove).await?;
        self.state = LifecycleState::Stopped;
        Ok(())
    }

    async fn compose_step(
        &self,
        command: ComposeCommand,
        step: SetupStep,
    ) -> Result<(), HarnessError> {
        tracing::info!("environment step: {}", step);
        self.compose
            .run(command)
            .await
            .map_err(|e| HarnessError::setup(step, e.to_string()))
    }

    async fn wait_ready(&self) -> Result<(), HarnessError> {
        tracing::info!("environment step: {}", SetupStep::WaitReady);
        let poller = ReadinessPoller::new(self.settings.readiness.clone());

        let ready = poller
            .poll("environment", move || self.probe_environment())
            .await
            .map_err(|not_ready| {
                HarnessError::setup(
                    SetupStep::WaitReady,
                    format!(
                        "not ready after {} attempt(s): {}",
                        not_ready.attempts, not_ready.last_error
                    ),
                )
            })?;

        tracing::info!(
            "environment ready after {} attempt(s) in {:?}",
            ready.attempts,
            ready.elapsed
        );
        Ok(())
    }

    /// One readiness probe: every backend answers its ready command and the
    /// proxy admin interface accepts a session.
    async fn probe_environment(&self) -> Result<(), String> {
        let backends = self
            .inspector
            .list_backend_containers()
            .await
            .map_err(|e| e.to_string())?;

        for backend in &backends {
            let output = self
                .inspector
                .run_in_container(&backend.name, &self.settings.ready_command)
                .await
                .map_err(|e| e.to_string())?;
            if !output.success() {
                return Err(format!(
                    "backend {} not accepting connections (exit code {})",
                    backend.name, output.exit_code
                ));
            }
        }

        self.inspector
            .proxy_container()
            .await
            .map_err(|e| e.to_string())?;

        self.sql
            .ping(&self.settings.admin_endpoint, &self.settings.admin_credentials)
            .await
            .map_err(|e| e.to_string())
    }

    async fn seed_backends(&self) -> Result<(), HarnessError> {
        tracing::info!("environment step: {}", SetupStep::Seed);
        let backends = self
            .inspector
            .list_backend_containers()
            .await
            .map_err(|e| HarnessError::setup(SetupStep::Seed, e.to_string()))?;

        for backend in &backends {
            let output = self
                .inspector
                .run_in_container(&backend.name, &self.settings.seed_command)
                .await
                .map_err(|e| HarnessError::setup(SetupStep::Seed, e.to_string()))?;

            if !output.success() {
                return Err(HarnessError::setup(
                    SetupStep::Seed,
                    format!(
                        "'{}' in {} exited with code {}",
                        self.settings.seed_command.join(" "),
                        backend.name,
                        output.exit_code
                    ),
                ));
            }
            tracing::debug!("seeded {}", backend.name);
        }
        Ok(())
    }
}
