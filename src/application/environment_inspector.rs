//! Environment Inspector
//!
//! Reads the running topology from the container runtime: which container
//! is the proxy, which are backends, and what a container's environment is.

use crate::domain::entities::{ContainerRecord, ExecOutput};
use crate::domain::errors::HarnessError;
use crate::domain::ports::ContainerRuntime;
use crate::domain::services::{parse_environment, NamingConvention};
use crate::domain::value_objects::ContainerRole;
use std::collections::HashMap;
use std::sync::Arc;

pub struct EnvironmentInspector {
    runtime: Arc<dyn ContainerRuntime>,
    naming: NamingConvention,
}

impl EnvironmentInspector {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, naming: NamingConvention) -> Self {
        Self { runtime, naming }
    }

    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    /// Containers the runtime reports as running.
    async fn running_containers(&self) -> Result<Vec<ContainerRecord>, HarnessError> {
        let mut containers = self.runtime.list_containers().await?;
        containers.retain(|c| c.running);
        Ok(containers)
    }

    /// Containers classified as the proxy.
    pub async fn list_proxy_containers(&self) -> Result<Vec<ContainerRecord>, HarnessError> {
        let containers = self.running_containers().await?;
        Ok(containers
            .into_iter()
            .filter(|c| self.naming.classify(c) == ContainerRole::Proxy)
            .collect())
    }

    /// The proxy container.
    ///
    /// Exactly one is expected; if several match, the first listed wins.
    pub async fn proxy_container(&self) -> Result<ContainerRecord, HarnessError> {
        self.list_proxy_containers()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HarnessError::NoProxyFound {
                marker: self.naming.proxy_marker().to_string(),
            })
    }

    /// Every container that is not the proxy, recognized or not.
    pub async fn list_backend_containers(&self) -> Result<Vec<ContainerRecord>, HarnessError> {
        let containers = self.running_containers().await?;
        Ok(containers
            .into_iter()
            .filter(|c| self.naming.classify(c) != ContainerRole::Proxy)
            .collect())
    }

    /// Backend containers paired with their hostgroup.
    ///
    /// A container that is neither the proxy nor a well-named backend fails
    /// the call instead of being skipped.
    pub async fn list_backends(&self) -> Result<Vec<(ContainerRecord, u32)>, HarnessError> {
        let mut backends = Vec::new();
        for container in self.running_containers().await? {
            if let Some(hostgroup) = self.naming.try_classify(&container)?.hostgroup() {
                backends.push((container, hostgroup));
            }
        }
        Ok(backends)
    }

    /// Run a command inside a container.
    pub async fn run_in_container(
        &self,
        container_name: &str,
        command: &[String],
    ) -> Result<ExecOutput, HarnessError> {
        self.runtime.exec(container_name, command).await
    }

    /// Environment variables of a container, read by running `env` in it.
    pub async fn read_environment(
        &self,
        container_name: &str,
    ) -> Result<HashMap<String, String>, HarnessError> {
        let output = self
            .run_in_container(container_name, &["env".to_string()])
            .await?;

        if !output.success() {
            return Err(HarnessError::ContainerRuntime(format!(
                "env in container '{}' exited with code {}",
                container_name, output.exit_code
            )));
        }

        let env = parse_environment(&output.stdout)?;
        tracing::debug!(
            "read {} environment variables from {}",
            env.len(),
            container_name
        );
        Ok(env)
    }
}
