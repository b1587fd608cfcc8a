//! Docker Container Runtime
//!
//! Implements ContainerRuntime on the Docker Engine API through bollard.
//! The client is built from an explicit [`DockerConnection`]; nothing is
//! discovered from the ambient environment here.

use crate::config::DockerConnection;
use crate::domain::entities::{ContainerRecord, ExecOutput, PortMapping};
use crate::domain::errors::HarnessError;
use crate::domain::ports::ContainerRuntime;
use async_trait::async_trait;
use bollard::container::{ListContainersOptions, LogOutput};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::models::ContainerSummary;
use bollard::{Docker, API_DEFAULT_VERSION};
use futures::StreamExt;

/// Seconds before a Docker API request is abandoned.
const REQUEST_TIMEOUT_SECS: u64 = 120;

pub struct DockerContainerRuntime {
    docker: Docker,
}

impl DockerContainerRuntime {
    pub fn connect(connection: &DockerConnection) -> Result<Self, HarnessError> {
        let docker = match connection {
            DockerConnection::LocalDefaults => Docker::connect_with_local_defaults(),
            DockerConnection::Socket(path) => {
                Docker::connect_with_socket(path, REQUEST_TIMEOUT_SECS, API_DEFAULT_VERSION)
            }
            DockerConnection::Http(addr) => {
                Docker::connect_with_http(addr, REQUEST_TIMEOUT_SECS, API_DEFAULT_VERSION)
            }
        }
        .map_err(|e| HarnessError::ContainerRuntime(format!("connecting to docker: {}", e)))?;

        tracing::debug!("docker client ready ({:?})", connection);
        Ok(Self { docker })
    }

    /// Convert an API summary into a record.
    ///
    /// The API reports names with a leading `/`; the first name is used.
    fn to_record(summary: ContainerSummary) -> ContainerRecord {
        let name = summary
            .names
            .as_ref()
            .and_then(|names| names.first())
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_default();

        let ports = summary
            .ports
            .unwrap_or_default()
            .into_iter()
            .map(|p| PortMapping {
                private_port: p.private_port,
                public_port: p.public_port,
            })
            .collect();

        ContainerRecord {
            name,
            image: summary.image.unwrap_or_default(),
            running: summary.state.as_deref() == Some("running"),
            ports,
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerContainerRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerRecord>, HarnessError> {
        // stopped containers are reported too and filtered by the caller
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };

        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| HarnessError::ContainerRuntime(format!("listing containers: {}", e)))?;

        Ok(summaries.into_iter().map(Self::to_record).collect())
    }

    async fn exec(&self, container: &str, command: &[String]) -> Result<ExecOutput, HarnessError> {
        let exec_err = |e: bollard::errors::Error| {
            HarnessError::ContainerRuntime(format!(
                "exec '{}' in {}: {}",
                command.join(" "),
                container,
                e
            ))
        };

        let exec = self
            .docker
            .create_exec(
                container,
                CreateExecOptions {
                    cmd: Some(command.to_vec()),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await
            .map_err(exec_err)?;

        let mut stdout = String::new();
        match self.docker.start_exec(&exec.id, None).await.map_err(exec_err)? {
            StartExecResults::Attached { mut output, .. } => {
                while let Some(chunk) = output.next().await {
                    match chunk.map_err(exec_err)? {
                        LogOutput::StdOut { message } => {
                            stdout.push_str(&String::from_utf8_lossy(&message));
                        }
                        LogOutput::StdErr { message } => {
                            tracing::debug!(
                                "{} stderr: {}",
                                container,
                                String::from_utf8_lossy(&message).trim_end()
                            );
                        }
                        _ => {}
                    }
                }
            }
            StartExecResults::Detached => {}
        }

        let inspect = self.docker.inspect_exec(&exec.id).await.map_err(exec_err)?;
        let exit_code = inspect.exit_code.ok_or_else(|| {
            HarnessError::ContainerRuntime(format!(
                "exec '{}' in {} reported no exit code",
                command.join(" "),
                container
            ))
        })?;

        Ok(ExecOutput { exit_code, stdout })
    }
}
