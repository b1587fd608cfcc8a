//! Container Runtime Port
//!
//! Defines the interface for inspecting containers and running commands
//! inside them. Implementations talk to Docker; tests use in-memory fakes.

use crate::domain::entities::{ContainerRecord, ExecOutput};
use crate::domain::errors::HarnessError;
use async_trait::async_trait;

/// Read-mostly view of the container runtime.
///
/// The harness never caches what this returns: topology is resolved from a
/// fresh listing every time.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List running containers.
    async fn list_containers(&self) -> Result<Vec<ContainerRecord>, HarnessError>;

    /// Run `command` inside `container` and capture its stdout and exit code.
    ///
    /// A non-zero exit code is reported in [`ExecOutput`], not as an error;
    /// callers decide what a failed command means.
    async fn exec(&self, container: &str, command: &[String]) -> Result<ExecOutput, HarnessError>;
}
