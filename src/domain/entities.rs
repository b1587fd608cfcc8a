//! Domain Entities - Core business objects
//!
//! Snapshots of the container runtime and the topology derived from them.
//! Nothing here is cached: every entity is rebuilt from live runtime state.

use crate::domain::value_objects::ServerStatus;
use serde::Serialize;
use std::fmt;

/// A port exposed by a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortMapping {
    /// Port inside the container
    pub private_port: u16,
    /// Port published on the host, if any
    pub public_port: Option<u16>,
}

/// Read-only snapshot of a running container.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerRecord {
    /// Container name without the runtime's leading `/`
    pub name: String,
    /// Image the container was started from
    pub image: String,
    /// Whether the runtime reports the container as running
    pub running: bool,
    /// Exposed ports
    pub ports: Vec<PortMapping>,
}

impl ContainerRecord {
    /// Host port that `private_port` is published on.
    pub fn published_port(&self, private_port: u16) -> Option<u16> {
        self.ports
            .iter()
            .filter(|p| p.private_port == private_port)
            .find_map(|p| p.public_port)
    }
}

/// Output of a command executed inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i64,
    pub stdout: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A backend as the proxy should see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendDescriptor {
    pub container_name: String,
    pub hostgroup: u32,
    /// Address on the container network
    pub ip: String,
    /// MySQL port on the container network
    pub port: u16,
    /// Host port the MySQL port is published on
    pub published_port: Option<u16>,
}

/// A backend that can be reached directly from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCandidate {
    pub container_name: String,
    pub hostgroup: u32,
    pub published_port: u16,
}

/// One row of the proxy's `mysql_servers` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingEntry {
    pub hostgroup_id: u32,
    pub hostname: String,
    pub port: u16,
    pub status: ServerStatus,
}

impl From<&BackendDescriptor> for RoutingEntry {
    fn from(backend: &BackendDescriptor) -> Self {
        Self {
            hostgroup_id: backend.hostgroup,
            hostname: backend.ip.clone(),
            port: backend.port,
            status: ServerStatus::Online,
        }
    }
}

/// Username/password pair for one role (admin, client, backend).
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Host and port of a MySQL-protocol endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
