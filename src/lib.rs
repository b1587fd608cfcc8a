//! proxysql-harness Library
//!
//! Integration-test harness for ProxySQL: discovers the containerized
//! topology, registers backends with the proxy and routes queries either
//! through the proxy or straight to a backend of a given hostgroup.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{Harness, LifecycleState};
pub use bootstrap::docker_harness;
pub use config::{load_config, HarnessConfig};
pub use domain::entities::{BackendDescriptor, Credentials, Endpoint, RoutingEntry};
pub use domain::ports::{ComposeCommand, ComposeDriver, ContainerRuntime, SqlClient};
pub use domain::services::NamingConvention;
pub use domain::{ContainerRole, HarnessError, Rows, SetupStep, SqlValue};
