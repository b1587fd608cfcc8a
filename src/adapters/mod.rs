//! Adapters Layer
//!
//! Outbound adapters binding the domain ports to Docker, the compose CLI
//! and MySQL.

pub mod outbound;

pub use outbound::{ComposeCli, DockerContainerRuntime, MysqlSqlClient};
