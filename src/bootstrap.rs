//! Wiring of the real adapters into a [`Harness`].

use crate::adapters::{ComposeCli, DockerContainerRuntime, MysqlSqlClient};
use crate::application::Harness;
use crate::config::HarnessConfig;
use crate::domain::errors::HarnessError;
use std::sync::Arc;

/// Build a harness backed by Docker, the compose CLI and MySQL.
pub fn docker_harness(config: &HarnessConfig) -> Result<Harness, HarnessError> {
    let runtime = Arc::new(DockerContainerRuntime::connect(&config.docker)?);
    let sql = Arc::new(MysqlSqlClient::new());
    let compose = Arc::new(ComposeCli::new(
        config.compose_program.clone(),
        config.compose_dir.clone(),
    ));

    tracing::debug!(
        "harness wired: compose '{}' in {}, docker {:?}",
        config.compose_program,
        config.compose_dir.display(),
        config.docker
    );

    Ok(Harness::new(config, runtime, sql, compose))
}
