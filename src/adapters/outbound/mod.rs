mod compose_cli;
mod docker_container_runtime;
mod mysql_sql_client;

pub use compose_cli::ComposeCli;
pub use docker_container_runtime::DockerContainerRuntime;
pub use mysql_sql_client::MysqlSqlClient;
