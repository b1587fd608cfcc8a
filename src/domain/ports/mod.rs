mod compose_driver;
mod container_runtime;
mod sql_client;

pub use compose_driver::{ComposeCommand, ComposeDriver};
pub use container_runtime::ContainerRuntime;
pub use sql_client::SqlClient;
