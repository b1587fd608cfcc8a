//! Application Layer
//!
//! Use cases of the harness, built on the domain ports.

mod environment_inspector;
mod harness;
mod lifecycle;
mod proxy_configurator;
mod query_runner;
mod topology_resolver;

#[cfg(test)]
pub(crate) mod test_support;

pub use environment_inspector::EnvironmentInspector;
pub use harness::Harness;
pub use lifecycle::{LifecycleController, LifecycleSettings, LifecycleState};
pub use proxy_configurator::{render_insert, ProxyConfigurator, LOAD_SERVERS_TO_RUNTIME};
pub use query_runner::QueryRunner;
pub use topology_resolver::TopologyResolver;
