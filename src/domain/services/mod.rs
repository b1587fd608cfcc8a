pub mod backend_selector;
pub mod naming;

pub use backend_selector::BackendSelector;
pub use naming::{hostgroup_of, parse_environment, port_of, resolve_address, NamingConvention};
