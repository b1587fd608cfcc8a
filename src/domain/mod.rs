//! Domain Layer
//!
//! Topology entities, the naming convention, and the ports through which
//! the harness reaches the container runtime, the compose CLI and MySQL.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use errors::{HarnessError, SetupStep};
pub use value_objects::{ContainerRole, Rows, ServerStatus, SqlValue};
