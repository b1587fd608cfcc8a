//! Infrastructure Layer
//!
//! Cross-cutting concerns shared by the application services.

pub mod readiness;

pub use readiness::{Backoff, NotReady, ReadinessConfig, ReadinessPoller, ReadyAfter};
