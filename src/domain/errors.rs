//! Harness Errors
//!
//! Every failure the harness can surface, named at the point of detection.

use std::fmt;

/// Lifecycle step that an orchestration failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    Stop,
    Remove,
    Build,
    Start,
    WaitReady,
    Seed,
    Configure,
}

impl SetupStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Remove => "remove",
            Self::Build => "build",
            Self::Start => "start",
            Self::WaitReady => "wait_ready",
            Self::Seed => "seed",
            Self::Configure => "configure",
        }
    }
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("no running container with an image matching '{marker}'")]
    NoProxyFound { marker: String },

    #[error("no backend containers found; nothing to register with the proxy")]
    NoBackendsFound,

    #[error("no backends with a publicly exposed port were found in hostgroup {hostgroup}")]
    NoBackendInHostgroup { hostgroup: u32 },

    #[error("topology parse error: {0}")]
    TopologyParse(String),

    #[error("address resolution error: {0}")]
    AddressResolution(String),

    #[error("environment setup failed at step '{step}': {reason}")]
    EnvironmentSetup { step: SetupStep, reason: String },

    #[error("container runtime error: {0}")]
    ContainerRuntime(String),

    #[error("sql error: {0}")]
    Sql(String),
}

impl HarnessError {
    pub fn setup(step: SetupStep, reason: impl Into<String>) -> Self {
        Self::EnvironmentSetup {
            step,
            reason: reason.into(),
        }
    }

    /// Step that failed, when this is an orchestration error.
    pub fn step(&self) -> Option<SetupStep> {
        match self {
            Self::EnvironmentSetup { step, .. } => Some(*step),
            _ => None,
        }
    }
}
