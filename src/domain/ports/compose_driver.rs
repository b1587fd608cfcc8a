//! Compose Driver Port
//!
//! Defines the interface for building, starting and removing the
//! multi-container environment described by a compose file.

use crate::domain::errors::HarnessError;
use async_trait::async_trait;

/// Subcommands the harness issues against the compose environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeCommand {
    Build,
    Up,
    Stop,
    Remove,
}

impl ComposeCommand {
    /// Arguments passed to the compose program.
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            Self::Build => &["build"],
            Self::Up => &["up", "-d"],
            Self::Stop => &["stop"],
            Self::Remove => &["rm", "--force"],
        }
    }
}

/// Drives the compose environment.
///
/// Implementations must report a non-zero exit as an error.
#[async_trait]
pub trait ComposeDriver: Send + Sync {
    async fn run(&self, command: ComposeCommand) -> Result<(), HarnessError>;
}
