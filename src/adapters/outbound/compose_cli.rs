//! Compose CLI Driver
//!
//! Implements ComposeDriver by running the compose program as a child
//! process in the directory holding the compose file.

use crate::domain::errors::HarnessError;
use crate::domain::ports::{ComposeCommand, ComposeDriver};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

/// Trailing stderr kept in error messages.
const STDERR_TAIL_LINES: usize = 20;

pub struct ComposeCli {
    program: String,
    project_dir: PathBuf,
}

impl ComposeCli {
    pub fn new(program: impl Into<String>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            project_dir: project_dir.into(),
        }
    }

    fn describe(&self, command: ComposeCommand) -> String {
        format!("{} {}", self.program, command.args().join(" "))
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait]
impl ComposeDriver for ComposeCli {
    async fn run(&self, command: ComposeCommand) -> Result<(), HarnessError> {
        let description = self.describe(command);
        tracing::debug!("running '{}' in {}", description, self.project_dir.display());

        let output = Command::new(&self.program)
            .args(command.args())
            .current_dir(&self.project_dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| HarnessError::ContainerRuntime(format!("spawning '{}': {}", description, e)))?;

        if !output.status.success() {
            return Err(HarnessError::ContainerRuntime(format!(
                "'{}' failed with {}: {}",
                description,
                output.status,
                stderr_tail(&output.stderr)
            )));
        }

        Ok(())
    }
}
