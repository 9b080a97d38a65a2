use crate::adapter::{ContainerEngine, ContainerStatus};
use crate::RuntimeError;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Adapter driving `docker compose` and the `docker` CLI.
#[derive(Debug, Default)]
pub struct ComposeEngine;

impl ComposeEngine {
    pub fn new() -> Self {
        Self
    }

    fn run_checked(mut cmd: Command) -> Result<(), RuntimeError> {
        debug!("running {cmd:?}");
        let output = cmd.output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(RuntimeError::CommandFailed(format!(
                "{cmd:?}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

impl ContainerEngine for ComposeEngine {
    fn name(&self) -> &str {
        "compose"
    }

    fn available(&self) -> bool {
        Command::new("docker")
            .args(["compose", "version"])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn detect_status(&self, container: &str) -> Result<ContainerStatus, RuntimeError> {
        let output = Command::new("docker")
            .args([
                "ps",
                "-a",
                "--filter",
                &format!("name=^/{container}$"),
                "--format",
                "{{.State}}",
            ])
            .output()?;
        if !output.status.success() {
            return Err(RuntimeError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            ));
        }
        let state = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        Ok(match state.as_str() {
            "" => ContainerStatus::NotFound,
            "running" => ContainerStatus::Running,
            _ => ContainerStatus::Stopped,
        })
    }

    fn start(&self, container: &str) -> Result<(), RuntimeError> {
        let mut cmd = Command::new("docker");
        cmd.args(["start", container]);
        Self::run_checked(cmd)
    }

    fn enter(&self, container: &str) -> Result<(), RuntimeError> {
        // Interactive attach inherits the caller's terminal.
        let status = Command::new("docker")
            .args(["exec", "-it", container, "/bin/sh"])
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(RuntimeError::CommandFailed(format!(
                "docker exec into '{container}' exited with {status}"
            )))
        }
    }

    fn build_and_start(&self, image_dir: &Path, container: &str) -> Result<(), RuntimeError> {
        let mut cmd = Command::new("docker");
        cmd.args(["compose", "up", "-d", "--build"])
            .current_dir(image_dir);
        debug!("building and starting '{container}' from {}", image_dir.display());
        Self::run_checked(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Anything beyond construction needs a docker daemon; the engine's
    // behavior is covered through MockEngine in deck-core.
    #[test]
    fn engine_reports_its_name() {
        assert_eq!(ComposeEngine::new().name(), "compose");
    }
}
