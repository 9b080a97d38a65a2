use crate::RuntimeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Externally observed state of a container, keyed by its name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContainerStatus {
    Running,
    Stopped,
    NotFound,
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerStatus::Running => write!(f, "running"),
            ContainerStatus::Stopped => write!(f, "stopped"),
            ContainerStatus::NotFound => write!(f, "not found"),
        }
    }
}

/// Seam between the orchestrator and a concrete container runtime.
///
/// All calls are synchronous and blocking; status queries are assumed to
/// answer from the runtime's own view of the world.
pub trait ContainerEngine: Send + Sync {
    fn name(&self) -> &str;

    fn available(&self) -> bool;

    fn detect_status(&self, container: &str) -> Result<ContainerStatus, RuntimeError>;

    /// Start an existing (stopped) container.
    fn start(&self, container: &str) -> Result<(), RuntimeError>;

    /// Attach an interactive session to a running container.
    fn enter(&self, container: &str) -> Result<(), RuntimeError>;

    /// Create and start a container from a built image directory.
    fn build_and_start(&self, image_dir: &Path, container: &str) -> Result<(), RuntimeError>;
}

pub fn select_engine(name: &str) -> Result<Box<dyn ContainerEngine>, RuntimeError> {
    match name {
        "compose" => Ok(Box::new(crate::compose::ComposeEngine::new())),
        "mock" => Ok(Box::new(crate::mock::MockEngine::new())),
        other => Err(RuntimeError::EngineUnavailable(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_valid_engines() {
        assert!(select_engine("compose").is_ok());
        assert!(select_engine("mock").is_ok());
    }

    #[test]
    fn select_invalid_engine_fails() {
        assert!(select_engine("nonexistent").is_err());
    }

    #[test]
    fn status_display() {
        assert_eq!(ContainerStatus::Running.to_string(), "running");
        assert_eq!(ContainerStatus::Stopped.to_string(), "stopped");
        assert_eq!(ContainerStatus::NotFound.to_string(), "not found");
    }
}
