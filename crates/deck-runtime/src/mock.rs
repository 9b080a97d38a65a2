use crate::adapter::{ContainerEngine, ContainerStatus};
use crate::RuntimeError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// In-memory container engine for tests and dry development.
///
/// Tracks container status in a map and records which image directories
/// were built from, so orchestrator tests can assert the exact action
/// taken.
pub struct MockEngine {
    state: Mutex<HashMap<String, ContainerStatus>>,
    builds: Mutex<Vec<String>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self {
            state: Mutex::new(HashMap::new()),
            builds: Mutex::new(Vec::new()),
        }
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the status of a container ahead of a test.
    pub fn set_status(&self, container: &str, status: ContainerStatus) {
        self.state
            .lock()
            .expect("mock state lock")
            .insert(container.to_owned(), status);
    }

    /// Image directories passed to `build_and_start`, in call order.
    pub fn build_log(&self) -> Vec<String> {
        self.builds.lock().expect("mock build lock").clone()
    }
}

impl ContainerEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn available(&self) -> bool {
        true
    }

    fn detect_status(&self, container: &str) -> Result<ContainerStatus, RuntimeError> {
        let state = self.state.lock().expect("mock state lock");
        Ok(state
            .get(container)
            .copied()
            .unwrap_or(ContainerStatus::NotFound))
    }

    fn start(&self, container: &str) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().expect("mock state lock");
        match state.get(container) {
            Some(ContainerStatus::Stopped | ContainerStatus::Running) => {
                state.insert(container.to_owned(), ContainerStatus::Running);
                Ok(())
            }
            _ => Err(RuntimeError::ContainerNotFound(container.to_owned())),
        }
    }

    fn enter(&self, container: &str) -> Result<(), RuntimeError> {
        let state = self.state.lock().expect("mock state lock");
        match state.get(container) {
            Some(ContainerStatus::Running) => Ok(()),
            _ => Err(RuntimeError::ContainerNotFound(container.to_owned())),
        }
    }

    fn build_and_start(&self, image_dir: &Path, container: &str) -> Result<(), RuntimeError> {
        if !image_dir.is_dir() {
            return Err(RuntimeError::CommandFailed(format!(
                "image directory {} does not exist",
                image_dir.display()
            )));
        }
        self.builds
            .lock()
            .expect("mock build lock")
            .push(image_dir.display().to_string());
        self.state
            .lock()
            .expect("mock state lock")
            .insert(container.to_owned(), ContainerStatus::Running);
        Ok(())
    }
}
