use crate::transition::TransitionEngine;
use crate::CoreError;
use deck_runtime::{ContainerEngine, ContainerStatus};
use deck_store::{BuildStatus, DeckLayout, MetadataStore, NameAllocator};
use serde::Serialize;
use tracing::info;

/// Action chosen for a target image, keyed by observed container state.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum WorkflowAction {
    /// Container running: attach, no file mutation.
    Enter,
    /// Container stopped: start it again.
    Restart,
    /// No container. `full_build` means the image directory had to be
    /// promoted from a custom configuration first.
    BuildAndStart { full_build: bool },
}

impl std::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowAction::Enter => write!(f, "enter"),
            WorkflowAction::Restart => write!(f, "restart"),
            WorkflowAction::BuildAndStart { full_build: false } => write!(f, "build-and-start"),
            WorkflowAction::BuildAndStart { full_build: true } => {
                write!(f, "build-and-start (full)")
            }
        }
    }
}

/// Outcome of one workflow decision, with the partial message trail on
/// failure. Filesystem state created before a failure stays in place.
#[derive(Debug, Serialize)]
pub struct WorkflowReport {
    pub success: bool,
    pub action: WorkflowAction,
    pub messages: Vec<String>,
}

/// Decides and runs the right action for a target image name based on the
/// container engine's view of the world.
pub struct WorkflowOrchestrator {
    layout: DeckLayout,
    transition: TransitionEngine,
    engine: Box<dyn ContainerEngine>,
}

impl WorkflowOrchestrator {
    pub fn new(layout: DeckLayout, engine: Box<dyn ContainerEngine>) -> Self {
        let transition = TransitionEngine::new(layout.clone());
        Self {
            layout,
            transition,
            engine,
        }
    }

    /// Resolve `target` to an image name. A name whose image directory
    /// exists is used as-is; otherwise the direct-build shortcut maps a
    /// custom configuration name to `<name>-build`.
    pub fn resolve_image_name(&self, target: &str) -> String {
        if self.layout.image_path(target).is_dir() {
            return target.to_owned();
        }
        if self.layout.custom_path(target).is_dir() {
            return NameAllocator::image_build_name(target);
        }
        target.to_owned()
    }

    /// Run the decision table for `image_name`:
    ///
    /// | container state | action |
    /// |---|---|
    /// | running | enter |
    /// | stopped | restart |
    /// | not found, image dir exists | build-and-start from the image dir |
    /// | not found, no image dir | promote the custom config, then build-and-start |
    ///
    /// Every successful branch stamps `last_started`; build branches also
    /// move `build_status` to `Running`.
    pub fn up(&self, image_name: &str) -> Result<WorkflowReport, CoreError> {
        let status = self.engine.detect_status(image_name)?;
        info!("container '{image_name}' is {status}");

        let image_dir = self.layout.image_path(image_name);
        let mut messages = vec![format!("container '{image_name}': {status}")];

        let (action, result) = match status {
            ContainerStatus::Running => {
                messages.push("attaching to running container".to_owned());
                (WorkflowAction::Enter, self.engine.enter(image_name))
            }
            ContainerStatus::Stopped => {
                messages.push("restarting stopped container".to_owned());
                (WorkflowAction::Restart, self.engine.start(image_name))
            }
            ContainerStatus::NotFound if image_dir.is_dir() => {
                messages.push(format!(
                    "building and starting from existing image {}",
                    image_dir.display()
                ));
                (
                    WorkflowAction::BuildAndStart { full_build: false },
                    self.engine.build_and_start(&image_dir, image_name),
                )
            }
            ContainerStatus::NotFound => {
                let custom_base = image_name.strip_suffix("-build").unwrap_or(image_name);
                let custom_dir = self.layout.custom_path(custom_base);
                if !custom_dir.is_dir() {
                    return Err(CoreError::NotFound(format!(
                        "no image or custom configuration for '{image_name}'"
                    )));
                }
                messages.push(format!(
                    "promoting custom '{custom_base}' and starting '{image_name}'"
                ));
                let action = WorkflowAction::BuildAndStart { full_build: true };
                match self.transition.promote_custom_to_image(image_name, &custom_dir) {
                    Ok(built_dir) => {
                        messages.push(format!("image written to {}", built_dir.display()));
                        (action, self.engine.build_and_start(&built_dir, image_name))
                    }
                    Err(e) => {
                        messages.push(format!("promotion failed: {e}"));
                        return Ok(WorkflowReport {
                            success: false,
                            action,
                            messages,
                        });
                    }
                }
            }
        };

        match result {
            Ok(()) => {
                let status_update = match action {
                    WorkflowAction::BuildAndStart { .. } => Some(BuildStatus::Running),
                    WorkflowAction::Enter | WorkflowAction::Restart => None,
                };
                MetadataStore::touch_started(&self.layout.image_path(image_name), status_update)?;
                messages.push(format!("{action}: ok"));
                Ok(WorkflowReport {
                    success: true,
                    action,
                    messages,
                })
            }
            Err(e) => {
                messages.push(format!("{action}: {e}"));
                Ok(WorkflowReport {
                    success: false,
                    action,
                    messages,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_runtime::MockEngine;
    use deck_store::ImageMetadata;
    use std::fs;
    use std::path::Path;

    fn setup() -> (tempfile::TempDir, DeckLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = DeckLayout::new(dir.path());
        layout.initialize().unwrap();
        (dir, layout)
    }

    fn make_config(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(".env"), format!("PROJECT_NAME={name}\n")).unwrap();
        fs::write(dir.join("compose.yaml"), "services: {}\n").unwrap();
        fs::write(dir.join("Dockerfile"), "FROM scratch\n").unwrap();
    }

    fn make_image_with_ledger(layout: &DeckLayout, name: &str) {
        let dir = layout.image_path(name);
        make_config(&dir, name);
        let meta = ImageMetadata::new(name, "t", Path::new("/nowhere"));
        MetadataStore::write(&dir, &meta).unwrap();
    }

    fn orchestrator(layout: &DeckLayout, mock: MockEngine) -> WorkflowOrchestrator {
        WorkflowOrchestrator::new(layout.clone(), Box::new(mock))
    }

    #[test]
    fn running_container_is_entered() {
        let (_dir, layout) = setup();
        make_image_with_ledger(&layout, "web-001-build");
        let mock = MockEngine::new();
        mock.set_status("web-001-build", ContainerStatus::Running);

        let report = orchestrator(&layout, mock).up("web-001-build").unwrap();
        assert!(report.success);
        assert_eq!(report.action, WorkflowAction::Enter);

        let meta = MetadataStore::read(&layout.image_path("web-001-build"))
            .unwrap()
            .unwrap();
        assert!(meta.last_started.is_some());
        // Enter does not touch build status.
        assert_eq!(meta.build_status, BuildStatus::Built);
    }

    #[test]
    fn stopped_container_is_restarted() {
        let (_dir, layout) = setup();
        make_image_with_ledger(&layout, "web-001-build");
        let mock = MockEngine::new();
        mock.set_status("web-001-build", ContainerStatus::Stopped);

        let report = orchestrator(&layout, mock).up("web-001-build").unwrap();
        assert!(report.success);
        assert_eq!(report.action, WorkflowAction::Restart);
    }

    #[test]
    fn missing_container_with_image_dir_builds_and_starts() {
        let (_dir, layout) = setup();
        make_image_with_ledger(&layout, "web-001-build");

        let report = orchestrator(&layout, MockEngine::new())
            .up("web-001-build")
            .unwrap();
        assert!(report.success);
        assert_eq!(
            report.action,
            WorkflowAction::BuildAndStart { full_build: false }
        );

        let meta = MetadataStore::read(&layout.image_path("web-001-build"))
            .unwrap()
            .unwrap();
        assert!(meta.last_started.is_some());
        assert_eq!(meta.build_status, BuildStatus::Running);
    }

    #[test]
    fn missing_everything_promotes_custom_first() {
        let (_dir, layout) = setup();
        make_config(&layout.custom_path("web-001"), "web-001");

        let report = orchestrator(&layout, MockEngine::new())
            .up("web-001-build")
            .unwrap();
        assert!(report.success);
        assert_eq!(
            report.action,
            WorkflowAction::BuildAndStart { full_build: true }
        );
        assert!(layout.image_path("web-001-build").is_dir());

        let meta = MetadataStore::read(&layout.image_path("web-001-build"))
            .unwrap()
            .unwrap();
        assert_eq!(meta.build_status, BuildStatus::Running);
        assert!(meta.last_started.is_some());
    }

    #[test]
    fn unknown_target_is_not_found() {
        let (_dir, layout) = setup();
        let err = orchestrator(&layout, MockEngine::new())
            .up("ghost-build")
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn incomplete_custom_fails_without_rollback() {
        let (_dir, layout) = setup();
        let custom = layout.custom_path("web-001");
        fs::create_dir_all(&custom).unwrap();
        fs::write(custom.join(".env"), "").unwrap();

        let report = orchestrator(&layout, MockEngine::new())
            .up("web-001-build")
            .unwrap();
        assert!(!report.success);
        assert!(report
            .messages
            .iter()
            .any(|m| m.contains("promotion failed")));
    }

    #[test]
    fn resolve_image_name_prefers_existing_image() {
        let (_dir, layout) = setup();
        make_image_with_ledger(&layout, "web-001-build");
        make_config(&layout.custom_path("web-001"), "web-001");
        let orch = orchestrator(&layout, MockEngine::new());

        assert_eq!(orch.resolve_image_name("web-001-build"), "web-001-build");
        // A bare custom name maps through the direct-build shortcut.
        assert_eq!(orch.resolve_image_name("web-001"), "web-001-build");
        assert_eq!(orch.resolve_image_name("other"), "other");
    }
}
