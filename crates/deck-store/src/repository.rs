use crate::layout::DeckLayout;
use crate::metadata::{ImageMetadata, MetadataStore};
use crate::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Files every valid custom or image configuration must carry.
pub const REQUIRED_FILES: [&str; 3] = [".env", "compose.yaml", "Dockerfile"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Layer {
    Template,
    Custom,
    Image,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::Template => write!(f, "template"),
            Layer::Custom => write!(f, "custom"),
            Layer::Image => write!(f, "image"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProjectType {
    Rust,
    Node,
    Python,
    Go,
    #[default]
    Unknown,
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectType::Rust => write!(f, "rust"),
            ProjectType::Node => write!(f, "node"),
            ProjectType::Python => write!(f, "python"),
            ProjectType::Go => write!(f, "go"),
            ProjectType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Snapshot of one entry in one layer. Unique per `(layer, name)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub name: String,
    pub layer: Layer,
    pub path: PathBuf,
    pub available: bool,
    pub last_modified: DateTime<Utc>,
    pub project_type: ProjectType,
    pub metadata: Option<ImageMetadata>,
}

pub fn validate_resource_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name.len() > 64 {
        return Err(StoreError::InvalidName(
            "resource name must be 1-64 characters".to_owned(),
        ));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(StoreError::InvalidName(
            "resource name must match [a-zA-Z0-9_-]".to_owned(),
        ));
    }
    Ok(())
}

/// Fixed manifest-file rule set for project type detection.
fn detect_project_type(dir: &Path) -> ProjectType {
    if dir.join("Cargo.toml").exists() {
        ProjectType::Rust
    } else if dir.join("package.json").exists() {
        ProjectType::Node
    } else if dir.join("pyproject.toml").exists() || dir.join("requirements.txt").exists() {
        ProjectType::Python
    } else if dir.join("go.mod").exists() {
        ProjectType::Go
    } else {
        ProjectType::Unknown
    }
}

/// Enumerates the entries of the three configuration layers as
/// [`ResourceDescriptor`]s. Read-only; every call reflects the tree as it
/// is on disk at call time.
pub struct LayerRepository {
    layout: DeckLayout,
}

impl LayerRepository {
    pub fn new(layout: DeckLayout) -> Self {
        Self { layout }
    }

    /// Templates, sorted alphabetically. Always `available`.
    pub fn list_templates(&self) -> Result<Vec<ResourceDescriptor>, StoreError> {
        let mut entries = Vec::new();
        for (name, path) in subdirs(&self.layout.templates_dir())? {
            entries.push(ResourceDescriptor {
                last_modified: mtime(&path)?,
                project_type: detect_project_type(&path),
                name,
                layer: Layer::Template,
                path,
                available: true,
                metadata: None,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Custom configurations, most recently modified first.
    pub fn list_custom(&self) -> Result<Vec<ResourceDescriptor>, StoreError> {
        let mut entries = Vec::new();
        for (name, path) in subdirs(&self.layout.custom_dir())? {
            let available = self.missing_required_files(&path)?.is_empty();
            entries.push(ResourceDescriptor {
                last_modified: mtime(&path)?,
                project_type: detect_project_type(&path),
                name,
                layer: Layer::Custom,
                path,
                available,
                metadata: None,
            });
        }
        entries.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(entries)
    }

    /// Built images with their ledgers attached, most recently started (or
    /// modified) first. Directories whose name carries no hyphen cannot
    /// have come from a promotion and are skipped with a warning.
    pub fn list_images(&self) -> Result<Vec<ResourceDescriptor>, StoreError> {
        let mut entries = Vec::new();
        for (name, path) in subdirs(&self.layout.images_dir())? {
            if !name.contains('-') {
                warn!("skipping invalid image directory '{name}'");
                continue;
            }
            let metadata = MetadataStore::read(&path)?;
            let last_modified = match metadata.as_ref().and_then(|m| m.last_started) {
                Some(started) => started,
                None => mtime(&path)?,
            };
            let available = self.missing_required_files(&path)?.is_empty();
            entries.push(ResourceDescriptor {
                project_type: detect_project_type(&path),
                name,
                layer: Layer::Image,
                path,
                available,
                last_modified,
                metadata,
            });
        }
        entries.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(entries)
    }

    /// Resolve `name` across all three layers, template first.
    pub fn find(&self, name: &str) -> Result<Option<ResourceDescriptor>, StoreError> {
        for list in [
            self.list_templates()?,
            self.list_custom()?,
            self.list_images()?,
        ] {
            if let Some(found) = list.into_iter().find(|r| r.name == name) {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Required files absent from `dir`, in [`REQUIRED_FILES`] order.
    pub fn missing_required_files(&self, dir: &Path) -> Result<Vec<String>, StoreError> {
        let mut missing = Vec::new();
        for file in REQUIRED_FILES {
            if !dir.join(file).exists() {
                missing.push(file.to_owned());
            }
        }
        Ok(missing)
    }
}

fn subdirs(dir: &Path) -> Result<Vec<(String, PathBuf)>, StoreError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            match entry.file_name().into_string() {
                Ok(name) => out.push((name, entry.path())),
                Err(raw) => warn!("skipping non-UTF-8 directory name {raw:?}"),
            }
        }
    }
    Ok(out)
}

fn mtime(path: &Path) -> Result<DateTime<Utc>, StoreError> {
    Ok(DateTime::<Utc>::from(path.metadata()?.modified()?))
}
