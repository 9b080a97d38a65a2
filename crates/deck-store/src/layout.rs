use crate::fsops;
use crate::StoreError;
use std::path::{Path, PathBuf};

/// Directory layout for the `.deck` configuration tree.
///
/// Three ordered layers live under the root: read-only `templates/`,
/// editable `custom/`, and built `images/`. All paths are derived; nothing
/// is touched until [`initialize`](Self::initialize).
#[derive(Debug, Clone)]
pub struct DeckLayout {
    root: PathBuf,
}

impl DeckLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    #[inline]
    pub fn custom_dir(&self) -> PathBuf {
        self.root.join("custom")
    }

    #[inline]
    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    #[inline]
    pub fn template_path(&self, name: &str) -> PathBuf {
        self.templates_dir().join(name)
    }

    #[inline]
    pub fn custom_path(&self, name: &str) -> PathBuf {
        self.custom_dir().join(name)
    }

    #[inline]
    pub fn image_path(&self, name: &str) -> PathBuf {
        self.images_dir().join(name)
    }

    /// Create the three layer directories. Idempotent; a missing tree is
    /// recreated rather than reported.
    pub fn initialize(&self) -> Result<(), StoreError> {
        fsops::create_dir_retry(&self.templates_dir())?;
        fsops::create_dir_retry(&self.custom_dir())?;
        fsops::create_dir_retry(&self.images_dir())?;
        Ok(())
    }
}
