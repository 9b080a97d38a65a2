use crate::{current_user, CoreError};
use deck_store::fsops;
use deck_store::{
    validate_resource_name, DeckLayout, ImageMetadata, LayerRepository, MetadataStore,
    NameAllocator,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Executes the two forward promotions of the configuration chain:
/// template → custom and custom → image.
///
/// Promotions are plain deep copies plus a `PROJECT_NAME` rewrite; there is
/// no rollback of a partially copied target. A failed copy leaves the
/// partial directory in place for the user (or the retention engine) to
/// deal with.
pub struct TransitionEngine {
    layout: DeckLayout,
    repo: LayerRepository,
    names: NameAllocator,
}

impl TransitionEngine {
    pub fn new(layout: DeckLayout) -> Self {
        let repo = LayerRepository::new(layout.clone());
        let names = NameAllocator::new(layout.clone());
        Self {
            layout,
            repo,
            names,
        }
    }

    /// Copy a template into the custom layer under `custom_name` (allocated
    /// from the template name when omitted) and rewrite `PROJECT_NAME` in
    /// the copied `.env`. Returns the resolved custom name.
    pub fn promote_template_to_custom(
        &self,
        template: &str,
        custom_name: Option<&str>,
    ) -> Result<String, CoreError> {
        let src = self.layout.template_path(template);
        if !src.is_dir() {
            return Err(CoreError::NotFound(format!("template '{template}'")));
        }

        let name = match custom_name {
            Some(n) => {
                validate_resource_name(n)?;
                n.to_owned()
            }
            None => self.names.unique_custom_name(template)?,
        };

        let dest = self.layout.custom_path(&name);
        if dest.exists() {
            return Err(CoreError::Collision(name));
        }

        fsops::copy_dir_recursive(&src, &dest)?;
        fsops::set_env_var(&dest.join(".env"), "PROJECT_NAME", &name)?;

        info!("promoted template '{template}' to custom '{name}'");
        Ok(name)
    }

    /// Copy a complete custom configuration into the images layer under
    /// `image_name`, rewrite `PROJECT_NAME`, and write a fresh ledger.
    ///
    /// A custom directory missing any required file is rejected before
    /// anything is copied. A copy failure records a `Failed` ledger in
    /// whatever part of the target exists and propagates the error.
    pub fn promote_custom_to_image(
        &self,
        image_name: &str,
        custom_dir: &Path,
    ) -> Result<PathBuf, CoreError> {
        validate_resource_name(image_name)?;
        if !custom_dir.is_dir() {
            return Err(CoreError::NotFound(format!(
                "custom configuration {}",
                custom_dir.display()
            )));
        }

        let missing = self.repo.missing_required_files(custom_dir)?;
        if !missing.is_empty() {
            return Err(CoreError::IncompleteConfiguration {
                dir: custom_dir.display().to_string(),
                missing,
            });
        }

        let dest = self.layout.image_path(image_name);
        if dest.exists() {
            return Err(CoreError::Collision(image_name.to_owned()));
        }

        let mut meta = ImageMetadata::new(image_name, &current_user(), custom_dir);

        if let Err(e) = fsops::copy_dir_recursive(custom_dir, &dest) {
            error!("image copy for '{image_name}' failed mid-way: {e}");
            if dest.is_dir() {
                meta.build_status = deck_store::BuildStatus::Failed;
                let _ = MetadataStore::write(&dest, &meta);
            }
            return Err(e.into());
        }

        fsops::set_env_var(&dest.join(".env"), "PROJECT_NAME", image_name)?;
        MetadataStore::write(&dest, &meta)?;

        info!(
            "promoted custom {} to image '{image_name}'",
            custom_dir.display()
        );
        Ok(dest)
    }

    /// The layout this engine operates on.
    pub fn layout(&self) -> &DeckLayout {
        &self.layout
    }
}
