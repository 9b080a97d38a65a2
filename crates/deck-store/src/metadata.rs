use crate::fsops;
use crate::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-image ledger file inside an image directory.
pub const METADATA_FILE: &str = ".deck-metadata";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum BuildStatus {
    #[default]
    Built,
    Running,
    Failed,
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStatus::Built => write!(f, "Built"),
            BuildStatus::Running => write!(f, "Running"),
            BuildStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl std::str::FromStr for BuildStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Built" => Ok(BuildStatus::Built),
            "Running" => Ok(BuildStatus::Running),
            "Failed" => Ok(BuildStatus::Failed),
            _ => Err(()),
        }
    }
}

/// Ledger record written next to every built image.
///
/// Created when a custom configuration is promoted to an image, updated on
/// build completion and on every container start, and removed only when the
/// retention engine deletes the image directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageMetadata {
    pub image_name: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub source_config: PathBuf,
    pub build_status: BuildStatus,
    pub last_started: Option<DateTime<Utc>>,
}

impl ImageMetadata {
    /// Fresh record for a just-promoted image.
    pub fn new(image_name: &str, created_by: &str, source_config: &Path) -> Self {
        Self {
            image_name: image_name.to_owned(),
            created_at: Utc::now(),
            created_by: created_by.to_owned(),
            source_config: source_config.to_path_buf(),
            build_status: BuildStatus::Built,
            last_started: None,
        }
    }
}

/// Reader/writer for the `.deck-metadata` ledger.
///
/// The on-disk format is flat `KEY=VALUE` lines. An earlier iteration of
/// the tool wrote JSON; `read` still accepts that shape and the next
/// `write` migrates the file to the authoritative line format.
pub struct MetadataStore;

impl MetadataStore {
    /// Serialize `meta` to `<image_dir>/.deck-metadata`, overwriting any
    /// existing file.
    pub fn write(image_dir: &Path, meta: &ImageMetadata) -> Result<(), StoreError> {
        let content = format!(
            "IMAGE_NAME={}\nCREATED_AT={}\nCREATED_BY={}\nSOURCE_CONFIG={}\nBUILD_STATUS={}\nLAST_STARTED={}\n",
            meta.image_name,
            meta.created_at.to_rfc3339(),
            meta.created_by,
            meta.source_config.display(),
            meta.build_status,
            meta.last_started.map(|t| t.to_rfc3339()).unwrap_or_default(),
        );
        fsops::write_text_retry(&image_dir.join(METADATA_FILE), &content)?;
        Ok(())
    }

    /// Load the ledger for `image_dir`. `None` when the file is absent.
    ///
    /// Unknown keys are ignored and malformed values leave the field at its
    /// default; a damaged ledger is degraded, never an error.
    pub fn read(image_dir: &Path) -> Result<Option<ImageMetadata>, StoreError> {
        let path = image_dir.join(METADATA_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;

        // Legacy JSON ledger from the earlier metadata iteration.
        if content.trim_start().starts_with('{') {
            match serde_json::from_str::<ImageMetadata>(&content) {
                Ok(meta) => return Ok(Some(meta)),
                Err(e) => {
                    tracing::warn!("unreadable legacy metadata in {}: {e}", path.display());
                    return Ok(None);
                }
            }
        }

        let mut meta = ImageMetadata {
            image_name: String::new(),
            created_at: Utc::now(),
            created_by: String::new(),
            source_config: PathBuf::new(),
            build_status: BuildStatus::default(),
            last_started: None,
        };

        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key {
                "IMAGE_NAME" => meta.image_name = value.to_owned(),
                "CREATED_AT" => {
                    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
                        meta.created_at = t.with_timezone(&Utc);
                    }
                }
                "CREATED_BY" => meta.created_by = value.to_owned(),
                "SOURCE_CONFIG" => meta.source_config = PathBuf::from(value),
                "BUILD_STATUS" => {
                    if let Ok(status) = value.parse() {
                        meta.build_status = status;
                    }
                }
                "LAST_STARTED" => {
                    meta.last_started = DateTime::parse_from_rfc3339(value)
                        .ok()
                        .map(|t| t.with_timezone(&Utc));
                }
                _ => {}
            }
        }

        Ok(Some(meta))
    }

    /// Stamp `last_started` (and optionally `build_status`) on an existing
    /// ledger. A missing ledger is a no-op.
    pub fn touch_started(
        image_dir: &Path,
        status: Option<BuildStatus>,
    ) -> Result<(), StoreError> {
        if let Some(mut meta) = Self::read(image_dir)? {
            meta.last_started = Some(Utc::now());
            if let Some(s) = status {
                meta.build_status = s;
            }
            Self::write(image_dir, &meta)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_meta() -> ImageMetadata {
        ImageMetadata {
            image_name: "web-20240101-0900".to_owned(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            created_by: "alice".to_owned(),
            source_config: PathBuf::from("/home/alice/.deck/custom/web-001"),
            build_status: BuildStatus::Built,
            last_started: None,
        }
    }

    #[test]
    fn roundtrip_preserves_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let meta = sample_meta();
        MetadataStore::write(dir.path(), &meta).unwrap();
        let back = MetadataStore::read(dir.path()).unwrap().unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn roundtrip_with_last_started_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut meta = sample_meta();
        meta.last_started = Some(Utc.with_ymd_and_hms(2024, 2, 3, 12, 30, 0).unwrap());
        meta.build_status = BuildStatus::Running;
        MetadataStore::write(dir.path(), &meta).unwrap();
        let back = MetadataStore::read(dir.path()).unwrap().unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn read_absent_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MetadataStore::read(dir.path()).unwrap().is_none());
    }

    #[test]
    fn empty_last_started_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        MetadataStore::write(dir.path(), &sample_meta()).unwrap();
        let content = fs::read_to_string(dir.path().join(METADATA_FILE)).unwrap();
        assert!(content.contains("LAST_STARTED=\n"));
        let back = MetadataStore::read(dir.path()).unwrap().unwrap();
        assert_eq!(back.last_started, None);
    }

    #[test]
    fn malformed_values_keep_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(METADATA_FILE),
            "IMAGE_NAME=broken\nCREATED_AT=yesterday\nBUILD_STATUS=Exploded\nLAST_STARTED=soon\n",
        )
        .unwrap();
        let meta = MetadataStore::read(dir.path()).unwrap().unwrap();
        assert_eq!(meta.image_name, "broken");
        assert_eq!(meta.build_status, BuildStatus::Built);
        assert_eq!(meta.last_started, None);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(METADATA_FILE),
            "IMAGE_NAME=x\nFUTURE_KEY=whatever\nCREATED_BY=bob\n",
        )
        .unwrap();
        let meta = MetadataStore::read(dir.path()).unwrap().unwrap();
        assert_eq!(meta.image_name, "x");
        assert_eq!(meta.created_by, "bob");
    }

    #[test]
    fn legacy_json_ledger_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let meta = sample_meta();
        let json = serde_json::to_string_pretty(&meta).unwrap();
        fs::write(dir.path().join(METADATA_FILE), json).unwrap();

        let back = MetadataStore::read(dir.path()).unwrap().unwrap();
        assert_eq!(back, meta);

        // Writing migrates to the line format.
        MetadataStore::write(dir.path(), &back).unwrap();
        let content = fs::read_to_string(dir.path().join(METADATA_FILE)).unwrap();
        assert!(content.starts_with("IMAGE_NAME="));
    }

    #[test]
    fn corrupt_legacy_json_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(METADATA_FILE), "{ not json").unwrap();
        assert!(MetadataStore::read(dir.path()).unwrap().is_none());
    }

    #[test]
    fn touch_started_stamps_timestamp_and_status() {
        let dir = tempfile::tempdir().unwrap();
        MetadataStore::write(dir.path(), &sample_meta()).unwrap();
        MetadataStore::touch_started(dir.path(), Some(BuildStatus::Running)).unwrap();
        let meta = MetadataStore::read(dir.path()).unwrap().unwrap();
        assert!(meta.last_started.is_some());
        assert_eq!(meta.build_status, BuildStatus::Running);
    }

    #[test]
    fn touch_started_without_ledger_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        MetadataStore::touch_started(dir.path(), None).unwrap();
        assert!(MetadataStore::read(dir.path()).unwrap().is_none());
    }

    #[test]
    fn key_order_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        MetadataStore::write(dir.path(), &sample_meta()).unwrap();
        let content = fs::read_to_string(dir.path().join(METADATA_FILE)).unwrap();
        let keys: Vec<&str> = content
            .lines()
            .filter_map(|l| l.split('=').next())
            .collect();
        assert_eq!(
            keys,
            [
                "IMAGE_NAME",
                "CREATED_AT",
                "CREATED_BY",
                "SOURCE_CONFIG",
                "BUILD_STATUS",
                "LAST_STARTED"
            ]
        );
    }
}
