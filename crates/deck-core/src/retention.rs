use crate::CoreError;
use chrono::{DateTime, Utc};
use deck_store::fsops;
use deck_store::{DeckLayout, Layer, LayerRepository, ResourceDescriptor};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{error, warn};

/// Cleanup plan over the images layer, derived on demand and never
/// persisted. Groups are keyed by prefix and ordered newest first; every
/// group is partitioned exhaustively into keep and remove.
#[derive(Debug, Default, Serialize)]
pub struct RetentionPlan {
    pub groups: BTreeMap<String, Vec<ResourceDescriptor>>,
    pub to_keep: Vec<ResourceDescriptor>,
    pub to_remove: Vec<ResourceDescriptor>,
    pub space_to_free_bytes: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum CleaningKind {
    Images,
    Custom,
    Templates,
    All,
    Selective,
}

impl std::fmt::Display for CleaningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleaningKind::Images => write!(f, "images"),
            CleaningKind::Custom => write!(f, "custom"),
            CleaningKind::Templates => write!(f, "templates"),
            CleaningKind::All => write!(f, "all"),
            CleaningKind::Selective => write!(f, "selective"),
        }
    }
}

/// Transient cleanup request.
#[derive(Debug, Clone)]
pub struct CleaningOperation {
    pub kind: CleaningKind,
    pub items: Vec<String>,
    pub dry_run: bool,
}

/// Non-executing descriptor of what a layer offers for cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleaningStrategy {
    KeepLatestN(usize),
    DeleteSpecific(Vec<String>),
    /// Textual alternatives instead of deletion; the only strategy the
    /// template layer ever offers.
    SmartSuggestion,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum WarningLevel {
    Caution,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleaningWarning {
    pub level: WarningLevel,
    pub message: String,
}

/// Outcome of an executed (or dry-run) cleaning batch. Failure is a flag
/// plus a message trail, never a panic; partial deletions stay deleted.
#[derive(Debug, Default, Serialize)]
pub struct CleaningReport {
    pub success: bool,
    pub dry_run: bool,
    pub messages: Vec<String>,
    pub removed: Vec<String>,
    pub space_freed_bytes: u64,
}

/// Plans and executes cleanup across the custom and image layers.
/// Templates are out of bounds: deletion requests against them are always
/// rejected, whatever the flags say.
pub struct RetentionEngine {
    layout: DeckLayout,
    repo: LayerRepository,
}

impl RetentionEngine {
    pub fn new(layout: DeckLayout) -> Self {
        let repo = LayerRepository::new(layout.clone());
        Self { layout, repo }
    }

    /// Strip a trailing `-YYYYMMDD-HHMM` build stamp, if present.
    pub fn strip_timestamp_suffix(name: &str) -> Option<&str> {
        // 14 bytes: hyphen, 8 digits, hyphen, 4 digits.
        if name.len() < 15 || !name.is_char_boundary(name.len() - 14) {
            return None;
        }
        let (prefix, suffix) = name.split_at(name.len() - 14);
        let bytes = suffix.as_bytes();
        let shape_ok = bytes[0] == b'-'
            && bytes[1..9].iter().all(u8::is_ascii_digit)
            && bytes[9] == b'-'
            && bytes[10..14].iter().all(u8::is_ascii_digit);
        if shape_ok {
            Some(prefix)
        } else {
            None
        }
    }

    /// Group image descriptors by stamped prefix; images without a stamp
    /// form singleton groups keyed by their full name. Each group is sorted
    /// newest first by ledger `created_at`, falling back to the
    /// descriptor's filesystem timestamp. Stable and idempotent.
    pub fn group_by_prefix(
        images: &[ResourceDescriptor],
    ) -> BTreeMap<String, Vec<ResourceDescriptor>> {
        let mut groups: BTreeMap<String, Vec<ResourceDescriptor>> = BTreeMap::new();
        for image in images {
            let key = Self::strip_timestamp_suffix(&image.name)
                .unwrap_or(&image.name)
                .to_owned();
            groups.entry(key).or_default().push(image.clone());
        }
        for group in groups.values_mut() {
            group.sort_by(|a, b| {
                effective_created(b)
                    .cmp(&effective_created(a))
                    .then_with(|| a.name.cmp(&b.name))
            });
        }
        groups
    }

    /// Partition a newest-first group into the `min(n, len)` entries to
    /// keep and the remainder to remove.
    pub fn keep_latest_n(
        group: &[ResourceDescriptor],
        n: usize,
    ) -> (Vec<ResourceDescriptor>, Vec<ResourceDescriptor>) {
        let cut = n.min(group.len());
        (group[..cut].to_vec(), group[cut..].to_vec())
    }

    /// Full keep-latest-N plan over the images layer.
    pub fn plan_keep_latest(&self, n: usize) -> Result<RetentionPlan, CoreError> {
        let images = self.repo.list_images()?;
        let groups = Self::group_by_prefix(&images);

        let mut plan = RetentionPlan {
            groups: groups.clone(),
            ..RetentionPlan::default()
        };
        for group in groups.values() {
            let (keep, remove) = Self::keep_latest_n(group, n);
            for r in &remove {
                plan.space_to_free_bytes += entry_size(&r.path);
            }
            plan.to_keep.extend(keep);
            plan.to_remove.extend(remove);
        }
        Ok(plan)
    }

    /// Cleaning strategies a layer offers. Templates only ever get
    /// suggestions.
    pub fn strategies_for(layer: Layer) -> Vec<CleaningStrategy> {
        match layer {
            Layer::Template => vec![CleaningStrategy::SmartSuggestion],
            Layer::Custom | Layer::Image => vec![
                CleaningStrategy::KeepLatestN(3),
                CleaningStrategy::DeleteSpecific(Vec::new()),
                CleaningStrategy::SmartSuggestion,
            ],
        }
    }

    /// Non-destructive alternatives offered in place of template deletion.
    pub fn template_suggestions() -> Vec<String> {
        vec![
            "deck templates update — refresh templates from the remote source".to_owned(),
            "deck templates sync — re-download the template set".to_owned(),
            "deck templates reset — restore templates to their pristine state".to_owned(),
        ]
    }

    /// All-or-nothing request validation: a single unresolvable item
    /// rejects the whole operation; an empty item list is only legal for
    /// `All`.
    pub fn validate(&self, op: &CleaningOperation) -> Result<(), CoreError> {
        if op.items.is_empty() && op.kind != CleaningKind::All {
            return Err(CoreError::ValidationFailure(format!(
                "cleaning type '{}' requires at least one item",
                op.kind
            )));
        }
        let mut unknown = Vec::new();
        for item in &op.items {
            if self.repo.find(item)?.is_none() {
                unknown.push(item.clone());
            }
        }
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(CoreError::ValidationFailure(format!(
                "unknown resources: {}",
                unknown.join(", ")
            )))
        }
    }

    /// Warnings the caller should surface before executing `op`.
    pub fn warnings_for(op: &CleaningOperation) -> Vec<CleaningWarning> {
        let mut warnings = Vec::new();
        match op.kind {
            CleaningKind::Images => warnings.push(CleaningWarning {
                level: WarningLevel::Caution,
                message: "removed images may still have running containers attached".to_owned(),
            }),
            CleaningKind::Custom => warnings.push(CleaningWarning {
                level: WarningLevel::Warning,
                message: "deleting custom configurations discards your personal edits".to_owned(),
            }),
            CleaningKind::Templates => warnings.push(CleaningWarning {
                level: WarningLevel::Error,
                message: "template deletion is discouraged and will be rejected".to_owned(),
            }),
            CleaningKind::All => warnings.push(CleaningWarning {
                level: WarningLevel::Critical,
                message: "this removes every image and every custom configuration".to_owned(),
            }),
            CleaningKind::Selective => {
                warnings.push(CleaningWarning {
                    level: WarningLevel::Caution,
                    message: "removed images may still have running containers attached"
                        .to_owned(),
                });
                warnings.push(CleaningWarning {
                    level: WarningLevel::Warning,
                    message: "deleting custom configurations discards your personal edits"
                        .to_owned(),
                });
            }
        }
        warnings
    }

    /// Execute (or dry-run) a cleaning request. Failures come back as a
    /// failed report with a message trail, not an `Err`; a non-dry-run
    /// I/O failure aborts the rest of the batch and nothing is rolled
    /// back.
    pub fn execute(&self, op: &CleaningOperation) -> CleaningReport {
        let mut report = CleaningReport {
            success: true,
            dry_run: op.dry_run,
            ..CleaningReport::default()
        };

        if op.kind == CleaningKind::Templates {
            error!("rejected cleaning request against the template layer");
            report.success = false;
            report
                .messages
                .push("template deletion is never performed".to_owned());
            report
                .messages
                .extend(Self::template_suggestions());
            return report;
        }

        if let Err(e) = self.validate(op) {
            report.success = false;
            report.messages.push(e.to_string());
            return report;
        }

        match op.kind {
            CleaningKind::Images => {
                self.delete_batch(Layer::Image, &op.items, op.dry_run, &mut report);
            }
            CleaningKind::Custom => {
                self.delete_batch(Layer::Custom, &op.items, op.dry_run, &mut report);
            }
            CleaningKind::All => {
                // Images first, then custom; the second half only runs if
                // the first succeeded.
                match self.layer_names(Layer::Image) {
                    Ok(images) => {
                        self.delete_batch(Layer::Image, &images, op.dry_run, &mut report);
                    }
                    Err(e) => {
                        report.success = false;
                        report.messages.push(e.to_string());
                    }
                }
                if report.success {
                    match self.layer_names(Layer::Custom) {
                        Ok(customs) => {
                            self.delete_batch(Layer::Custom, &customs, op.dry_run, &mut report);
                        }
                        Err(e) => {
                            report.success = false;
                            report.messages.push(e.to_string());
                        }
                    }
                }
            }
            CleaningKind::Selective => self.execute_selective(op, &mut report),
            CleaningKind::Templates => unreachable!("rejected above"),
        }

        report
    }

    /// Dispatch each item to its own layer's handler. Template items are
    /// rejected individually; the rest of the batch still runs.
    fn execute_selective(&self, op: &CleaningOperation, report: &mut CleaningReport) {
        for item in &op.items {
            let layer = match self.repo.find(item) {
                Ok(Some(found)) => found.layer,
                Ok(None) => {
                    // Validation has passed, so this is a race with an
                    // external deletion.
                    report.success = false;
                    report
                        .messages
                        .push(format!("'{item}' vanished before cleaning"));
                    continue;
                }
                Err(e) => {
                    report.success = false;
                    report.messages.push(e.to_string());
                    return;
                }
            };
            match layer {
                Layer::Template => {
                    error!("rejected selective deletion of template '{item}'");
                    report.success = false;
                    report
                        .messages
                        .push(format!("'{item}' is a template; deletion is never performed"));
                }
                Layer::Custom | Layer::Image => {
                    let aborted =
                        !self.delete_batch(layer, &[item.clone()], op.dry_run, report);
                    if aborted {
                        return;
                    }
                }
            }
        }
    }

    fn layer_names(&self, layer: Layer) -> Result<Vec<String>, CoreError> {
        let list = match layer {
            Layer::Image => self.repo.list_images()?,
            Layer::Custom => self.repo.list_custom()?,
            Layer::Template => self.repo.list_templates()?,
        };
        Ok(list.into_iter().map(|r| r.name).collect())
    }

    /// Delete (or record) each named directory in `layer`. Returns `false`
    /// when a non-dry-run failure aborted the remaining batch.
    fn delete_batch(
        &self,
        layer: Layer,
        items: &[impl AsRef<str>],
        dry_run: bool,
        report: &mut CleaningReport,
    ) -> bool {
        for item in items {
            let name = item.as_ref();
            let path = match layer {
                Layer::Image => self.layout.image_path(name),
                Layer::Custom => self.layout.custom_path(name),
                Layer::Template => unreachable!("template batches are rejected earlier"),
            };
            if !path.is_dir() {
                report.success = false;
                report
                    .messages
                    .push(format!("{layer} '{name}' vanished before cleaning"));
                continue;
            }
            let size = entry_size(&path);
            if dry_run {
                report
                    .messages
                    .push(format!("would remove {layer} '{name}' ({size} bytes)"));
                report.removed.push(name.to_owned());
                report.space_freed_bytes += size;
            } else if let Err(e) = fs::remove_dir_all(&path) {
                report.success = false;
                report
                    .messages
                    .push(format!("failed to remove {layer} '{name}': {e}"));
                report
                    .messages
                    .push("aborting remaining batch; completed removals stay removed".to_owned());
                return false;
            } else {
                report.messages.push(format!("removed {layer} '{name}'"));
                report.removed.push(name.to_owned());
                report.space_freed_bytes += size;
            }
        }
        true
    }
}

fn effective_created(r: &ResourceDescriptor) -> DateTime<Utc> {
    r.metadata
        .as_ref()
        .map_or(r.last_modified, |m| m.created_at)
}

fn entry_size(path: &Path) -> u64 {
    fsops::dir_size(path).unwrap_or_else(|e| {
        warn!("size scan of {} failed: {e}", path.display());
        0
    })
}
