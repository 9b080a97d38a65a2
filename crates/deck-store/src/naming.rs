use crate::layout::DeckLayout;
use crate::repository::validate_resource_name;
use crate::StoreError;
use chrono::{DateTime, Utc};

/// Upper bound for the zero-padded custom name counter.
const MAX_COUNTER: u32 = 999;
/// Upper bound for timestamp collision retry suffixes.
const MAX_TS_RETRY: u32 = 99;

/// Generates collision-free names for custom and image entries.
///
/// All generators are pure against the filesystem snapshot read at call
/// time; nothing is created or reserved. Racing a concurrent invocation is
/// out of scope — the `.deck` tree is a single-writer resource.
pub struct NameAllocator {
    layout: DeckLayout,
}

impl NameAllocator {
    pub fn new(layout: DeckLayout) -> Self {
        Self { layout }
    }

    /// First `base-NNN` (zero-padded, starting at `base-001`) absent from
    /// the custom layer. Deterministic, no randomness.
    pub fn unique_custom_name(&self, base: &str) -> Result<String, StoreError> {
        validate_resource_name(base)?;
        for counter in 1..=MAX_COUNTER {
            let candidate = format!("{base}-{counter:03}");
            if !self.layout.custom_path(&candidate).exists() {
                return Ok(candidate);
            }
        }
        Err(StoreError::NamesExhausted(base.to_owned()))
    }

    /// `base-YYYYMMDD-HHmm` for the current minute. A same-minute
    /// collision in the images layer gets a `-2`, `-3`, … retry suffix
    /// instead of reusing the existing name.
    pub fn timestamped_name(&self, base: &str) -> Result<String, StoreError> {
        self.timestamped_name_at(base, Utc::now())
    }

    pub fn timestamped_name_at(
        &self,
        base: &str,
        now: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        validate_resource_name(base)?;
        let stamped = format!("{base}-{}", now.format("%Y%m%d-%H%M"));
        if !self.layout.image_path(&stamped).exists() {
            return Ok(stamped);
        }
        for retry in 2..=MAX_TS_RETRY {
            let candidate = format!("{stamped}-{retry}");
            if !self.layout.image_path(&candidate).exists() {
                return Ok(candidate);
            }
        }
        Err(StoreError::NamesExhausted(base.to_owned()))
    }

    /// `base-build`, the fixed name used by the direct-build workflow
    /// shortcut. No filesystem check; the transition engine rejects an
    /// existing target itself.
    pub fn image_build_name(base: &str) -> String {
        format!("{base}-build")
    }
}
