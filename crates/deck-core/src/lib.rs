//! Lifecycle core for Deck configuration layers.
//!
//! This crate ties the storage layer and the container engine seam together
//! into the three engines of the tool: `TransitionEngine` for promoting
//! configurations forward (template → custom → image), `RetentionEngine`
//! for planning and executing cleanup across layers, and
//! `WorkflowOrchestrator` for deciding enter/restart/build from observed
//! container state.

pub mod retention;
pub mod transition;
pub mod workflow;

pub use retention::{
    CleaningKind, CleaningOperation, CleaningReport, CleaningStrategy, CleaningWarning,
    RetentionEngine, RetentionPlan, WarningLevel,
};
pub use transition::TransitionEngine;
pub use workflow::{WorkflowAction, WorkflowOrchestrator, WorkflowReport};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("name '{0}' already exists")]
    Collision(String),
    #[error("incomplete configuration in {dir}: missing {missing:?}")]
    IncompleteConfiguration { dir: String, missing: Vec<String> },
    #[error("validation failed: {0}")]
    ValidationFailure(String),
    #[error("store error: {0}")]
    Store(#[from] deck_store::StoreError),
    #[error("runtime error: {0}")]
    Runtime(#[from] deck_runtime::RuntimeError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Name of the user performing promotions, recorded in image ledgers.
pub(crate) fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_owned())
}
