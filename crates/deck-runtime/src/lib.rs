//! Container engine adapters for Deck.
//!
//! The core never talks to a container runtime directly; it goes through
//! the `ContainerEngine` trait. The `compose` adapter shells out to
//! `docker compose`, the `mock` adapter keeps container state in memory so
//! the orchestrator can be exercised without a daemon.

pub mod adapter;
pub mod compose;
pub mod mock;

pub use adapter::{select_engine, ContainerEngine, ContainerStatus};
pub use compose::ComposeEngine;
pub use mock::MockEngine;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine '{0}' is not available on this system")]
    EngineUnavailable(String),
    #[error("container '{0}' not found")]
    ContainerNotFound(String),
    #[error("container command failed: {0}")]
    CommandFailed(String),
}
