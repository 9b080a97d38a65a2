//! Filesystem-backed storage for Deck configuration layers.
//!
//! This crate provides the storage layer of Deck: `DeckLayout` for the
//! `.deck` directory tree, `MetadataStore` for the per-image
//! `.deck-metadata` ledger, `LayerRepository` for enumerating the three
//! configuration layers as resource descriptors, `NameAllocator` for
//! collision-free entry names, and retrying filesystem primitives in
//! `fsops`.

pub mod fsops;
pub mod layout;
pub mod metadata;
pub mod naming;
pub mod repository;

pub use layout::DeckLayout;
pub use metadata::{BuildStatus, ImageMetadata, MetadataStore, METADATA_FILE};
pub use naming::NameAllocator;
pub use repository::{
    validate_resource_name, Layer, LayerRepository, ProjectType, ResourceDescriptor,
    REQUIRED_FILES,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid resource name: {0}")]
    InvalidName(String),
    #[error("no free name available for base '{0}'")]
    NamesExhausted(String),
}
