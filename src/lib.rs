//! Orphaned sidecar reclamation.
//!
//! Walks a tree of `.sdr` sidecar directories, asks a topology-specific
//! [`ExistenceStrategy`] whether each sidecar's content still exists, and
//! deletes the ones whose content is conclusively gone.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod reclaim;
pub mod registry;
pub mod report;
pub mod strategy;
pub mod utils;
pub mod walker;

pub use classify::{Classifier, EntryKind};
pub use config::SweepConfig;
pub use engine::ReconciliationEngine;
pub use error::{Error, Result};
pub use reclaim::{Reclaim, Reclaimer};
pub use registry::{StorageTopology, TopologyEntry, TopologyRegistry};
pub use report::{CleanupReport, Disposition, SidecarOutcome};
pub use strategy::{
    CoLocatedChecker, ExistenceStrategy, ExistenceVerdict, HashBucketChecker, MirroredChecker,
};
pub use walker::{SidecarDirectory, TreeWalker, WalkItem};
