//! Artifact persistence.

pub mod local;

pub use local::{extension_for, LocalArtifactStore, VIDEOS_ROUTE};
