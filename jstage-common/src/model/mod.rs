// jstage-common/src/model/mod.rs
pub mod artifact;
pub mod catalog;

pub use artifact::{ArchiveKind, ArtifactSet, ArtifactSource, SentinelTable, UnpackTarget};
pub use catalog::{Catalog, Layout};
