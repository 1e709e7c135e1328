// jstage-core/src/check.rs
use std::path::Path;

use jstage_common::model::{ArtifactSet, SentinelTable};
use tracing::debug;

/// Artifact classes whose sentinel file is absent under `root`.
///
/// Only reads the filesystem. A `root` that does not exist simply reports
/// every class as missing.
pub fn missing_artifacts(root: &Path, sentinels: &SentinelTable) -> ArtifactSet {
    let mut missing = ArtifactSet::empty();
    for (class, rel) in sentinels.entries() {
        let sentinel = root.join(rel);
        if sentinel.exists() {
            debug!("{} present ({})", class, sentinel.display());
        } else {
            debug!("{} missing ({})", class, sentinel.display());
            missing |= class;
        }
    }
    missing
}

pub fn present_artifacts(root: &Path, sentinels: &SentinelTable) -> ArtifactSet {
    ArtifactSet::all().difference(missing_artifacts(root, sentinels))
}
