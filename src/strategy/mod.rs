mod co_located;
mod hash_bucket;
mod mirrored;

pub use co_located::CoLocatedChecker;
pub use hash_bucket::HashBucketChecker;
pub use mirrored::MirroredChecker;

use std::path::Path;

use crate::walker::SidecarDirectory;

/// Outcome of asking whether a sidecar's content is still around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistenceVerdict {
    Exists,
    Orphaned,
    /// Evidence could not be gathered. Never grounds for deletion.
    Indeterminate(String),
}

/// The trait every topology implements.
pub trait ExistenceStrategy {
    /// Human-readable label for logs (e.g. "co-located").
    fn name(&self) -> &'static str;

    /// Decide whether the content behind `sidecar` still exists. `root` is
    /// the directory the walk started from.
    fn exists(&self, sidecar: &SidecarDirectory, root: &Path) -> ExistenceVerdict;
}

/// Regular-file check that keeps "absent" apart from "could not tell".
pub(crate) fn regular_file_verdict(path: &Path) -> ExistenceVerdict {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => ExistenceVerdict::Exists,
        Ok(_) => ExistenceVerdict::Indeterminate(format!(
            "{} exists but is not a regular file",
            path.display()
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ExistenceVerdict::Orphaned,
        Err(e) => ExistenceVerdict::Indeterminate(format!("cannot stat {}: {e}", path.display())),
    }
}
