use std::path::{Path, PathBuf};

use super::{regular_file_verdict, ExistenceStrategy, ExistenceVerdict};
use crate::walker::SidecarDirectory;

/// A central sidecar tree mirroring the content tree:
/// `<sidecar root>/fiction/book.pdf.sdr` belongs to `<content root>/fiction/book.pdf`.
pub struct MirroredChecker {
    content_root: PathBuf,
}

impl MirroredChecker {
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
        }
    }

    /// Where the content for `sidecar` should live, if it can be derived.
    pub fn content_path(&self, sidecar: &SidecarDirectory, root: &Path) -> Option<PathBuf> {
        let relative = sidecar.path.strip_prefix(root).ok()?;
        let parent = relative.parent().unwrap_or(Path::new(""));
        if sidecar.base_name.is_empty() {
            return None;
        }
        Some(self.content_root.join(parent).join(&sidecar.base_name))
    }
}

impl ExistenceStrategy for MirroredChecker {
    fn name(&self) -> &'static str {
        "mirrored"
    }

    fn exists(&self, sidecar: &SidecarDirectory, root: &Path) -> ExistenceVerdict {
        match self.content_path(sidecar, root) {
            Some(content) => regular_file_verdict(&content),
            None => ExistenceVerdict::Indeterminate(format!(
                "{} is not under {}",
                sidecar.path.display(),
                root.display()
            )),
        }
    }
}
