use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Removal seam used by the engine.
pub trait Reclaim {
    fn is_dry_run(&self) -> bool;

    /// Remove the sidecar at `path`, returning bytes freed.
    fn reclaim_detailed(&self, path: &Path) -> io::Result<u64>;
}

/// Deletes sidecar directories bottom-up.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reclaimer {
    dry_run: bool,
}

impl Reclaimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reclaimer that only measures what would be freed.
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Remove `path` and everything under it. An absent path counts as
    /// success. Failures are logged and reported as `false`.
    pub fn reclaim(&self, path: &Path) -> bool {
        match self.reclaim_detailed(path) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to reclaim sidecar");
                false
            }
        }
    }

    /// Like [`reclaim`](Self::reclaim) but returns bytes freed, or the first
    /// error. Content after the failing entry is left in place.
    pub fn reclaim_detailed(&self, path: &Path) -> io::Result<u64> {
        match path.symlink_metadata() {
            Ok(meta) if !meta.is_dir() => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} is not a directory", path.display()),
                ));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        }

        let mut freed = 0u64;
        for entry in WalkDir::new(path)
            .follow_links(false)
            .contents_first(true)
        {
            let entry = entry.map_err(io::Error::from)?;
            let p = entry.path();
            if entry.file_type().is_dir() {
                if !self.dry_run {
                    remove(p, |p| std::fs::remove_dir(p))?;
                }
            } else {
                freed += entry.metadata().map(|m| m.len()).unwrap_or(0);
                if !self.dry_run {
                    remove(p, |p| std::fs::remove_file(p))?;
                }
            }
        }
        Ok(freed)
    }
}

impl Reclaim for Reclaimer {
    fn is_dry_run(&self) -> bool {
        Reclaimer::is_dry_run(self)
    }

    fn reclaim_detailed(&self, path: &Path) -> io::Result<u64> {
        Reclaimer::reclaim_detailed(self, path)
    }
}

/// Run a removal, treating an already-missing entry as done.
fn remove(path: &Path, op: fn(&Path) -> io::Result<()>) -> io::Result<()> {
    match op(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
