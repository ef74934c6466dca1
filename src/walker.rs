use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::classify::{Classifier, EntryKind};
use crate::registry::StorageTopology;

/// A sidecar directory found during a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarDirectory {
    pub path: PathBuf,
    /// File name with the sidecar suffix stripped.
    pub base_name: String,
    pub topology: StorageTopology,
}

impl SidecarDirectory {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One step of a walk.
#[derive(Debug)]
pub enum WalkItem {
    /// A plain directory that was (or is about to be) descended into.
    Directory(PathBuf),
    Sidecar(SidecarDirectory),
    /// A subtree that could not be read and was skipped.
    Unreadable { path: PathBuf, reason: String },
}

#[derive(Debug, Clone)]
pub struct TreeWalker {
    classifier: Classifier,
    topology: StorageTopology,
    follow_links: bool,
    excluded: Vec<PathBuf>,
}

impl TreeWalker {
    pub fn new(classifier: Classifier, topology: StorageTopology) -> Self {
        Self {
            classifier,
            topology,
            follow_links: false,
            excluded: Vec::new(),
        }
    }

    /// Subtrees to leave out entirely, e.g. another topology's store nested
    /// inside this root. Paths must be spelled as they appear under the root.
    pub fn exclude<I>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.excluded.extend(paths);
        self
    }

    pub fn follow_links(mut self, yes: bool) -> Self {
        self.follow_links = yes;
        self
    }

    /// Lazily walk `root` depth-first. Sidecars are yielded but never
    /// entered; their contents belong to the sidecar as a unit.
    pub fn walk(&self, root: &Path) -> Walk<'_> {
        let inner = WalkDir::new(root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter();
        Walk {
            inner,
            walker: self,
        }
    }
}

pub struct Walk<'a> {
    inner: walkdir::IntoIter,
    walker: &'a TreeWalker,
}

impl Iterator for Walk<'_> {
    type Item = WalkItem;

    fn next(&mut self) -> Option<WalkItem> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    let reason = match err.loop_ancestor() {
                        Some(ancestor) => format!("symlink loop back to {}", ancestor.display()),
                        None => err.to_string(),
                    };
                    return Some(WalkItem::Unreadable { path, reason });
                }
            };

            // The root is scanned but never treated as a sidecar itself.
            if entry.depth() == 0 {
                return Some(WalkItem::Directory(entry.into_path()));
            }

            if entry.file_type().is_dir()
                && self.walker.excluded.iter().any(|p| p == entry.path())
            {
                self.inner.skip_current_dir();
                tracing::debug!(path = %entry.path().display(), "Skipping excluded subtree");
                continue;
            }

            let classifier = &self.walker.classifier;
            let kind = classifier.classify_typed(entry.file_name(), entry.file_type());

            if entry.path_is_symlink() {
                // Only reachable with follow_links: descend through linked
                // directories, but never reclaim through a link.
                match kind {
                    EntryKind::PlainDirectory => {
                        return Some(WalkItem::Directory(entry.into_path()));
                    }
                    EntryKind::Sidecar => {
                        self.inner.skip_current_dir();
                        tracing::debug!(path = %entry.path().display(), "Skipping symlinked sidecar");
                    }
                    _ => {}
                }
                continue;
            }

            match kind {
                EntryKind::Sidecar => {
                    self.inner.skip_current_dir();
                    let name = entry.file_name().to_string_lossy();
                    let base_name = classifier
                        .base_name(&name)
                        .unwrap_or_default()
                        .to_string();
                    return Some(WalkItem::Sidecar(SidecarDirectory {
                        path: entry.into_path(),
                        base_name,
                        topology: self.walker.topology,
                    }));
                }
                EntryKind::PlainDirectory => {
                    return Some(WalkItem::Directory(entry.into_path()));
                }
                EntryKind::File | EntryKind::Special => continue,
            }
        }
    }
}
