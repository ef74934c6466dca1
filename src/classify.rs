use std::ffi::OsStr;
use std::fs::FileType;
use std::path::Path;

use crate::config::DEFAULT_SUFFIX;

/// What a directory entry is, as far as the sweep is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Sidecar,
    PlainDirectory,
    File,
    /// `.`/`..`, symlinks, device nodes and anything we could not stat.
    Special,
}

/// Recognises sidecar directories by their name suffix.
#[derive(Debug, Clone)]
pub struct Classifier {
    suffix: String,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIX)
    }
}

impl Classifier {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Classify an entry by name and its own (non-followed) file type.
    pub fn classify(&self, name: &OsStr, path: &Path) -> EntryKind {
        if name == OsStr::new(".") || name == OsStr::new("..") {
            return EntryKind::Special;
        }
        match path.symlink_metadata() {
            Ok(meta) => self.classify_typed(name, meta.file_type()),
            Err(_) => EntryKind::Special,
        }
    }

    /// Same as [`classify`](Self::classify) when the file type is already known,
    /// e.g. from a `walkdir` entry.
    pub fn classify_typed(&self, name: &OsStr, file_type: FileType) -> EntryKind {
        if name == OsStr::new(".") || name == OsStr::new("..") {
            return EntryKind::Special;
        }
        if file_type.is_dir() {
            if self.has_suffix(name) {
                EntryKind::Sidecar
            } else {
                EntryKind::PlainDirectory
            }
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Special
        }
    }

    /// Entry name with the suffix removed, or `None` if it does not carry one.
    pub fn base_name<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_suffix(self.suffix.as_str())
            .filter(|base| !base.is_empty())
    }

    fn has_suffix(&self, name: &OsStr) -> bool {
        name.to_str()
            .and_then(|n| self.base_name(n))
            .is_some()
    }
}
