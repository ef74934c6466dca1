use std::path::{Path, PathBuf};

use super::{regular_file_verdict, ExistenceStrategy, ExistenceVerdict};
use crate::metadata;
use crate::walker::SidecarDirectory;

/// Sidecars named after a content hash (`<root>/ab/ab12...ef.sdr`). The only
/// link back to the content is a path recorded in the sidecar's metadata.
///
/// If the content was moved and the record never updated, the sidecar looks
/// orphaned. There is no way to tell from here.
pub struct HashBucketChecker {
    metadata_file: String,
    path_field: String,
}

impl HashBucketChecker {
    pub fn new(metadata_file: impl Into<String>, path_field: impl Into<String>) -> Self {
        Self {
            metadata_file: metadata_file.into(),
            path_field: path_field.into(),
        }
    }
}

impl ExistenceStrategy for HashBucketChecker {
    fn name(&self) -> &'static str {
        "hash-bucketed"
    }

    fn exists(&self, sidecar: &SidecarDirectory, _root: &Path) -> ExistenceVerdict {
        let recorded =
            match metadata::read_field(&sidecar.path, &self.metadata_file, &self.path_field) {
                Ok(value) => PathBuf::from(value),
                Err(e) => return ExistenceVerdict::Indeterminate(e.to_string()),
            };

        if recorded.as_os_str().is_empty() || recorded.is_relative() {
            return ExistenceVerdict::Indeterminate(format!(
                "recorded path '{}' is not absolute",
                recorded.display()
            ));
        }

        regular_file_verdict(&recorded)
    }
}
