use std::path::Path;

use super::{ExistenceStrategy, ExistenceVerdict};
use crate::config::normalize_extensions;
use crate::walker::SidecarDirectory;

/// Sidecars sit next to their content: `novel.sdr` or `novel.epub.sdr`
/// beside `novel.epub`.
pub struct CoLocatedChecker {
    /// Lowercase, dot-prefixed, longest first.
    extensions: Vec<String>,
}

impl CoLocatedChecker {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extensions = normalize_extensions(extensions);
        extensions.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        Self { extensions }
    }

    fn has_supported_extension(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        self.extensions
            .iter()
            .any(|ext| lower.len() > ext.len() && lower.ends_with(ext.as_str()))
    }

    /// Whether a sibling named `candidate` is the content for `base`.
    fn matches(&self, base: &str, candidate: &str) -> bool {
        if candidate.len() > base.len()
            && candidate.is_char_boundary(base.len())
            && candidate[..base.len()] == *base
        {
            let rest = candidate[base.len()..].to_ascii_lowercase();
            if self.extensions.iter().any(|ext| *ext == rest) {
                return true;
            }
        }
        candidate == base && self.has_supported_extension(base)
    }
}

impl ExistenceStrategy for CoLocatedChecker {
    fn name(&self) -> &'static str {
        "co-located"
    }

    fn exists(&self, sidecar: &SidecarDirectory, _root: &Path) -> ExistenceVerdict {
        let Some(parent) = sidecar.path.parent() else {
            return ExistenceVerdict::Indeterminate(format!(
                "{} has no parent directory",
                sidecar.path.display()
            ));
        };
        let sidecar_name = sidecar.file_name();

        let siblings = match std::fs::read_dir(parent) {
            Ok(rd) => rd,
            Err(e) => {
                return ExistenceVerdict::Indeterminate(format!(
                    "cannot list {}: {e}",
                    parent.display()
                ))
            }
        };

        for entry in siblings {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    return ExistenceVerdict::Indeterminate(format!(
                        "cannot list {}: {e}",
                        parent.display()
                    ))
                }
            };
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name == sidecar_name || !self.matches(&sidecar.base_name, &name) {
                continue;
            }
            // A same-named directory is not content; follow links to files.
            let is_dir = std::fs::metadata(entry.path())
                .map(|m| m.is_dir())
                .unwrap_or(false);
            if !is_dir {
                return ExistenceVerdict::Exists;
            }
        }

        ExistenceVerdict::Orphaned
    }
}
