use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Extensions recognised as content next to a co-located sidecar.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".epub", ".pdf", ".djvu", ".fb2", ".fb2.zip", ".mobi", ".azw", ".azw3", ".cbz", ".cbr",
    ".txt", ".html", ".htm", ".doc", ".docx", ".rtf", ".chm", ".xps", ".md",
];

pub const DEFAULT_SUFFIX: &str = ".sdr";
pub const DEFAULT_METADATA_FILE: &str = "metadata.lua";
pub const DEFAULT_PATH_FIELD: &str = "doc_path";

/// Trimmed, lowercase, dot-prefixed, sorted and deduplicated.
pub fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = extensions
        .into_iter()
        .map(|e| e.as_ref().trim().to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e != ".")
        .map(|e| if e.starts_with('.') { e } else { format!(".{e}") })
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

/// Everything a run needs, resolved once by the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Active topology identifier (see `TopologyRegistry::ids`).
    pub topology: String,
    /// Content library root, scanned for co-located sidecars.
    pub library_root: Option<PathBuf>,
    /// Centralised sidecar tree mirroring `content_root`.
    pub mirror_root: Option<PathBuf>,
    pub content_root: PathBuf,
    /// Root of the hash-bucketed sidecar store.
    pub hash_root: Option<PathBuf>,
    pub suffix: String,
    pub metadata_file: String,
    pub path_field: String,
    pub extensions: Vec<String>,
    pub follow_links: bool,
    pub dry_run: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            topology: "co-located".to_string(),
            library_root: None,
            mirror_root: None,
            content_root: PathBuf::from("/"),
            hash_root: None,
            suffix: DEFAULT_SUFFIX.to_string(),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            path_field: DEFAULT_PATH_FIELD.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            follow_links: false,
            dry_run: false,
        }
    }
}

impl SweepConfig {
    /// Read a TOML config file. Missing keys fall back to the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw).map_err(|e| match e {
            Error::InvalidConfig { message } => Error::ConfigParse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), topology = %config.topology, "Loaded config");
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw).map_err(|e| Error::invalid(e.to_string()))?;
        config.normalize();
        Ok(config)
    }

    /// Lowercase extensions and give each a leading dot.
    pub fn normalize(&mut self) {
        self.extensions = normalize_extensions(&self.extensions);
    }

    pub fn validate(&self) -> Result<()> {
        if self.suffix.is_empty() {
            return Err(Error::invalid("sidecar suffix must not be empty"));
        }
        if self.metadata_file.is_empty() {
            return Err(Error::invalid("metadata_file must not be empty"));
        }
        if self.path_field.is_empty() {
            return Err(Error::invalid("path_field must not be empty"));
        }
        if self.extensions.is_empty() {
            return Err(Error::invalid("at least one content extension is required"));
        }
        Ok(())
    }

    /// `<config dir>/sdrclean/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sdrclean").join("config.toml"))
    }
}
