use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::SweepConfig;
use crate::error::{Error, Result};
use crate::strategy::{CoLocatedChecker, ExistenceStrategy, HashBucketChecker, MirroredChecker};

/// How sidecars relate to the content they describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageTopology {
    /// Sidecar next to the content file.
    CoLocated,
    /// Central tree mirroring the content tree.
    Mirrored,
    /// Central store keyed by content hash.
    HashBucketed,
}

impl StorageTopology {
    pub fn id(self) -> &'static str {
        match self {
            StorageTopology::CoLocated => "co-located",
            StorageTopology::Mirrored => "mirrored",
            StorageTopology::HashBucketed => "hash-bucketed",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            StorageTopology::CoLocated => "Co-located",
            StorageTopology::Mirrored => "Mirrored",
            StorageTopology::HashBucketed => "Hash-bucketed",
        }
    }
}

impl fmt::Display for StorageTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for StorageTopology {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TopologyRegistry::with_defaults()
            .resolve(s)
            .map(|entry| entry.topology)
    }
}

/// Everything needed to run one topology.
pub struct TopologyEntry {
    /// Machine-readable name used in config and `--topology`.
    pub id: &'static str,
    pub aliases: &'static [&'static str],
    pub topology: StorageTopology,
    pub display_name: &'static str,
    pub root: fn(&SweepConfig) -> Option<PathBuf>,
    pub strategy: fn(&SweepConfig) -> Result<Box<dyn ExistenceStrategy>>,
}

impl TopologyEntry {
    fn answers_to(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(id))
    }

    /// The configured root for this topology.
    pub fn resolve_root(&self, config: &SweepConfig) -> Result<PathBuf> {
        (self.root)(config).ok_or(Error::MissingRoot {
            topology: self.id,
        })
    }

    pub fn build_strategy(&self, config: &SweepConfig) -> Result<Box<dyn ExistenceStrategy>> {
        (self.strategy)(config)
    }
}

impl fmt::Debug for TopologyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopologyEntry")
            .field("id", &self.id)
            .field("topology", &self.topology)
            .finish_non_exhaustive()
    }
}

fn co_located_strategy(config: &SweepConfig) -> Result<Box<dyn ExistenceStrategy>> {
    Ok(Box::new(CoLocatedChecker::new(&config.extensions)))
}

fn mirrored_strategy(config: &SweepConfig) -> Result<Box<dyn ExistenceStrategy>> {
    if config.content_root.is_relative() {
        return Err(Error::invalid(format!(
            "content_root {} must be absolute",
            config.content_root.display()
        )));
    }
    Ok(Box::new(MirroredChecker::new(config.content_root.clone())))
}

fn hash_bucket_strategy(config: &SweepConfig) -> Result<Box<dyn ExistenceStrategy>> {
    Ok(Box::new(HashBucketChecker::new(
        config.metadata_file.clone(),
        config.path_field.clone(),
    )))
}

/// Maps topology identifiers to their root resolver and strategy.
#[derive(Debug)]
pub struct TopologyRegistry {
    entries: Vec<TopologyEntry>,
}

impl Default for TopologyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TopologyRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(TopologyEntry {
            id: "co-located",
            aliases: &["doc", "colocated"],
            topology: StorageTopology::CoLocated,
            display_name: StorageTopology::CoLocated.display_name(),
            root: |c| c.library_root.clone(),
            strategy: co_located_strategy,
        });
        registry.register(TopologyEntry {
            id: "mirrored",
            aliases: &["dir"],
            topology: StorageTopology::Mirrored,
            display_name: StorageTopology::Mirrored.display_name(),
            root: |c| c.mirror_root.clone(),
            strategy: mirrored_strategy,
        });
        registry.register(TopologyEntry {
            id: "hash-bucketed",
            aliases: &["hash", "hashed"],
            topology: StorageTopology::HashBucketed,
            display_name: StorageTopology::HashBucketed.display_name(),
            root: |c| c.hash_root.clone(),
            strategy: hash_bucket_strategy,
        });
        registry
    }

    /// Add an entry. An entry with the same id replaces the old one.
    pub fn register(&mut self, entry: TopologyEntry) {
        self.entries.retain(|e| e.id != entry.id);
        self.entries.push(entry);
    }

    pub fn resolve(&self, id: &str) -> Result<&TopologyEntry> {
        let id = id.trim();
        self.entries
            .iter()
            .find(|e| e.answers_to(id))
            .ok_or_else(|| Error::UnknownTopology {
                id: id.to_string(),
                known: self.ids().join(", "),
            })
    }

    pub fn entries(&self) -> impl Iterator<Item = &TopologyEntry> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.id).collect()
    }
}
